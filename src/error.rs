use std::path::PathBuf;
use thiserror::Error;

/// Faults raised by the graph store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid Neo4j configuration: {0}")]
    Config(#[source] neo4rs::Error),

    #[error("failed to connect to Neo4j: {0}")]
    Connect(#[source] neo4rs::Error),

    #[error("query failed: {0}")]
    Query(#[source] neo4rs::Error),

    #[error("failed to decode result row: {0}")]
    Decode(String),
}

/// Faults raised while importing a meetings document.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON or a record missing a required field.
    #[error("invalid meetings document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{step} failed: {source}")]
    Store {
        step: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ImportError {
    pub fn store(step: &'static str) -> impl FnOnce(StoreError) -> ImportError {
        move |source| ImportError::Store { step, source }
    }
}
