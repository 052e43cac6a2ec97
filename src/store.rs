//! Graph Store Client
//!
//! The importer talks to the database only through [`GraphStore`]: submit a
//! parameterized Cypher statement, optionally read back rows. [`Neo4jStore`]
//! is the `neo4rs` implementation used by the binary.

use crate::config::Neo4jConfig;
use crate::error::StoreError;
use neo4rs::{BoltType, ConfigBuilder, Graph, Query};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info};

/// One result row: column name -> value.
pub type Row = Map<String, Value>;

// ============================================================================
// Statement
// ============================================================================

/// A Cypher statement and its named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub text: String,
    pub params: BTreeMap<String, Value>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    fn into_query(self) -> Query {
        self.params
            .into_iter()
            .fold(Query::new(self.text), |q, (key, value)| {
                q.param(&key, to_bolt(value))
            })
    }
}

fn to_bolt(value: Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(neo4rs::BoltNull),
        Value::Bool(b) => b.into(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.into(),
            None => n.as_f64().unwrap_or_default().into(),
        },
        Value::String(s) => s.into(),
        Value::Array(items) => items.into_iter().map(to_bolt).collect::<Vec<BoltType>>().into(),
        Value::Object(fields) => fields
            .into_iter()
            .map(|(k, v)| (k, to_bolt(v)))
            .collect::<HashMap<String, BoltType>>()
            .into(),
    }
}

// ============================================================================
// Store Trait
// ============================================================================

#[allow(async_fn_in_trait)]
pub trait GraphStore {
    /// Execute a statement whose result is not needed.
    async fn run(&self, statement: Statement) -> Result<(), StoreError>;

    /// Execute a statement and collect every row.
    async fn query(&self, statement: Statement) -> Result<Vec<Row>, StoreError>;
}

/// Node and relationship totals, for the post-import report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphCounts {
    pub nodes: i64,
    pub relationships: i64,
}

/// Runs `RETURN 1 AS test`; any fault is logged and reported as `false`.
pub async fn test_connection<S: GraphStore>(store: &S) -> bool {
    match store.query(Statement::new("RETURN 1 AS test")).await {
        Ok(rows) => rows
            .first()
            .and_then(|row| row.get("test"))
            .and_then(Value::as_i64)
            == Some(1),
        Err(e) => {
            error!("❌ Connection test failed: {}", e);
            false
        }
    }
}

/// Read-only diagnostic; errors go back to the caller.
pub async fn graph_counts<S: GraphStore>(store: &S) -> Result<GraphCounts, StoreError> {
    let nodes = count(store, "MATCH (n) RETURN count(n) AS count").await?;
    let relationships = count(store, "MATCH ()-[r]->() RETURN count(r) AS count").await?;
    Ok(GraphCounts {
        nodes,
        relationships,
    })
}

async fn count<S: GraphStore>(store: &S, cypher: &str) -> Result<i64, StoreError> {
    let rows = store.query(Statement::new(cypher)).await?;
    Ok(rows
        .first()
        .and_then(|row| row.get("count"))
        .and_then(Value::as_i64)
        .unwrap_or(0))
}

// ============================================================================
// Neo4j
// ============================================================================

pub struct Neo4jStore {
    graph: Graph,
    uri: String,
}

impl Neo4jStore {
    /// Build the driver pool and force a real handshake so bad credentials
    /// or an unreachable host fail here rather than on the first write.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self, StoreError> {
        info!("🔄 Connecting to Neo4j at {} as {}", config.uri, config.username);

        let neo4j_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.username.as_str())
            .password(config.password.as_str())
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .build()
            .map_err(StoreError::Config)?;

        let graph = Graph::connect(neo4j_config)
            .await
            .map_err(StoreError::Connect)?;

        graph
            .run(Query::new("RETURN 1".to_string()))
            .await
            .map_err(StoreError::Connect)?;

        info!("✅ Successfully connected to Neo4j");
        Ok(Self {
            graph,
            uri: config.uri.clone(),
        })
    }

    /// Release the connection pool.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Neo4jStore {
    fn drop(&mut self) {
        info!("🔌 Neo4j connection to {} closed", self.uri);
    }
}

impl GraphStore for Neo4jStore {
    async fn run(&self, statement: Statement) -> Result<(), StoreError> {
        debug!("run: {}", statement.text);
        self.graph
            .run(statement.into_query())
            .await
            .map_err(StoreError::Query)
    }

    async fn query(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        debug!("query: {}", statement.text);
        let mut result = self
            .graph
            .execute(statement.into_query())
            .await
            .map_err(StoreError::Query)?;

        let mut rows = Vec::new();
        while let Some(row) = result.next().await.map_err(StoreError::Query)? {
            let row: Row = row
                .to()
                .map_err(|e| StoreError::Decode(format!("{:?}", e)))?;
            rows.push(row);
        }
        Ok(rows)
    }
}
