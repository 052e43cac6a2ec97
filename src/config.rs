//! Environment configuration
//!
//! Everything is read once at startup. Credentials are not validated here;
//! a missing value surfaces later as a connection fault.

use std::env;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_DATABASE: &str = "neo4j";
const DEFAULT_MAX_CONNECTIONS: usize = 50;
const DEFAULT_BATCH_SIZE: usize = 500;
const DEFAULT_MEETINGS_FILE: &str = "meetings.json";

#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j: Neo4jConfig,
    pub batch: BatchConfig,
    pub meetings_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let neo4j = Neo4jConfig {
            uri: lookup("NEO4J_URI").unwrap_or_default(),
            username: lookup("NEO4J_USERNAME").unwrap_or_default(),
            password: lookup("NEO4J_PASSWORD").unwrap_or_default(),
            database: lookup("NEO4J_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            max_connections: parse_or(&lookup, "NEO4J_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
        };

        // A zero batch size would make `chunks` panic.
        let batch_size = parse_or(&lookup, "IMPORT_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1);

        Config {
            neo4j,
            batch: BatchConfig { batch_size },
            meetings_file: lookup("MEETINGS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEETINGS_FILE)),
        }
    }

    /// The first command-line argument wins over `MEETINGS_FILE`.
    pub fn with_input_override(mut self, arg: Option<String>) -> Self {
        if let Some(path) = arg.filter(|p| !p.trim().is_empty()) {
            self.meetings_file = PathBuf::from(path);
        }
        self
    }
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(value) => value,
            Err(_) => {
                warn!("⚠️  Ignoring invalid {}={:?}, using {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}
