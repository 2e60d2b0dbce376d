//! Store configuration.
//!
//! Configuration-driven backend selection.

use crate::store::backend::StoreKind;
use serde::{Deserialize, Serialize};

/// Evaluator store configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend type to use
    pub backend: StoreKind,
    /// PostgreSQL-specific config
    pub postgresql: Option<PostgresConfig>,
}

impl StoreConfig {
    /// Create an in-memory config.
    pub fn memory() -> Self {
        Self {
            backend: StoreKind::Memory,
            postgresql: None,
        }
    }

    /// Create a PostgreSQL config.
    pub fn postgresql(url: &str) -> Self {
        Self {
            backend: StoreKind::PostgreSQL,
            postgresql: Some(PostgresConfig {
                url: url.to_string(),
                ..Default::default()
            }),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::memory()
    }
}

/// PostgreSQL backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Connection URL
    pub url: String,
    /// Counters table name
    pub counters_table: String,
    /// Decisions table name
    pub decisions_table: String,
    /// Max connections
    pub max_connections: u32,
    /// Enable SSL
    pub ssl: bool,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/slogate".to_string(),
            counters_table: "sli_event_buckets".to_string(),
            decisions_table: "deploy_decisions".to_string(),
            max_connections: 10,
            ssl: false,
        }
    }
}
