//! Graph store configuration.

use serde::{Deserialize, Serialize};

/// Connection settings for the graph store.
///
/// The graph store is a separate connection from the relational store;
/// nothing written through it takes part in a relational transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// PostgreSQL connection URL of the graph database.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout() -> u64 {
    10
}
