//! Connection configuration
//!
//! `ConnectionConfig` carries the connection string and logical database
//! name; `PoolConfig` carries the driver pool settings applied by
//! [`MongoDriver`](crate::mongo::MongoDriver).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the connection string
pub const URI_ENV: &str = "DOCWRIGHT_MONGODB_URI";

/// Environment variable holding the database name
pub const DATABASE_ENV: &str = "DOCWRIGHT_DATABASE";

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE: &str = "test";

/// Connection pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Minimum number of connections in the pool
    pub min_pool_size: Option<u32>,
    /// Maximum number of connections in the pool
    pub max_pool_size: Option<u32>,
    /// Maximum time a connection can remain idle before being closed (default: none)
    pub max_idle_time: Option<Duration>,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout (default: 30s)
    pub server_selection_timeout: Option<Duration>,
    /// Application name for server logs
    pub app_name: Option<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_pool_size: Some(0),
            max_pool_size: Some(10),
            max_idle_time: None,
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            app_name: Some("docwright".to_string()),
        }
    }
}

/// Where and how to connect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// MongoDB connection string
    pub uri: String,
    /// Logical database name.
    ///
    /// When unset, the driver resolves it from the connection string's
    /// default database, then falls back to `"test"`.
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl ConnectionConfig {
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self::from_uri(uri).with_database(database)
    }

    /// Connection string only; the database comes from its path at connect time
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: None,
            pool: PoolConfig::default(),
        }
    }

    /// Read `DOCWRIGHT_MONGODB_URI` and `DOCWRIGHT_DATABASE`
    pub fn from_env() -> Self {
        let uri = std::env::var(URI_ENV).unwrap_or_else(|_| DEFAULT_URI.to_string());
        let mut config = Self::from_uri(uri);
        if let Ok(database) = std::env::var(DATABASE_ENV) {
            if !database.is_empty() {
                config.database = Some(database);
            }
        }
        config
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Database to use given the connection string's own default
    pub fn resolve_database(&self, uri_default: Option<&str>) -> String {
        self.database
            .as_deref()
            .or(uri_default)
            .unwrap_or(DEFAULT_DATABASE)
            .to_string()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from_uri(DEFAULT_URI)
    }
}
