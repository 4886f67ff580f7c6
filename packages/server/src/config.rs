//! Server configuration from environment variables
//!
//! - `TRAININGTREE_HOST`: bind address (default `127.0.0.1`)
//! - `TRAININGTREE_PORT`: listen port (default `8080`)
//! - `TRAININGTREE_STORAGE`: `libsql` (default) or `memory`
//! - `TRAININGTREE_DB_PATH`: database file
//!   (default `~/.securityrat/database/trainingtree.db`)
//! - `TRAININGTREE_MAX_DEPTH`: hydration depth bound (default unbounded)
//! - `CORS_ALLOW_ORIGIN`: single allowed origin (default localhost frontends)

use anyhow::Context;
use axum::http::HeaderValue;
use std::path::PathBuf;
use trainingtree_core::TreeServiceConfig;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

/// Where the tree service keeps its data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local maps, lost on exit
    Memory,
    /// Embedded libsql database file
    Libsql(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    pub max_depth: Option<usize>,
    pub cors_allow_origin: Option<String>,
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("TRAININGTREE_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid TRAININGTREE_PORT: {}", raw))?,
            None => DEFAULT_PORT,
        };

        let max_depth = lookup("TRAININGTREE_MAX_DEPTH")
            .map(|raw| {
                raw.parse::<usize>()
                    .with_context(|| format!("Invalid TRAININGTREE_MAX_DEPTH: {}", raw))
            })
            .transpose()?;

        let storage = match lookup("TRAININGTREE_STORAGE").as_deref() {
            Some("memory") => StorageBackend::Memory,
            Some("libsql") | None => {
                let path = match lookup("TRAININGTREE_DB_PATH") {
                    Some(path) => PathBuf::from(path),
                    None => Self::default_db_path()?,
                };
                StorageBackend::Libsql(path)
            }
            Some(other) => anyhow::bail!(
                "Invalid TRAININGTREE_STORAGE: {} (expected 'libsql' or 'memory')",
                other
            ),
        };

        Ok(Self {
            host: lookup("TRAININGTREE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            storage,
            max_depth,
            cors_allow_origin: lookup("CORS_ALLOW_ORIGIN"),
        })
    }

    /// Default database location: `~/.securityrat/database/trainingtree.db`
    pub fn default_db_path() -> anyhow::Result<PathBuf> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;
        Ok(home_dir
            .join(".securityrat")
            .join("database")
            .join("trainingtree.db"))
    }

    pub fn tree_service_config(&self) -> TreeServiceConfig {
        TreeServiceConfig {
            max_depth: self.max_depth,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host cannot be empty".to_string());
        }

        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        if let StorageBackend::Libsql(path) = &self.storage {
            if path.as_os_str().is_empty() {
                return Err("database path cannot be empty".to_string());
            }
        }

        if let Some(origin) = &self.cors_allow_origin {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| format!("Invalid CORS_ALLOW_ORIGIN: {}", origin))?;
        }

        self.tree_service_config().validate()
    }
}
