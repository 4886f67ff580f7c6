//! Training Tree HTTP Server Binary
//!
//! # Environment Variables
//!
//! - `TRAININGTREE_HOST`, `TRAININGTREE_PORT`: bind address (default 127.0.0.1:8080)
//! - `TRAININGTREE_STORAGE`: `libsql` (default) or `memory`
//! - `TRAININGTREE_DB_PATH`: database file for `libsql`
//! - `TRAININGTREE_MAX_DEPTH`: hydration depth bound
//! - `CORS_ALLOW_ORIGIN`: allowed browser origin
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use trainingtree_server::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!("Training tree server, port {}", config.port);

    start_server(config).await
}
