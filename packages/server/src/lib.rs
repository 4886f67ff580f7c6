//! HTTP server for SecurityRAT training trees
//!
//! Exposes `TreeService` through the REST routes the SecurityRAT frontend
//! calls. Route handlers live in `node_endpoints`; this module wires state,
//! CORS and request tracing.
//!
//! # Usage
//!
//! ```bash
//! # Default settings (port 8080, ~/.securityrat/database/trainingtree.db)
//! cargo run --bin trainingtree-server
//!
//! # In-memory storage on another port
//! TRAININGTREE_STORAGE=memory TRAININGTREE_PORT=9001 cargo run --bin trainingtree-server
//! ```

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use trainingtree_core::db::DatabaseService;
use trainingtree_core::{TreeService, TreeStores};

pub mod config;
mod headers;
mod http_error;
mod node_endpoints;

pub use config::{ServerConfig, StorageBackend};
pub use headers::{ALERT_HEADER, FAILURE_HEADER, PARAMS_HEADER};
pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TreeService>,
}

/// Create the application router with CORS and request tracing
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(node_endpoints::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// CORS layer for the SecurityRAT frontend
///
/// Uses `origin` when given, otherwise the usual local frontend ports. The
/// alert headers are exposed so the browser client can read them.
pub fn cors_layer(origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let default_origins = [
        "http://localhost:8080", // SecurityRAT default
        "http://localhost:9000", // frontend dev server
    ];

    let origins: Vec<HeaderValue> = match origin {
        Some(origin) => vec![origin
            .parse::<HeaderValue>()
            .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", origin))?],
        None => default_origins
            .iter()
            .map(|o| HeaderValue::from_static(*o))
            .collect(),
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static(ALERT_HEADER),
            HeaderName::from_static(PARAMS_HEADER),
            HeaderName::from_static(FAILURE_HEADER),
            header::LOCATION,
        ])
        .allow_credentials(false))
}

/// Build the tree service for the configured storage backend
pub async fn build_service(config: &ServerConfig) -> anyhow::Result<TreeService> {
    let stores = match &config.storage {
        StorageBackend::Memory => {
            tracing::info!("Storage: in-memory");
            TreeStores::in_memory()
        }
        StorageBackend::Libsql(path) => {
            let db = DatabaseService::new(path.clone()).await?;
            tracing::info!("Storage: {}", db.db_path().display());
            TreeStores::turso(Arc::new(db))
        }
    };

    Ok(TreeService::new(stores, config.tree_service_config())?)
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns error if the configuration is invalid, storage cannot be opened,
/// or the server fails to bind.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let service = build_service(&config).await?;
    match service.config().max_depth {
        Some(depth) => tracing::info!("Hydration depth bound: {}", depth),
        None => tracing::info!("Hydration depth: unbounded"),
    }
    let state = AppState {
        service: Arc::new(service),
    };
    let app = create_router(state, cors_layer(config.cors_allow_origin.as_deref())?);

    let addr = config.bind_addr();
    tracing::info!("Training tree server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
