//! Web server module.

mod handlers;
mod templates;

use crate::analytics::AnalyticsFeed;
use crate::config::ServerConfig;
use crate::db::Store;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<Store>,
    pub analytics: Arc<AnalyticsFeed<Store>>,
}

/// Web server for Redwing.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, store: Arc<Store>, analytics: Arc<AnalyticsFeed<Store>>) -> Self {
        Self {
            state: AppState {
                config,
                store,
                analytics,
            },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            .route("/", get(handlers::handle_index))
            // Pages
            .route("/analytics", get(handlers::handle_analytics))
            .route("/sites", get(handlers::handle_sites).post(handlers::handle_create_site))
            .route("/sites/cancel", post(handlers::handle_cancel_site))
            // API endpoints
            .route("/api/analytics", get(handlers::handle_api_analytics))
            .route(
                "/api/sites",
                get(handlers::handle_api_sites).post(handlers::handle_api_create_site),
            )
            // Static assets
            .route("/assets/{*path}", get(handlers::handle_asset))
            .route("/favicon.ico", get(handlers::handle_favicon))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(64 * 1024)) // 64KB
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
