//! Redwing - drone fleet operations dashboard
//!
//! Serves fleet analytics and site management over HTTP, backed by SQLite.

mod analytics;
mod config;
mod db;
mod notify;
mod sites;
mod web;

use analytics::AnalyticsFeed;
use config::ServerConfig;
use db::Store;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("redwing=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting Redwing on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    // Demo fleet on an empty database
    if cfg.seed_demo {
        db::seed_demo_fleet(&store, &mut rand::thread_rng(), chrono::Utc::now())?;
    }

    // Start analytics feed
    let analytics = Arc::new(AnalyticsFeed::new(store.clone(), cfg.analytics_refresh));
    analytics.refresh().await;
    analytics.start();

    // Start web server
    let server = Server::new(cfg, store, analytics.clone());
    let result = server.start().await;

    analytics.stop().await;
    result
}
