//! Configuration module for Redwing.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "redwing.db")
    pub db_path: String,
    /// How often the analytics feed recomputes its snapshots (default: 60s)
    pub analytics_refresh: Duration,
    /// Seed a demo fleet when the database has no drones (default: true)
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "redwing.db".to_string(),
            analytics_refresh: Duration::from_secs(60),
            seed_demo: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REDWING_HTTP_PORT`: HTTP port (default: 8080)
    /// - `REDWING_DB_PATH`: Database file path (default: "redwing.db")
    /// - `REDWING_ANALYTICS_REFRESH_SECS`: analytics refresh interval (default: 60)
    /// - `REDWING_SEED_DEMO`: `false`/`0` disables demo data (default: true)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = lookup("REDWING_HTTP_PORT").and_then(|s| s.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(db_path) = lookup("REDWING_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Some(secs) = lookup("REDWING_ANALYTICS_REFRESH_SECS").and_then(|s| s.parse::<u64>().ok()) {
            // A zero period would make tokio::time::interval panic.
            cfg.analytics_refresh = Duration::from_secs(secs.max(1));
        }

        if let Some(flag) = lookup("REDWING_SEED_DEMO") {
            cfg.seed_demo = !matches!(flag.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off");
        }

        cfg
    }
}
