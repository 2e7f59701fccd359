//! Application configuration management.

use std::env;

use anyhow::{Context, Result};

/// Catalog configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL (e.g. `sqlite://cinelog.db`)
    pub database_url: String,

    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from the environment, reading a `.env` file
    /// first if one is present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .context("DATABASE_URL must be set (e.g. sqlite://cinelog.db)")?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}
