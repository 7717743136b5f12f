//! Salmandyar care platform core library.
//!
//! This module exports the HTTP API, the storage layer, and the domain
//! logic (measurement scheduling, report generation, assessment scoring)
//! shared by every caller.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod error;
pub mod live;
pub mod models;

/// Application configuration
pub mod config {
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Config {
        pub server: ServerConfig,
        pub database: DatabaseConfig,
        pub auth: AuthConfig,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct DatabaseConfig {
        pub url: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct AuthConfig {
        pub jwt_secret: String,
        pub token_ttl_hours: i64,
    }

    /// Load configuration from file
    pub fn load_config() -> Result<Config, config::ConfigError> {
        // Defaults first, then environment-specific file, then
        // SALMANDYAR_* environment variables.
        let env = std::env::var("SALMANDYAR_ENV").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("SALMANDYAR").separator("__"))
            .build()?
            .try_deserialize()
    }
}
