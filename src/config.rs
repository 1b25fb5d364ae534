// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Seconds between two timer ticks of an active session.
pub const TICK_INTERVAL_SECS: u64 = 1;

/// Remaining time below which the session view flags the timer as low.
pub const LOW_TIME_WARNING_SECS: u64 = 600;

/// How often the sweeper looks for expired submitted sessions.
pub const PRUNE_INTERVAL_SECS: u64 = 60;

/// Number of leading characters of a test id shown as its code.
pub const TEST_CODE_LEN: usize = 7;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Shared HS256 secret of the hosted identity service.
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    /// How long a submitted session stays readable before it is pruned.
    pub session_retention_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| format!("PORT is not a valid port: {}", e))?,
            Err(_) => 3000,
        };

        let session_retention_secs = match env::var("SESSION_RETENTION_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|e| format!("SESSION_RETENTION_SECS is not a number: {}", e))?,
            Err(_) => 3600,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            port,
            session_retention_secs,
        })
    }
}
