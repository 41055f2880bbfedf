//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Accepted token lifetimes: one hour up to one year
const TOKEN_TTL_HOURS_RANGE: std::ops::RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database connection URL (PostgreSQL)
    pub database_url: String,

    /// Symmetric secret used to sign bearer tokens
    pub jwt_secret: String,

    /// Lifetime of issued tokens and sessions, in hours
    pub token_ttl_hours: i64,

    /// Application identity, used in emails and health output
    pub app_name: String,

    /// Front-end base URL (verification links point here)
    pub client_url: String,

    /// Comma-separated list of allowed CORS origins, `*` for any
    pub cors_allowed_origins: String,

    /// Global token bucket: refill rate and burst size
    pub rate_limit_per_second: u32,
    pub rate_limit_burst: u32,

    /// Runtime configuration
    pub request_timeout_secs: u64,
    pub rust_log: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is required"))?,
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", 24),

            app_name: env::var("APP_NAME").unwrap_or_else(|_| "gatehouse".to_string()),
            client_url: env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),

            rate_limit_per_second: parse_or("RATE_LIMIT_PER_SECOND", 1),
            rate_limit_burst: parse_or("RATE_LIMIT_BURST", 4),

            request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 30),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "gatehouse=debug".to_string()),
            port: parse_or("PORT", 3000),
        };

        if config.jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        if !TOKEN_TTL_HOURS_RANGE.contains(&config.token_ttl_hours) {
            anyhow::bail!(
                "TOKEN_TTL_HOURS must be between {} and {}, got {}",
                TOKEN_TTL_HOURS_RANGE.start(),
                TOKEN_TTL_HOURS_RANGE.end(),
                config.token_ttl_hours
            );
        }

        Ok(config)
    }

    /// Token lifetime as a `chrono::Duration`, clamped to the accepted range
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.token_ttl_hours.clamp(
            *TOKEN_TTL_HOURS_RANGE.start(),
            *TOKEN_TTL_HOURS_RANGE.end(),
        ))
    }
}

/// Read an environment variable, falling back to `default` when unset or unparseable.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
