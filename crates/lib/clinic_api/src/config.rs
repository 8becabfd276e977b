//! API server configuration.

use std::path::PathBuf;

use clinic_core::auth::session::resolve_session_secret;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_STATIC_DIR: &str = "./public";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3000").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Session signing secret.
    pub session_secret: String,
    /// Production mode: `Secure` cookies, seeding disabled.
    pub production: bool,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field(
                "database_url",
                &clinic_core::store::postgres::mask_password(&self.database_url),
            )
            .field("production", &self.production)
            .field("static_dir", &self.static_dir)
            .finish_non_exhaustive()
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            name,
            value: value.to_string(),
        }),
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable            | Default                       |
    /// |---------------------|-------------------------------|
    /// | `BIND_ADDR`         | `127.0.0.1:3000`              |
    /// | `DATABASE_URL`      | required                      |
    /// | `CLINIC_PRODUCTION` | `false`                       |
    /// | `STATIC_DIR`        | `./public`                    |
    /// | `JWT_SECRET` / `SESSION_SECRET` | generated & persisted to file |
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;
        let production = match std::env::var("CLINIC_PRODUCTION") {
            Ok(v) => parse_flag("CLINIC_PRODUCTION", &v)?,
            Err(_) => false,
        };
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into()),
            database_url,
            session_secret: resolve_session_secret(),
            production,
            static_dir: std::env::var("STATIC_DIR")
                .unwrap_or_else(|_| DEFAULT_STATIC_DIR.into())
                .into(),
        })
    }
}
