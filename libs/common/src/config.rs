//! Server configuration
//!
//! Values come from the environment through the `config` crate. The listen
//! port is read from the conventional `PORT` variable; every other setting
//! uses the `REDIRECT_` prefix (`REDIRECT_HOST`, `REDIRECT_PUBLIC_ROOT`,
//! `REDIRECT_MAX_UPLOAD_BYTES`).

use crate::error::{ConfigError, ConfigResult};
use ::config::{Config, Environment};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Port used when `PORT` is unset or empty
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration struct
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    /// Directory served over HTTP, holding `uploads/` and `downloads/`
    pub public_root: PathBuf,
    /// Optional cap on request bodies; no limit when unset
    #[serde(default)]
    pub max_upload_bytes: Option<u64>,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let port = match env::var("PORT") {
            Ok(raw) if !raw.trim().is_empty() => Some(parse_port(&raw)?),
            _ => None,
        };

        let settings = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("public_root", "public")?
            .add_source(Environment::with_prefix("REDIRECT").try_parsing(true))
            .set_override_option("port", port.map(i64::from))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Address string suitable for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(raw: &str) -> ConfigResult<u16> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))
}
