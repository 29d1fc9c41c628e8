//! Server configuration
//!
//! Values come from built-in defaults overridden by `CLINIC_*` environment
//! variables, e.g. `CLINIC_LISTEN_ADDR=127.0.0.1:8080`.

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    /// Fallback tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Interval between keep-alive comments on event streams
    pub sse_keep_alive_secs: u64,
    /// Apply pending migrations at startup
    pub run_migrations: bool,
}

impl AppConfig {
    /// Load configuration from defaults and the environment
    pub fn from_env() -> Result<Self> {
        let config = Config::builder()
            .set_default("listen_addr", "0.0.0.0:3000")?
            .set_default("secure_cookies", false)?
            .set_default("log_level", "info")?
            .set_default("sse_keep_alive_secs", 15_i64)?
            .set_default("run_migrations", true)?
            .add_source(Environment::with_prefix("CLINIC").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn sse_keep_alive(&self) -> Duration {
        Duration::from_secs(self.sse_keep_alive_secs.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            secure_cookies: false,
            log_level: "info".to_string(),
            sse_keep_alive_secs: 15,
            run_migrations: true,
        }
    }
}
