//! Gateway configuration.
//!
//! Precedence: env `VERIDATA_CONFIG` path > `config/gateway.toml` > defaults,
//! with a `VERIDATA_` environment overlay on top.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Application identity for logs and health reports.
    pub app_name: String,
    /// HTTP port for the gateway.
    pub port: u16,
    /// Base URL of the upstream price collaborator.
    pub price_api_url: String,
    /// When false, completed reports are logged instead of POSTed to the bound
    /// address (useful for local runs without a reachable chat transport).
    #[serde(default = "default_true")]
    pub deliver_responses: bool,
}

fn default_true() -> bool {
    true
}

impl CoreConfig {
    /// Load config from file and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::var("VERIDATA_CONFIG")
            .unwrap_or_else(|_| "config/gateway.toml".to_string());
        let builder = config::Config::builder()
            .set_default("app_name", "Verifiable Data Gateway")?
            .set_default("port", 8001_i64)?
            .set_default("price_api_url", "https://api.coingecko.com/api/v3")?
            .set_default("deliver_responses", true)?;

        let path = Path::new(&config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("VERIDATA").separator("__"))
            .build()?;

        built.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_config_file() {
        let cfg = CoreConfig::load().expect("load defaults");
        assert_eq!(cfg.port, 8001);
        assert!(cfg.price_api_url.starts_with("https://"));
        assert!(cfg.deliver_responses);
    }
}
