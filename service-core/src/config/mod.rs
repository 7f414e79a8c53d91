//! Settings shared by every service in the workspace.
//!
//! Each service flattens this [`Config`] into its own configuration and adds
//! its store and provider sections on top. Values come from an optional
//! `configuration` file and from `APP__`-prefixed environment variables
//! (for example `APP__PORT=3000`), with a `.env` file loaded first when
//! present.

use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Settings common to all services.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// HTTP listen port; 0 lets the OS pick one (used by spawned test apps).
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_when_not_configured() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.port, 8080);
    }
}
