// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration management for the WHOOP MCP server

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::env_config;

/// Server configuration. Credentials may be absent at load time; the
/// client reports `WhoopError::Credentials` at the first authentication
/// attempt instead.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Port the MCP server listens on
    #[serde(default = "env_config::mcp_port")]
    pub port: u16,
    /// WHOOP account email
    #[serde(default)]
    pub whoop_email: Option<String>,
    /// WHOOP account password
    #[serde(default)]
    pub whoop_password: Option<String>,
    /// Override for the WHOOP API base URL; production host when unset
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file, falling back to `.env` plus
    /// environment variables when no file exists.
    pub fn load(path: Option<String>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join("whoop-mcp-server/config.toml"))
                .unwrap_or_else(|| "config.toml".into())
                .to_string_lossy()
                .to_string()
        });

        let config: Config = if Path::new(&config_path).exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            dotenv::dotenv().ok();

            Config {
                port: env_config::mcp_port(),
                whoop_email: std::env::var("WHOOP_EMAIL").ok(),
                whoop_password: std::env::var("WHOOP_PASSWORD").ok(),
                base_url: std::env::var("WHOOP_BASE_URL").ok(),
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(base) = &self.base_url {
            url::Url::parse(base).context("Invalid base_url in configuration")?;
        }
        Ok(())
    }
}
