//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API base URL, the public short-link domain, the request timeout and
//! the token storage backend.
//!
//! Configuration is stored at `~/.config/linkdash/config.json`. Environment
//! variables override the file:
//!
//! - `LINKDASH_API_URL`
//! - `LINKDASH_SHORT_DOMAIN`
//! - `LINKDASH_TOKEN_STORE` (`file`, `keyring` or `memory`)
//! - `LINKDASH_TIMEOUT_SECS`

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::DEFAULT_TIMEOUT_SECS;
use crate::auth::TokenStoreKind;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "linkdash";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "https://dashboardconnectgo.pages.dev";
pub const DEFAULT_SHORT_DOMAIN: &str = "https://connectgo.namecheapkl.workers.dev";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub short_domain: String,
    pub request_timeout_secs: u64,
    pub token_store: TokenStoreKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            short_domain: DEFAULT_SHORT_DOMAIN.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            token_store: TokenStoreKind::default(),
        }
    }
}

impl Config {
    /// Load the config file (or defaults) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from a variable lookup. Invalid values are logged and
    /// ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LINKDASH_API_URL").filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(domain) = lookup("LINKDASH_SHORT_DOMAIN").filter(|v| !v.is_empty()) {
            self.short_domain = domain;
        }
        if let Some(kind) = lookup("LINKDASH_TOKEN_STORE") {
            match kind.parse() {
                Ok(kind) => self.token_store = kind,
                Err(e) => warn!(error = %e, "Ignoring LINKDASH_TOKEN_STORE"),
            }
        }
        if let Some(secs) = lookup("LINKDASH_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(value = %secs, "Ignoring invalid LINKDASH_TIMEOUT_SECS"),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session file and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
