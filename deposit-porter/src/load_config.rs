//! `load_config` module: builds the [`PlatformConfig`] from an optional YAML file plus
//! the environment.
//!
//! The YAML file carries non-secret settings only:
//!
//! ```yaml
//! platform:
//!   base_url: https://api.example.org
//! ```
//!
//! `PLATFORM_API_URL` overrides `platform.base_url` and is required when no file is
//! given. The two credentials are read from `PLATFORM_API_KEY` and
//! `PLATFORM_API_SECRET` only, never from the file.
//!
//! # Errors
//! Failures are `anyhow::Error`s naming the file or variable at fault, surfaced at
//! the CLI boundary.

use anyhow::Result;
use deposit_porter_core::config::PlatformConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const BASE_URL_VAR: &str = "PLATFORM_API_URL";
pub const API_KEY_VAR: &str = "PLATFORM_API_KEY";
pub const API_SECRET_VAR: &str = "PLATFORM_API_SECRET";

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub platform: PlatformSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlatformSection {
    #[serde(default)]
    pub base_url: Option<String>,
}

fn read_file_config(path: &Path) -> Result<CliConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let config_content = match fs::read_to_string(path) {
        Ok(content) => {
            info!(config_path = ?path, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            info!(var = name, "Found in env");
            Ok(value)
        }
        Ok(_) => {
            error!(var = name, "Environment variable is empty");
            Err(anyhow::anyhow!("{name} environment variable is empty"))
        }
        Err(e) => {
            error!(error = ?e, var = name, "Environment variable not set");
            Err(anyhow::anyhow!("{name} environment variable not set: {e}"))
        }
    }
}

/// Loads the platform configuration. See the module docs for precedence.
pub fn load_config(path: Option<&Path>) -> Result<PlatformConfig> {
    let file_config = match path {
        Some(p) => Some(read_file_config(p)?),
        None => None,
    };

    let base_url = match std::env::var(BASE_URL_VAR) {
        Ok(url) if !url.trim().is_empty() => {
            info!(var = BASE_URL_VAR, "Base URL taken from env");
            url
        }
        _ => match file_config.and_then(|c| c.platform.base_url) {
            Some(url) => url,
            None => {
                error!(var = BASE_URL_VAR, "No platform base URL configured");
                anyhow::bail!(
                    "No platform base URL: set {BASE_URL_VAR} or platform.base_url in the config file"
                );
            }
        },
    };

    let api_key = required_env(API_KEY_VAR)?;
    let api_secret = required_env(API_SECRET_VAR)?;

    let config = PlatformConfig::new(base_url, api_key, api_secret);
    config.trace_loaded();
    Ok(config)
}
