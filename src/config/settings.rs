//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and persistence.

use crate::error::{Result, SweepError};
use crate::resource::ListingOrder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tabled::Tabled;

const CONFIG_DIR: &str = "storage-sweep";
const CONFIG_FILE: &str = "config.toml";

/// How the tool authenticates against the storage account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// DefaultAzureCredential chain (environment, managed identity, Azure CLI)
    #[default]
    Default,
    /// Service principal; secret read from AZURE_CLIENT_SECRET
    ClientSecret,
    /// Shared account key; key read from AZURE_STORAGE_KEY
    AccessKey,
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "default" | "defaultazurecredential" => Ok(AuthMethod::Default),
            "client_secret" | "clientsecret" => Ok(AuthMethod::ClientSecret),
            "access_key" | "accesskey" | "key" => Ok(AuthMethod::AccessKey),
            _ => Err(format!(
                "Invalid auth method '{s}'. Valid options: default, client_secret, access_key"
            )),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Default => write!(f, "default"),
            AuthMethod::ClientSecret => write!(f, "client_secret"),
            AuthMethod::AccessKey => write!(f, "access_key"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
#[serde(default)]
pub struct Config {
    #[tabled(rename = "Debug")]
    pub debug: bool,
    #[tabled(rename = "Storage Account")]
    pub storage_account: String,
    #[tabled(rename = "Auth Method")]
    pub auth_method: AuthMethod,
    #[tabled(rename = "Tenant ID")]
    pub tenant_id: String,
    #[tabled(rename = "Client ID")]
    pub client_id: String,
    #[tabled(rename = "Listing Order")]
    pub listing_order: ListingOrder,
    #[tabled(rename = "Max Retries")]
    pub max_retries: usize,
    #[tabled(rename = "JSON Output")]
    pub output_json: bool,
    #[tabled(rename = "No Color")]
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            storage_account: String::new(),
            auth_method: AuthMethod::Default,
            tenant_id: String::new(),
            client_id: String::new(),
            listing_order: ListingOrder::ContainersFirst,
            max_retries: 3,
            output_json: false,
            no_color: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_account.is_empty() {
            return Err(SweepError::config(
                "Storage account is required. Set AZURE_STORAGE_ACCOUNT or run 'ssw config set storage_account <name>'",
            ));
        }

        if self.auth_method == AuthMethod::ClientSecret {
            if self.tenant_id.is_empty() {
                return Err(SweepError::config(
                    "Tenant ID is required for client secret authentication",
                ));
            }
            if self.client_id.is_empty() {
                return Err(SweepError::config(
                    "Client ID is required for client secret authentication",
                ));
            }
        }

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| SweepError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| SweepError::config("Unable to determine config directory"))?;
            Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
        }
    }

    pub async fn load() -> Result<Self> {
        load_config().await
    }

    pub async fn save(&self) -> Result<()> {
        save_config(self).await
    }

    /// Set a single value by key, as used by `config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "debug" => self.debug = parse_bool(key, value)?,
            "storage_account" => self.storage_account = value.to_string(),
            "auth_method" => {
                self.auth_method = AuthMethod::from_str(value).map_err(SweepError::config)?
            }
            "tenant_id" => self.tenant_id = value.to_string(),
            "client_id" => self.client_id = value.to_string(),
            "listing_order" => {
                self.listing_order = ListingOrder::from_str(value).map_err(SweepError::config)?
            }
            "max_retries" => {
                self.max_retries = value.parse().map_err(|_| {
                    SweepError::config(format!("Invalid value for max_retries: '{value}'"))
                })?
            }
            "output_json" => self.output_json = parse_bool(key, value)?,
            "no_color" => self.no_color = parse_bool(key, value)?,
            _ => {
                return Err(SweepError::config(format!(
                    "Unknown configuration key: '{key}'. Valid keys: debug, storage_account, auth_method, tenant_id, client_id, listing_order, max_retries, output_json, no_color"
                )))
            }
        }
        Ok(())
    }

    /// Default `EnvFilter` directive, used when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "storage_sweep=debug,ssw=debug"
        } else {
            "storage_sweep=info,ssw=info"
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(SweepError::config(format!(
            "Invalid boolean value for {key}: '{value}'"
        ))),
    }
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (handled by clap)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Default values
pub async fn load_config() -> Result<Config> {
    let config = load_config_no_validation().await?;

    // Validate configuration
    config.validate()?;

    Ok(config)
}

/// Load configuration without validation (for config commands)
pub async fn load_config_no_validation() -> Result<Config> {
    let mut config = Config::default();

    // Load from configuration file if it exists
    let config_path = Config::get_config_path()?;
    if config_path.exists() {
        config = load_from_file(&config_path).await?;
    }

    // Override with environment variables
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    // Try to parse as TOML first, then JSON as fallback
    match toml::from_str::<Config>(&contents) {
        Ok(config) => Ok(config),
        Err(toml_err) => match serde_json::from_str::<Config>(&contents) {
            Ok(config) => Ok(config),
            Err(_) => Err(toml_err.into()),
        },
    }
}

/// Apply environment overrides, reading variables through `lookup`
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    if let Some(value) = lookup("AZURE_STORAGE_ACCOUNT") {
        config.storage_account = value;
    }

    if let Some(value) = lookup("AZURE_TENANT_ID") {
        config.tenant_id = value;
    }

    if let Some(value) = lookup("AZURE_CLIENT_ID") {
        config.client_id = value;
    }

    if let Some(value) = lookup("STORAGE_SWEEP_AUTH") {
        match AuthMethod::from_str(&value) {
            Ok(method) => config.auth_method = method,
            Err(e) => tracing::warn!("Ignoring STORAGE_SWEEP_AUTH: {}", e),
        }
    }

    if let Some(value) = lookup("STORAGE_SWEEP_LISTING_ORDER") {
        match ListingOrder::from_str(&value) {
            Ok(order) => config.listing_order = order,
            Err(e) => tracing::warn!("Ignoring STORAGE_SWEEP_LISTING_ORDER: {}", e),
        }
    }

    if let Some(value) = lookup("STORAGE_SWEEP_MAX_RETRIES") {
        if let Ok(retries) = value.parse::<usize>() {
            config.max_retries = retries;
        }
    }
}

pub async fn save_config(config: &Config) -> Result<()> {
    let config_path = Config::get_config_path()?;
    save_config_to(config, &config_path).await
}

pub async fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    // Create parent directories if they don't exist
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Serialize to TOML format
    let contents =
        toml::to_string_pretty(config).map_err(|e| SweepError::serialization(e.to_string()))?;

    tokio::fs::write(path, contents).await?;

    Ok(())
}

/// Write a default configuration file; returns false if one already exists
pub async fn init_default_config() -> Result<bool> {
    let config_path = Config::get_config_path()?;

    // Don't overwrite existing configuration
    if config_path.exists() {
        return Ok(false);
    }

    save_config_to(&Config::default(), &config_path).await?;

    Ok(true)
}
