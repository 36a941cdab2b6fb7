use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub docflow: DocflowConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub expansion: ExpansionConfig,
    #[serde(default)]
    pub http_server: HttpServerConfig,
}

/// Docflow-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DocflowConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DocflowConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Relationship API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Scheme and host of the relationship API, e.g. `https://tenant.example.com`
    pub base_url: String,
    #[serde(default = "default_api_path")]
    pub path: String,
    #[serde(default = "default_username_env")]
    pub username_env: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Expansion engine tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ExpansionConfig {
    #[serde(default = "default_cache_capacity")]
    pub subgraph_cache_capacity: usize,
    /// Type code used when a source id is given without a type
    #[serde(default = "default_source_type")]
    pub default_source_type: String,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            subgraph_cache_capacity: default_cache_capacity(),
            default_source_type: default_source_type(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_path() -> String {
    "/sap/c4c/api/v1/document-flow-service/relations".to_string()
}

fn default_username_env() -> String {
    "DOCFLOW_API_USER".to_string()
}

fn default_password_env() -> String {
    "DOCFLOW_API_PASSWORD".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_capacity() -> usize {
    256
}

fn default_source_type() -> String {
    // Opportunity
    "72".to_string()
}

fn default_http_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in DOCFLOW_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("DOCFLOW_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        Self::parse(&config_str)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("Failed to parse config.toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("api.base_url must be an absolute http(s) URL");
        }

        if !self.api.path.starts_with('/') {
            anyhow::bail!("api.path must start with '/': {}", self.api.path);
        }

        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }

        if self.expansion.subgraph_cache_capacity == 0 {
            anyhow::bail!("expansion.subgraph_cache_capacity must be greater than 0");
        }

        if self.expansion.default_source_type.trim().is_empty() {
            anyhow::bail!("expansion.default_source_type must not be empty");
        }

        Ok(())
    }

    /// Full URL of the relations endpoint, without query parameters
    pub fn relations_url(&self) -> Result<url::Url> {
        let joined = format!("{}{}", self.api.base_url.trim_end_matches('/'), self.api.path);
        url::Url::parse(&joined).with_context(|| format!("Invalid relations URL: {}", joined))
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

/// Engine and server settings for runs that never call the relationship API.
/// Taken from the loaded config when there is one, defaults otherwise.
pub fn local_settings(loaded: Option<&Config>) -> (ExpansionConfig, HttpServerConfig) {
    match loaded {
        Some(config) => (config.expansion.clone(), config.http_server.clone()),
        None => (ExpansionConfig::default(), HttpServerConfig::default()),
    }
}
