use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::github::{AppIdentity, DEFAULT_API_URL};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// GitHub App ID (numeric)
    pub app_id: Option<i64>,
    /// Path to the App's PEM private key
    pub private_key_path: Option<PathBuf>,
    /// Prefix for status summaries and the check run name
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// Details link attached to new check runs
    #[serde(default)]
    pub log_url: String,
    /// Namespace that scopes stored credentials
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// GitHub Enterprise host, when not taken from the inbound request
    pub enterprise_host: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            app_id: None,
            private_key_path: None,
            application_name: default_application_name(),
            log_url: String::new(),
            namespace: default_namespace(),
            enterprise_host: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_application_name() -> String {
    "Pipelines".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

impl GitHubConfig {
    /// Load the App identity from the configured ID and key file.
    pub fn app_identity(&self) -> Result<AppIdentity> {
        let app_id = self
            .app_id
            .context("github.app_id is not configured")?;
        let key_path = self
            .private_key_path
            .as_ref()
            .context("github.private_key_path is not configured")?;

        let private_key = std::fs::read(key_path)
            .with_context(|| format!("Failed to read private key: {}", key_path.display()))?;

        Ok(AppIdentity::new(app_id, private_key))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("ci-status-sync/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }
}
