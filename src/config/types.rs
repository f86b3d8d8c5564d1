//! Configuration types for finegate
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::access_control::Effect;
use crate::util::SecretString;
use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,

    /// Upstream API settings (credential status probe)
    pub upstream: UpstreamConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Fallback and scoped credentials
    pub credentials: CredentialsConfig,

    /// Ordered policy rules
    pub rules: Vec<RuleConfig>,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8766,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upstream API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API base URL (e.g., `https://api.github.com`)
    pub api_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl UpstreamConfig {
    /// Build a URL for an API endpoint
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

/// Credential configuration
///
/// `classic_pat` is the fallback used when no fine-grained credential's
/// repository patterns match. Prefer the `GITHUB_TOKEN` env var for it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub classic_pat: Option<SecretString>,

    /// Scoped credentials, tried in order
    pub fine_grained: Vec<FineGrainedConfig>,
}

/// A credential restricted to a set of repositories
#[derive(Debug, Clone, Deserialize)]
pub struct FineGrainedConfig {
    /// Label used in logs and responses; defaults to `fine_grained[<index>]`
    #[serde(default)]
    pub name: Option<String>,

    pub pat: SecretString,

    pub repos: Vec<String>,
}

/// A single policy rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleConfig {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub repos: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
