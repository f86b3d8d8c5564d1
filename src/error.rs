//! Error types for finegate
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API.
//! Authorization denials are not errors: they are ordinary `Decision` values.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-related errors
///
/// All of these surface at load time and are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unknown action '{action}'")]
    UnknownAction { action: String },

    #[error("Unknown action namespace '{namespace}'")]
    UnknownNamespace { namespace: String },

    #[error("Malformed action name '{action}': expected 'namespace:verb'")]
    MalformedAction { action: String },

    #[error("Action or bundle '{name}' is registered twice")]
    Duplicate { name: String },

    #[error("Bundle '{bundle}' would introduce a cycle: {path}")]
    CyclicBundle { bundle: String, path: String },

    #[error("Bundle '{bundle}' expands to no actions")]
    EmptyBundle { bundle: String },

    #[error("Unsupported repository pattern '{pattern}': {reason}")]
    InvalidRepoPattern { pattern: String, reason: String },

    #[error("Configuration file {path} has insecure permissions {mode:o} (run: chmod 600 {path})")]
    InsecurePermissions { path: String, mode: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A request that could not be mapped onto known actions.
///
/// Always results in a denial.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct ClassificationError {
    pub reason: String,
}

impl ClassificationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn unknown_endpoint(method: &str, path: &str) -> Self {
        Self::new(format!("no action is defined for {} {}", method, path))
    }

    pub fn unknown_field(kind: &str, name: &str) -> Self {
        Self::new(format!("unrecognized GraphQL {} '{}'", kind, name))
    }

    pub fn unknown_command(args: &[String]) -> Self {
        Self::new(format!("no action is defined for command '{}'", args.join(" ")))
    }

    pub fn repository_mismatch(requested: &str, declared: &str) -> Self {
        Self::new(format!(
            "request addresses repository '{}' but was declared for '{}'",
            requested, declared
        ))
    }
}

/// Upstream API errors (credential status probe)
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized: invalid or expired token")]
    Unauthorized,

    #[error("Invalid response from upstream: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Create an appropriate error from an HTTP status code and response body
    pub fn from_response(status: u16, body: &str) -> Self {
        match status {
            401 => UpstreamError::Unauthorized,
            _ => UpstreamError::Api {
                status,
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for upstream API operations
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;
