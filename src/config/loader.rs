//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. `GITHUB_TOKEN` / `GH_TOKEN` for the fallback credential
//! 2. Environment variables (FINEGATE_*)
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::access_control::{PatternMatcher, PolicyEvaluator};
use crate::config::types::AppConfig;
use crate::error::ConfigError;
use crate::taxonomy;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "finegate.toml",
    ".finegate.toml",
    "~/.config/finegate/config.toml",
    "/etc/finegate/config.toml",
];

/// Environment variables consulted for the fallback credential, in order
const TOKEN_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// Load configuration from a TOML string (useful for testing)
///
/// Skips the file permission check and environment layers.
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        check_permissions(Path::new(path))?;
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                debug!(path = %expanded, "Using configuration file");
                check_permissions(Path::new(expanded.as_ref()))?;
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 2. Environment variables with FINEGATE_ prefix
    // e.g., FINEGATE_SERVER__PORT, FINEGATE_UPSTREAM__API_URL
    // Double underscore (__) maps to nested keys (server.port)
    builder = builder.add_source(
        Environment::with_prefix("FINEGATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 3. Conventional token variables for the fallback credential
    for env_var in TOKEN_ENV_VARS {
        if let Ok(token) = std::env::var(env_var)
            && !token.is_empty()
        {
            builder = builder
                .set_override("credentials.classic_pat", token)
                .map_err(|e| ConfigError::Load(e.to_string()))?;
            break;
        }
    }

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Reject config files readable or writable by group or others
#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions {
            path: path.display().to_string(),
            mode,
        });
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

/// Validate configuration values
///
/// Everything that would otherwise fail at request time fails here:
/// unknown actions, unsupported repository globs, missing credentials.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if !config.upstream.api_url.starts_with("http://")
        && !config.upstream.api_url.starts_with("https://")
    {
        return Err(ConfigError::Invalid {
            message: format!(
                "upstream.api_url must start with http:// or https://, got: {}",
                config.upstream.api_url
            ),
        });
    }

    if config.upstream.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "upstream.timeout_secs must be greater than 0".to_string(),
        });
    }

    match &config.credentials.classic_pat {
        Some(pat) if !pat.expose_secret().is_empty() => {}
        _ => {
            return Err(ConfigError::Missing {
                field: "credentials.classic_pat (or set GITHUB_TOKEN)".to_string(),
            });
        }
    }

    for (i, fg) in config.credentials.fine_grained.iter().enumerate() {
        if fg.pat.expose_secret().is_empty() {
            return Err(ConfigError::Missing {
                field: format!("credentials.fine_grained[{}].pat", i),
            });
        }
        if fg.repos.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("credentials.fine_grained[{}].repos must not be empty", i),
            });
        }
        PatternMatcher::new(&fg.repos)?;
    }

    if config.rules.is_empty() {
        return Err(ConfigError::Invalid {
            message: "rules must be a non-empty list".to_string(),
        });
    }

    for (i, rule) in config.rules.iter().enumerate() {
        if rule.actions.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("rules[{}].actions must not be empty", i),
            });
        }
        if rule.repos.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("rules[{}].repos must not be empty", i),
            });
        }
    }

    let taxonomy = taxonomy::github()?;
    PolicyEvaluator::new(&config.rules, &taxonomy)?;

    Ok(())
}
