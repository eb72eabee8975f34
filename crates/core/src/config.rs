//! TOML-based configuration for the dirgroups provider.
//!
//! Credentials are never stored inline: the config names an environment
//! variable via an `_env` field and the value is resolved at runtime by
//! [`ProviderConfig::resolve_env_vars`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// Largest page the directory API will hand back for group listings.
pub const MAX_PAGE_SIZE: u32 = 200;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level provider configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider-wide settings.
    #[serde(default)]
    pub provider: ProviderSection,

    /// Directory API connection settings.
    pub directory: DirectoryConfig,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Settings shared by every data source in the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSection {
    /// Customer scope whose groups are listed. `my_customer` is the
    /// directory's alias for the account the credentials belong to.
    #[serde(default = "default_customer_id")]
    pub customer_id: String,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_customer_id() -> String {
    "my_customer".into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            customer_id: default_customer_id(),
            log_level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Directory API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// API base URL (default `https://admin.googleapis.com`).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the OAuth2 access token.
    pub access_token_env: String,

    /// Records requested per page, 1 to [`MAX_PAGE_SIZE`].
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Admin the credentials act on behalf of, if delegated. Informational
    /// only; the token must already carry the delegation.
    #[serde(default)]
    pub impersonated_user_email: Option<String>,

    /// Resolved access token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub access_token: Option<String>,
}

fn default_api_url() -> String {
    "https://admin.googleapis.com".into()
}
fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}
fn default_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl ProviderConfig {
    /// Load a [`ProviderConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: ProviderConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve `*_env` fields from environment variables.
    ///
    /// The access token is required, so a missing variable is an error here
    /// rather than a warning.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");

        let field = "directory.access_token_env";
        match resolve_optional_env(&self.directory.access_token_env, field) {
            Some(token) => self.directory.access_token = Some(token),
            None => {
                return Err(ConfigError::EnvVarMissing {
                    var: self.directory.access_token_env.clone(),
                    field: field.into(),
                })
            }
        }

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.customer_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "provider.customer_id".into(),
                detail: "customer id must not be empty".into(),
            });
        }
        if !self.directory.api_url.starts_with("http://")
            && !self.directory.api_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "directory.api_url".into(),
                detail: "API URL must start with http:// or https://".into(),
            });
        }
        if self.directory.access_token_env.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "directory.access_token_env".into(),
                detail: "access token variable name must not be empty".into(),
            });
        }
        if self.directory.page_size == 0 || self.directory.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "directory.page_size".into(),
                detail: format!("page size must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        if self.directory.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "directory.timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.validate()?;
        config.resolve_env_vars()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
