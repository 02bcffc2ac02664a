//! Configuration management for cxmgmt

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Environment variable overriding `base_url`
pub const ENV_BASE_URL: &str = "CXMGMT_BASE_URL";
/// Environment variable overriding `username`
pub const ENV_USERNAME: &str = "CXMGMT_USERNAME";
/// Environment variable overriding `password`
pub const ENV_PASSWORD: &str = "CXMGMT_PASSWORD";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server URL, e.g. `https://sast.example.com`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Access Control username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Access Control password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// OAuth client settings
    #[serde(default)]
    pub oauth: OAuthSettings,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// OAuth client used for the password grant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_client_secret")]
    pub client_secret: String,

    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_client_id() -> String {
    "resource_owner_client".to_string()
}

fn default_client_secret() -> String {
    "014DF517-39D1-4453-B7B3-9930C563627C".to_string()
}

fn default_scope() -> String {
    "access_control_api sast_api".to_string()
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            client_secret: default_client_secret(),
            scope: default_scope(),
        }
    }
}

/// Validated connection settings for the Access Control client
#[derive(Debug, Clone)]
pub struct Credentials {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub oauth: OAuthSettings,
    pub timeout_secs: u64,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".cxmgmt").join("config.yaml"))
    }

    /// Resolve an optional override path to the path actually used
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an override path or the default location.
    ///
    /// A missing default file is not an error: every setting can come from
    /// the environment. A missing explicit file is.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let resolved = Self::resolve_path(path)?;
        let mut config = if resolved.exists() {
            Self::load_from(resolved)?
        } else if path.is_some() {
            return Err(ConfigError::NotFound(resolved).into());
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path).into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_BASE_URL) {
            self.base_url = Some(v);
        }
        if let Some(v) = lookup(ENV_USERNAME) {
            self.username = Some(v);
        }
        if let Some(v) = lookup(ENV_PASSWORD) {
            self.password = Some(v);
        }
    }

    /// Validate that connection settings are present
    pub fn credentials(&self) -> Result<Credentials> {
        let base_url = self
            .base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;
        let (username, password) = match (&self.username, &self.password) {
            (Some(u), Some(p)) => (u.clone(), p.clone()),
            _ => return Err(ConfigError::MissingCredentials.into()),
        };
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https:// (got {})",
                base_url
            ))
            .into());
        }

        Ok(Credentials {
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
            oauth: self.oauth.clone(),
            timeout_secs: self.timeout_secs,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            username: None,
            password: None,
            oauth: OAuthSettings::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
