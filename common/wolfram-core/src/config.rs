//! Configuration loading for the Wolfram|Alpha clients
//!
//! Configuration is loaded from:
//! 1. Environment variables WOLFRAM_APPID, WOLFRAM_SIG_SALT, WOLFRAM_HOST
//! 2. Environment variable WOLFRAM_CONFIG_PATH
//! 3. ~/.wolfram/wolfram.toml
//! 4. Default values
//!
//! The client identifier and signing salt have no built-in values and must
//! come from the file or the environment.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::WolframError;
use crate::params::QueryParams;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider connection and signing settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Default parameters for full queries
    #[serde(default)]
    pub query: QueryDefaults,
}

/// Provider endpoint and credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider host, without scheme
    #[serde(default = "default_host")]
    pub host: String,
    /// Client identifier sent as `appid`
    #[serde(default)]
    pub app_id: String,
    /// Salt prepended to the signature base string
    #[serde(default)]
    pub sig_salt: String,
    /// User-Agent header for outbound requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

/// Provider-side evaluation hints forwarded on full queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryDefaults {
    /// Render hints (comma-separated)
    #[serde(default = "default_format")]
    pub format: String,
    /// Seconds the provider may spend per pod
    #[serde(default = "default_podtimeout")]
    pub podtimeout: u32,
    /// Seconds the provider may spend scanning
    #[serde(default = "default_scantimeout")]
    pub scantimeout: u32,
    /// Let the provider reinterpret input it does not understand
    #[serde(default = "default_true")]
    pub reinterpret: bool,
}

// Default value functions
fn default_host() -> String {
    "api.wolframalpha.com".to_string()
}

fn default_user_agent() -> String {
    "Wolfram Android App".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_format() -> String {
    "plaintext,image".to_string()
}

fn default_podtimeout() -> u32 {
    10
}

fn default_scantimeout() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            app_id: String::new(),
            sig_salt: String::new(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .field("app_id", &self.app_id)
            .field("sig_salt", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            format: default_format(),
            podtimeout: default_podtimeout(),
            scantimeout: default_scantimeout(),
            reinterpret: default_true(),
        }
    }
}

impl QueryDefaults {
    /// The defaults as provider parameters
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .with("format", self.format.as_str())
            .with("output", "json")
            .with("podtimeout", self.podtimeout)
            .with("scantimeout", self.scantimeout)
            .with("reinterpret", self.reinterpret)
    }
}

impl Config {
    /// Load configuration from file or use defaults, then apply env overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_path();

        let mut config = if let Some(path) = config_path {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            } else {
                tracing::info!("Config file not found, using defaults");
                Self::default()
            }
        } else {
            tracing::info!("No config path specified, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply WOLFRAM_* overrides through a lookup function
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(app_id) = lookup("WOLFRAM_APPID") {
            self.provider.app_id = app_id;
        }
        if let Some(salt) = lookup("WOLFRAM_SIG_SALT") {
            self.provider.sig_salt = salt;
        }
        if let Some(host) = lookup("WOLFRAM_HOST") {
            self.provider.host = host;
        }
    }

    /// Ensure the credentials needed to sign requests are present
    pub fn validate(&self) -> Result<(), WolframError> {
        if self.provider.app_id.trim().is_empty() {
            return Err(WolframError::Config(
                "missing client identifier (set WOLFRAM_APPID or provider.app_id)".to_string(),
            ));
        }
        if self.provider.sig_salt.is_empty() {
            return Err(WolframError::Config(
                "missing signing salt (set WOLFRAM_SIG_SALT or provider.sig_salt)".to_string(),
            ));
        }
        if self.provider.host.trim().is_empty() {
            return Err(WolframError::Config("provider host is empty".to_string()));
        }
        Ok(())
    }

    /// Find the configuration file path
    fn find_config_path() -> Option<PathBuf> {
        // 1. Check environment variable
        if let Ok(path) = std::env::var("WOLFRAM_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        // 2. Check ~/.wolfram/wolfram.toml
        if let Ok(home) = std::env::var("HOME") {
            let path = PathBuf::from(home).join(".wolfram").join("wolfram.toml");
            return Some(path);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [provider]
            app_id = "ABC-123"
            sig_salt = "pepper"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.host, "api.wolframalpha.com");
        assert_eq!(config.provider.timeout_seconds, 30);
        assert_eq!(config.query.podtimeout, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(WolframError::Config(_))));
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            "WOLFRAM_APPID" => Some("ENV-ID".to_string()),
            "WOLFRAM_SIG_SALT" => Some("env-salt".to_string()),
            _ => None,
        });

        assert_eq!(config.provider.app_id, "ENV-ID");
        assert_eq!(config.provider.sig_salt, "env-salt");
        assert_eq!(config.provider.host, "api.wolframalpha.com");
    }

    #[test]
    fn test_debug_redacts_salt() {
        let mut config = ProviderConfig::default();
        config.sig_salt = "super-secret".to_string();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn test_defaults_as_params() {
        let params = QueryDefaults::default().to_params();
        assert_eq!(params.get("format"), Some(&ParamValue::from("plaintext,image")));
        assert_eq!(params.get("podtimeout"), Some(&ParamValue::Int(10)));
        assert_eq!(params.get("scantimeout"), Some(&ParamValue::Int(5)));
        assert_eq!(params.get("reinterpret"), Some(&ParamValue::Bool(true)));
    }
}
