//! Client configuration from the environment.
//!
//! Everything here is decided at deployment time and read once at startup.

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Deployment-time switches for optional API wrapper groups.
///
/// A disabled group answers every call with a neutral envelope instead of
/// touching the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub billing: bool,
    pub company: bool,
    pub foia: bool,
    pub workflows: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            billing: true,
            company: true,
            foia: true,
            workflows: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to (no trailing slash).
    pub api_url: String,
    /// SQLite file for the durable session store; `None` uses the OS data dir.
    pub storage_path: Option<PathBuf>,
    pub features: FeatureFlags,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_path: None,
            features: FeatureFlags::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be an http(s) URL, got {value:?}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var} must be a boolean (1/0, true/false, yes/no, on/off), got {value:?}")]
    InvalidFlag { var: &'static str, value: String },
}

fn parse_flag(var: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { var, value: raw }),
    }
}

impl ClientConfig {
    /// Read `CASEDESK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests inject a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = match lookup("CASEDESK_API_URL").map(|v| v.trim().to_string()) {
            Some(url) if !url.is_empty() => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidUrl {
                        var: "CASEDESK_API_URL",
                        value: url,
                    });
                }
                url.trim_end_matches('/').to_string()
            }
            _ => {
                tracing::info!("CASEDESK_API_URL not set; using {}", DEFAULT_API_URL);
                DEFAULT_API_URL.to_string()
            }
        };

        let storage_path = lookup("CASEDESK_STORAGE_PATH")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let defaults = FeatureFlags::default();
        let features = FeatureFlags {
            billing: parse_flag("CASEDESK_ENABLE_BILLING", lookup("CASEDESK_ENABLE_BILLING"), defaults.billing)?,
            company: parse_flag("CASEDESK_ENABLE_COMPANY", lookup("CASEDESK_ENABLE_COMPANY"), defaults.company)?,
            foia: parse_flag("CASEDESK_ENABLE_FOIA", lookup("CASEDESK_ENABLE_FOIA"), defaults.foia)?,
            workflows: parse_flag(
                "CASEDESK_ENABLE_WORKFLOWS",
                lookup("CASEDESK_ENABLE_WORKFLOWS"),
                defaults.workflows,
            )?,
        };

        Ok(Self {
            api_url,
            storage_path,
            features,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn reads_url_path_and_flags() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CASEDESK_API_URL", "https://api.example.com/v1/"),
            ("CASEDESK_STORAGE_PATH", "/tmp/casedesk.db"),
            ("CASEDESK_ENABLE_BILLING", "off"),
            ("CASEDESK_ENABLE_FOIA", "0"),
            ("CASEDESK_ENABLE_WORKFLOWS", "Yes"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://api.example.com/v1");
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/casedesk.db")));
        assert_eq!(
            config.features,
            FeatureFlags {
                billing: false,
                company: true,
                foia: false,
                workflows: true,
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            ClientConfig::from_lookup(lookup(&[("CASEDESK_API_URL", "ftp://x")])).unwrap_err(),
            ConfigError::InvalidUrl {
                var: "CASEDESK_API_URL",
                value: "ftp://x".to_string()
            }
        );
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("CASEDESK_ENABLE_COMPANY", "maybe")])),
            Err(ConfigError::InvalidFlag { var: "CASEDESK_ENABLE_COMPANY", .. })
        ));
    }
}
