//! Static configuration: API endpoints, credentials, and option defaults.
//!
//! Loaded from a YAML file, then overlaid with `RELNOTE_*` environment
//! variables (a `.env` file is honoured via `dotenvy`).

use std::collections::HashMap;
use std::env;
use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "relnote.yaml";

/// Maps a raw tracker field onto an output key of an issue record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field name as the tracker reports it, e.g. `customfield_10200`.
    pub field_name: String,
    /// Key under which the value is stored on the issue record.
    pub key: String,
}

/// Program configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub API base URL.
    pub github_api: String,
    /// GitHub access token.
    pub github_token: String,
    /// Jira base URL.
    pub jira_api: String,
    /// Jira account name.
    pub jira_username: String,
    /// Jira API token.
    pub jira_token: String,
    /// Default `owner/name` repository.
    pub repo: Option<String>,
    /// Default issue field to group reports by.
    pub group_by_field: Option<String>,
    /// Default tracker project key.
    pub project_key: Option<String>,
    /// Extra tracker fields copied onto each issue record.
    pub jira_fields: Vec<FieldMapping>,
    /// Lifetime of every cache entry; entries never expire when unset.
    pub cache_ttl_secs: Option<u64>,
}

impl Config {
    /// Loads the config file at `path` and applies environment overrides.
    ///
    /// A missing file is not an error; credentials may come from the
    /// environment alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the file exists but cannot be read
    /// or parsed.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let _ = dotenvy::dotenv();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                Error::Configuration(format!("Failed to read config file {}: {e}", path.display()))
            })?;
            Self::from_yaml(&content).map_err(|e| {
                Error::Configuration(format!("Failed to parse config file {}: {e}", path.display()))
            })?
        } else {
            Self::default()
        };

        config.apply_env(|name| env::var(name).ok());
        Ok(config)
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns the YAML parse error.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Overrides credential fields from `RELNOTE_*` variables returned by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut String); 5] = [
            ("RELNOTE_GITHUB_API", &mut self.github_api),
            ("RELNOTE_GITHUB_TOKEN", &mut self.github_token),
            ("RELNOTE_JIRA_API", &mut self.jira_api),
            ("RELNOTE_JIRA_USERNAME", &mut self.jira_username),
            ("RELNOTE_JIRA_TOKEN", &mut self.jira_token),
        ];
        for (name, field) in fields {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *field = value;
            }
        }
    }

    /// Checks that both services have endpoints and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first incomplete service.
    pub fn validate(&self) -> Result<(), Error> {
        if self.github_api.is_empty() || self.github_token.is_empty() {
            return Err(Error::Configuration(
                "GitHub auth credentials are missing from the config.".into(),
            ));
        }
        if self.jira_api.is_empty() || self.jira_username.is_empty() || self.jira_token.is_empty() {
            return Err(Error::Configuration(
                "Jira auth credentials are missing from the config.".into(),
            ));
        }
        parse_url("github_api", &self.github_api)?;
        parse_url("jira_api", &self.jira_api)?;
        Ok(())
    }

    /// Option defaults contributed by this config, keyed by option name.
    #[must_use]
    pub fn option_defaults(&self) -> HashMap<String, String> {
        [
            ("repo", &self.repo),
            ("group_by_field", &self.group_by_field),
            ("project_key", &self.project_key),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|v| (name.to_string(), v)))
        .collect()
    }
}

/// Parses an absolute API URL.
///
/// # Errors
///
/// Returns [`Error::Configuration`] naming `field` when `value` is not an
/// absolute URL.
pub fn parse_url(field: &str, value: &str) -> Result<Url, Error> {
    Url::parse(value).map_err(|e| {
        Error::Configuration(format!("{field} must be an absolute URL with a protocol: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
github_api: https://api.github.com
github_token: notarealtoken
jira_api: https://jsw.atlassian.com
jira_username: fakey@example.com
jira_token: notarealapikey
project_key: abc
jira_fields:
  - field_name: components
    key: components
  - field_name: customfield_10200
    key: ac
";

    #[test]
    fn parses_yaml_with_field_mappings() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.project_key.as_deref(), Some("abc"));
        assert_eq!(config.jira_fields.len(), 2);
        assert_eq!(config.jira_fields[1].field_name, "customfield_10200");
        assert_eq!(config.jira_fields[1].key, "ac");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_github_credentials_is_fatal() {
        let mut config = Config::from_yaml(SAMPLE).unwrap();
        config.github_token.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("GitHub"));
    }

    #[test]
    fn missing_jira_credentials_is_fatal() {
        let mut config = Config::from_yaml(SAMPLE).unwrap();
        config.jira_username.clear();
        assert!(config.validate().unwrap_err().to_string().contains("Jira"));
    }

    #[test]
    fn relative_api_url_is_rejected() {
        let mut config = Config::from_yaml(SAMPLE).unwrap();
        config.jira_api = "jsw.atlassian.com".into();
        assert!(config.validate().unwrap_err().to_string().contains("jira_api"));
    }

    #[test]
    fn env_overrides_credentials() {
        let mut config = Config::from_yaml(SAMPLE).unwrap();
        config.apply_env(|name| match name {
            "RELNOTE_GITHUB_TOKEN" => Some("from-env".into()),
            "RELNOTE_JIRA_TOKEN" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.github_token, "from-env");
        assert_eq!(config.jira_token, "notarealapikey");
    }

    #[test]
    fn option_defaults_skip_unset_values() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        let defaults = config.option_defaults();
        assert_eq!(defaults.get("project_key").map(String::as_str), Some("abc"));
        assert!(!defaults.contains_key("repo"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("relnote_config_test_missing.yaml");
        let _ = std::fs::remove_file(&path);
        let config = Config::load(&path).unwrap();
        assert!(config.jira_fields.is_empty());
    }
}
