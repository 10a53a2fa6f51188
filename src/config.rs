//! Configuration management for sqldeploy.
//!
//! Handles loading configuration from TOML files and environment variables:
//! the remote endpoint and its credentials, the ordered script list, the
//! statement splitting mode and the validator's escape rules.

use crate::error::{DeployError, Result};
use crate::executor::PayloadShape;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable holding the project base URL.
pub const ENV_URL: &str = "SUPABASE_URL";

/// Environment variable holding the service role key (sent as bearer token).
pub const ENV_SERVICE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Environment variable holding the `apikey` header value, when it differs
/// from the service key.
pub const ENV_API_KEY: &str = "SUPABASE_API_KEY";

/// Main configuration structure for sqldeploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ordered list of script files to validate or deploy.
    #[serde(default = "default_files")]
    pub files: Vec<PathBuf>,

    /// Remote SQL service settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Statement splitting settings.
    #[serde(default)]
    pub split: SplitConfig,

    /// Validator settings.
    #[serde(default)]
    pub validator: ValidatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            files: default_files(),
            remote: RemoteConfig::default(),
            split: SplitConfig::default(),
            validator: ValidatorConfig::default(),
        }
    }
}

fn default_files() -> Vec<PathBuf> {
    vec![
        PathBuf::from("supabase/schema.sql"),
        PathBuf::from("supabase/rls-policies.sql"),
        PathBuf::from("supabase/functions.sql"),
    ]
}

/// Remote SQL service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Project base URL (e.g., `https://abc.supabase.co`).
    pub url: Option<String>,

    /// Service role key, sent as `Authorization: Bearer <key>`.
    pub service_key: Option<String>,

    /// Value for the `apikey` header. Defaults to the service key.
    pub api_key: Option<String>,

    /// Endpoint paths tried in order for every statement.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Payload shapes tried in order for every endpoint.
    #[serde(default = "default_payloads")]
    pub payloads: Vec<PayloadShape>,

    /// Delay inserted between statements, in milliseconds.
    #[serde(default = "default_statement_delay_ms")]
    pub statement_delay_ms: u64,

    /// Optional request timeout. Unset means the client imposes none.
    pub timeout_secs: Option<u64>,

    /// Tables expected to exist once every script has been applied.
    #[serde(default = "default_verify_tables")]
    pub verify_tables: Vec<String>,
}

fn default_endpoints() -> Vec<String> {
    vec![
        "/rest/v1/rpc/sql".to_string(),
        "/rest/v1/rpc/query".to_string(),
        "/sql".to_string(),
    ]
}

fn default_payloads() -> Vec<PayloadShape> {
    PayloadShape::ALL.to_vec()
}

fn default_statement_delay_ms() -> u64 {
    200
}

fn default_verify_tables() -> Vec<String> {
    [
        "profiles",
        "leagues",
        "teams",
        "groups",
        "group_members",
        "matches",
        "predictions",
        "chat_messages",
        "leaderboards",
    ]
    .iter()
    .map(|table| table.to_string())
    .collect()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            api_key: None,
            endpoints: default_endpoints(),
            payloads: default_payloads(),
            statement_delay_ms: default_statement_delay_ms(),
            timeout_secs: None,
            verify_tables: default_verify_tables(),
        }
    }
}

impl RemoteConfig {
    /// Applies environment variables as defaults for unset fields.
    pub fn apply_env_defaults(&mut self) {
        if self.url.is_none() {
            self.url = std::env::var(ENV_URL).ok();
        }
        if self.service_key.is_none() {
            self.service_key = std::env::var(ENV_SERVICE_KEY).ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var(ENV_API_KEY).ok();
        }
    }

    /// Returns the parsed base URL.
    pub fn base_url(&self) -> Result<Url> {
        let raw = self.url.as_deref().ok_or_else(|| {
            DeployError::config(format!(
                "No remote URL configured. Set [remote].url or {ENV_URL}"
            ))
        })?;

        let url = Url::parse(raw)
            .map_err(|e| DeployError::config(format!("Invalid remote URL '{raw}': {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(DeployError::config(format!(
                "Invalid scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        Ok(url)
    }

    /// Returns the service key, or an error if it is not configured.
    pub fn service_key(&self) -> Result<&str> {
        self.service_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                DeployError::config(format!(
                    "No service key configured. Set [remote].service_key or {ENV_SERVICE_KEY}"
                ))
            })
    }

    /// Returns the `apikey` header value, falling back to the service key.
    pub fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Ok(key),
            None => self.service_key(),
        }
    }

    /// Returns the inter-statement delay.
    pub fn statement_delay(&self) -> Duration {
        Duration::from_millis(self.statement_delay_ms)
    }

    /// Returns the request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns a display-safe string (no credentials) for console output.
    pub fn display_string(&self) -> String {
        let url = self.url.as_deref().unwrap_or("<unset>");
        let key = self
            .service_key
            .as_deref()
            .map(masked_key)
            .unwrap_or_else(|| "<unset>".to_string());
        format!("{url} (key {key})")
    }
}

/// Masks a secret for display, keeping only a short prefix.
pub fn masked_key(key: &str) -> String {
    let prefix: String = key.chars().take(6).collect();
    if key.chars().count() <= 6 {
        "***".to_string()
    } else {
        format!("{prefix}***")
    }
}

/// Statement splitting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Remove leading `--` comment lines from a fragment before deciding
    /// whether it is a statement. Off by default, which drops any fragment
    /// whose first line is a comment.
    #[serde(default)]
    pub strip_leading_comments: bool,
}

/// Validator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Known literal fragments that must have their apostrophe doubled.
    #[serde(default = "default_escape_rules")]
    pub escape_rules: Vec<EscapeRuleConfig>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            escape_rules: default_escape_rules(),
        }
    }
}

/// A known literal fragment containing a single apostrophe used as a letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeRuleConfig {
    /// Human-readable name shown in reports.
    pub label: String,

    /// The fragment as written in natural text, with one apostrophe.
    pub fragment: String,
}

impl EscapeRuleConfig {
    /// Creates a new rule config.
    pub fn new(label: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fragment: fragment.into(),
        }
    }
}

fn default_escape_rules() -> Vec<EscapeRuleConfig> {
    vec![
        EscapeRuleConfig::new("Manchester City", "מנצ'סטר"),
        EscapeRuleConfig::new("Paris Saint-Germain", "ז'רמן"),
    ]
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqldeploy")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DeployError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            DeployError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
