//! Runner configuration.
//!
//! Loaded via the `config` crate from an optional file, overridden by
//! environment variables prefixed with `FLOWBOT` and nested with `__`
//! (e.g. `FLOWBOT__TELEGRAM__TOKEN`).

use flowbot_messaging::TelegramSettings;
use flowbot_messaging::telegram::DEFAULT_API_BASE_URL;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Runner configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Bot API connection.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Fallback log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

/// Telegram connection configuration.
#[derive(Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bot token. Only needed when messages are actually sent.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_base_url", &self.api_base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl TelegramConfig {
    /// Client settings for this configuration.
    #[must_use]
    pub fn settings(&self) -> TelegramSettings {
        TelegramSettings {
            api_base_url: self.api_base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

impl RunnerConfig {
    /// Loads configuration from `path` (if given) and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::from_sources(path, environment())
    }

    fn from_sources(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder.add_source(environment).build()?.try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("FLOWBOT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let vars: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn defaults_without_sources() {
        let config = RunnerConfig::from_sources(None, env(&[])).expect("config");
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
        assert_eq!(config.telegram.request_timeout_secs, 30);
        assert!(config.telegram.token.is_none());
    }

    #[test]
    fn file_values_are_overridden_by_environment() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            "log_filter = \"warn\"\n\n[telegram]\ntoken = \"123:abc\"\nrequest_timeout_secs = 5"
        )
        .expect("write");

        let config = RunnerConfig::from_sources(
            Some(file.path()),
            env(&[("FLOWBOT__LOG_FILTER", "debug,flowbot_workflow=trace")]),
        )
        .expect("config");

        assert_eq!(config.log_filter, "debug,flowbot_workflow=trace");
        assert_eq!(config.telegram.token.as_deref(), Some("123:abc"));
        assert_eq!(
            config.telegram.settings().request_timeout,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn nested_environment_keys() {
        let config = RunnerConfig::from_sources(
            None,
            env(&[
                ("FLOWBOT__TELEGRAM__TOKEN", "999:xyz"),
                ("FLOWBOT__TELEGRAM__API_BASE_URL", "http://localhost:8081"),
            ]),
        )
        .expect("config");

        assert_eq!(config.telegram.token.as_deref(), Some("999:xyz"));
        assert_eq!(config.telegram.settings().api_base_url, "http://localhost:8081");
    }

    #[test]
    fn debug_redacts_token() {
        let config = TelegramConfig {
            token: Some("123:secret".to_string()),
            ..TelegramConfig::default()
        };
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = RunnerConfig::from_sources(
            Some(Path::new("/nonexistent/flowbot.toml")),
            env(&[]),
        );
        assert!(result.is_err());
    }
}
