//! Configuration system (layered: defaults < TOML file < environment).
//!
//! Environment variables use the `AGENTLITE_` prefix; a `.env` file in the
//! working directory is loaded first when present.

pub mod manager;

pub use manager::Config;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::agent::ChatConfig;
use crate::error::{AgentError, Result};
use crate::storage::{StorageConfig, StorageKind};

const ENV_PREFIX: &str = "AGENTLITE_";

/// Provider connection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Application-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_system_prompt: Option<String>,
    pub log_level: LogLevel,
    pub debug: bool,
    pub chat: ChatConfig,
}

impl AppConfig {
    /// Parse a TOML file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
            .map_err(|e| AgentError::Configuration(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| AgentError::Configuration(format!("Invalid TOML: {e}")))
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Full layering: defaults, then `path` (or the default config file if it
    /// exists), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };
        config.apply_env()?;
        tracing::debug!(
            log_level = %config.log_level,
            model = ?config.model(),
            "configuration loaded"
        );
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay `AGENTLITE_*` values produced by `lookup`. Unset keys leave
    /// the current value alone; unparsable values are an error.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.trim().is_empty())
        };

        if let Some(key) = get("API_KEY") {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = get("BASE_URL") {
            self.provider.base_url = Some(url);
        }
        if let Some(model) = get("MODEL") {
            self.provider.model = Some(model);
        }
        if let Some(model) = get("DEFAULT_MODEL") {
            self.default_model = Some(model);
        }
        if let Some(prompt) = get("SYSTEM_PROMPT") {
            self.default_system_prompt = Some(prompt);
        }
        if let Some(value) = get("TIMEOUT_MS") {
            self.provider.timeout_ms = Some(parse_env("TIMEOUT_MS", &value)?);
        }
        if let Some(value) = get("MAX_RETRIES") {
            self.provider.max_retries = Some(parse_env("MAX_RETRIES", &value)?);
        }
        if let Some(value) = get("RETRY_DELAY_MS") {
            self.provider.retry_delay_ms = Some(parse_env("RETRY_DELAY_MS", &value)?);
        }
        if let Some(value) = get("MAX_HISTORY_LENGTH") {
            self.chat.max_history_length = parse_env("MAX_HISTORY_LENGTH", &value)?;
        }
        if let Some(value) = get("LOG_LEVEL") {
            self.log_level = parse_env("LOG_LEVEL", &value)?;
        }
        if let Some(value) = get("DEBUG") {
            self.debug = matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(value) = get("STORAGE") {
            let kind: StorageKind = parse_env("STORAGE", &value)?;
            self.storage.get_or_insert_with(StorageConfig::default).kind = kind;
        }
        if let Some(path) = get("STORAGE_PATH") {
            self.storage.get_or_insert_with(StorageConfig::default).path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Model to request: the provider's model, else the top-level default,
    /// else the provider's default.
    pub fn model(&self) -> Option<&str> {
        self.provider
            .model
            .as_deref()
            .or(self.default_model.as_deref())
            .or(self.provider.default_model.as_deref())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AgentError::Configuration(format!("Failed to encode config: {e}")))
    }
}

/// `~/.agentlite/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".agentlite").join("config.toml"))
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| {
        AgentError::Configuration(format!("Invalid value for {ENV_PREFIX}{name}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_sensible() {
        let config = AppConfig::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(!config.debug);
        assert_eq!(config.chat.max_history_length, 1000);
        assert_eq!(config.chat.compression_threshold, 0.8);
        assert!(config.storage.is_none());
    }

    #[test]
    fn toml_overrides_defaults_partially() {
        let config = AppConfig::from_toml(
            r#"
            default_system_prompt = "Be terse."
            log_level = "debug"

            [provider]
            base_url = "http://localhost:11434"
            model = "llama3"

            [storage]
            type = "file"
            path = "/tmp/sessions"

            [chat]
            max_history_length = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.base_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.model(), Some("llama3"));
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.chat.max_history_length, 50);
        assert!(!config.chat.enable_history_compression);
        let storage = config.storage.unwrap();
        assert_eq!(storage.kind, StorageKind::File);
        assert_eq!(storage.path, Some(PathBuf::from("/tmp/sessions")));
    }

    #[test]
    fn invalid_toml_is_a_configuration_error() {
        let err = AppConfig::from_toml("log_level = [").unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::from_toml("[provider]\nmodel = \"from-file\"\n").unwrap();
        config
            .apply_env_from(lookup(&[
                ("AGENTLITE_MODEL", "from-env"),
                ("AGENTLITE_API_KEY", "sk-test"),
                ("AGENTLITE_LOG_LEVEL", "WARN"),
                ("AGENTLITE_DEBUG", "true"),
                ("AGENTLITE_STORAGE", "memory"),
                ("AGENTLITE_TIMEOUT_MS", "5000"),
            ]))
            .unwrap();

        assert_eq!(config.model(), Some("from-env"));
        assert_eq!(config.provider.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert!(config.debug);
        assert_eq!(config.provider.timeout_ms, Some(5000));
        assert_eq!(config.storage.map(|s| s.kind), Some(StorageKind::Memory));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.provider.model = Some("kept".into());
        config
            .apply_env_from(lookup(&[("AGENTLITE_MODEL", "  ")]))
            .unwrap();
        assert_eq!(config.model(), Some("kept"));
    }

    #[test]
    fn unparsable_env_value_names_the_variable() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_from(lookup(&[("AGENTLITE_MAX_RETRIES", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("AGENTLITE_MAX_RETRIES"));
    }

    #[test]
    fn model_falls_back_through_defaults() {
        let mut config = AppConfig::default();
        assert_eq!(config.model(), None);
        config.provider.default_model = Some("provider-default".into());
        assert_eq!(config.model(), Some("provider-default"));
        config.default_model = Some("app-default".into());
        assert_eq!(config.model(), Some("app-default"));
    }

    #[test]
    fn file_round_trips_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = AppConfig::default();
        config.provider.api_key = Some("sk-file".into());
        config.default_model = Some("gpt".into());
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(msg) if msg.contains("absent.toml")));
    }
}
