//! Runtime configuration: settings plus the live objects built from them.

use std::sync::Arc;

use super::AppConfig;
use crate::agent::AgentConfig;
use crate::error::{AgentError, Result};
use crate::provider::Provider;
use crate::storage::Storage;
use crate::tools::{Tool, ToolRegistry};

/// Holds [`AppConfig`] together with the provider, storage backend and
/// tool registry an application wires up, and turns them into
/// [`AgentConfig`]s.
#[derive(Clone, Default)]
pub struct Config {
    app: AppConfig,
    provider: Option<Arc<dyn Provider>>,
    storage: Option<Arc<dyn Storage>>,
    registry: ToolRegistry,
}

impl Config {
    /// Storage is built from `app.storage` when configured.
    pub fn new(app: AppConfig) -> Self {
        let storage = app.storage.as_ref().map(|storage| storage.build());
        Self {
            app,
            provider: None,
            storage,
            registry: ToolRegistry::new(),
        }
    }

    pub fn app(&self) -> &AppConfig {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut AppConfig {
        &mut self.app
    }

    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn set_provider(&mut self, provider: Arc<dyn Provider>) {
        self.provider = Some(provider);
    }

    pub fn provider(&self) -> Option<&Arc<dyn Provider>> {
        self.provider.as_ref()
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        self.registry.register(tool)
    }

    /// The provider needs either an API key or a base URL.
    pub fn validate(&self) -> Result<()> {
        let provider = &self.app.provider;
        let has_key = provider.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
        let has_url = provider.base_url.as_deref().is_some_and(|u| !u.trim().is_empty());
        if !has_key && !has_url {
            return Err(AgentError::Configuration(
                "Either provider.api_key or provider.base_url must be set".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.app.chat.compression_threshold) {
            return Err(AgentError::Configuration(format!(
                "chat.compression_threshold must be between 0 and 1, got {}",
                self.app.chat.compression_threshold
            )));
        }
        Ok(())
    }

    /// Agent settings derived from this configuration. Fails without a
    /// provider.
    pub fn agent_config(&self) -> Result<AgentConfig> {
        let provider = self
            .provider
            .clone()
            .ok_or_else(|| AgentError::Configuration("No provider configured".to_string()))?;
        Ok(AgentConfig::builder()
            .provider(provider)
            .maybe_model(self.app.model().map(str::to_string))
            .maybe_system_prompt(self.app.default_system_prompt.clone())
            .tools(self.registry.all())
            .max_history_length(self.app.chat.max_history_length)
            .maybe_storage(self.storage.clone())
            .build())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("app", &self.app)
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("storage", &self.storage.is_some())
            .field("tools", &self.registry.names())
            .finish()
    }
}
