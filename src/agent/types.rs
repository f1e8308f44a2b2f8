//! Agent configuration, status and exchange results.

use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio_util::sync::CancellationToken;

use super::turn::TurnResult;
use crate::provider::Provider;
use crate::storage::Storage;
use crate::tools::{ScheduleMode, Tool, ToolDefinition};
use crate::types::{GenerationSettings, Message, UsageMetadata};

/// Turns a single exchange may take before the tool loop stops.
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// Agent configuration.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use agentlite::agent::AgentConfig;
/// # fn provider() -> Arc<dyn agentlite::provider::Provider> { unimplemented!() }
/// let config = AgentConfig::builder()
///     .provider(provider())
///     .system_prompt("You are a careful assistant.")
///     .max_turns(10)
///     .build();
/// assert_eq!(config.max_iterations, 20);
/// ```
#[derive(Clone, Builder)]
pub struct AgentConfig {
    pub provider: Arc<dyn Provider>,
    #[builder(into)]
    pub model: Option<String>,
    #[builder(into)]
    pub system_prompt: Option<String>,
    /// Appended to the system prompt under a "User Memory" heading.
    #[builder(into)]
    pub user_memory: Option<String>,
    #[builder(default)]
    pub tools: Vec<Arc<dyn Tool>>,
    /// Completed exchanges allowed before `MaxTurnsReached`.
    pub max_turns: Option<u32>,
    #[builder(default = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u32,
    /// Overrides the history bound derived from `max_turns`.
    pub max_history_length: Option<usize>,
    #[builder(default)]
    pub settings: GenerationSettings,
    pub storage: Option<Arc<dyn Storage>>,
    #[builder(into)]
    pub session_id: Option<String>,
    #[builder(default)]
    pub schedule_mode: ScheduleMode,
}

impl AgentConfig {
    /// History bound: explicit override, else twice `max_turns`, else the default.
    pub fn history_limit(&self) -> usize {
        self.max_history_length
            .or_else(|| self.max_turns.map(|turns| turns as usize * 2))
            .unwrap_or(super::chat::DEFAULT_MAX_HISTORY_LENGTH)
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("max_turns", &self.max_turns)
            .field("max_iterations", &self.max_iterations)
            .field("storage", &self.storage.is_some())
            .field("session_id", &self.session_id)
            .field("schedule_mode", &self.schedule_mode)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Processing,
    WaitingTool,
    Completed,
    Error,
}

/// Per-call overrides for one exchange.
#[derive(Debug, Clone, Default)]
pub struct SendMessageOptions {
    pub cancel: Option<CancellationToken>,
    /// Replaces the registry's definitions in the request.
    pub tools: Option<Vec<ToolDefinition>>,
    pub system_prompt: Option<String>,
    pub schedule_mode: Option<ScheduleMode>,
}

impl SendMessageOptions {
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_schedule_mode(mut self, mode: ScheduleMode) -> Self {
        self.schedule_mode = Some(mode);
        self
    }
}

/// Outcome of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct SendMessageResult {
    /// Text of the final turn.
    pub content: String,
    pub messages: Vec<Message>,
    /// Result of the final turn.
    pub turn_result: TurnResult,
    /// Model turns taken.
    pub iterations: u32,
    /// Usage summed over every turn.
    pub usage: UsageMetadata,
}
