//! Sub-agent configuration and task results.

use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::provider::Provider;
use crate::storage::Storage;
use crate::tools::ToolDefinition;
use crate::types::GenerationSettings;

/// How a timed-out task is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimeoutPolicy {
    /// The caller gets a timeout result; the sub-agent keeps running in the
    /// background and its eventual result is dropped.
    #[default]
    DiscardResult,
    /// The sub-agent is cancelled and its task aborted.
    Abort,
}

/// Configuration for one delegated task.
#[derive(Clone, Builder)]
pub struct SubAgentConfig {
    pub provider: Arc<dyn Provider>,
    #[builder(into)]
    pub task: Option<String>,
    #[builder(into)]
    pub system_prompt: Option<String>,
    #[builder(into)]
    pub model: Option<String>,
    /// Tool names the sub-agent may call. Unset or empty means all.
    pub allowed_tools: Option<Vec<String>>,
    /// Model turns the task may take. Defaults to the agent's iteration limit.
    pub max_turns: Option<u32>,
    #[builder(into)]
    pub parent_agent_id: Option<String>,
    #[builder(default)]
    pub settings: GenerationSettings,
    pub storage: Option<Arc<dyn Storage>>,
}

impl SubAgentConfig {
    /// Restrict to the tools named by `definitions`.
    pub fn allow_definitions(mut self, definitions: &[ToolDefinition]) -> Self {
        self.allowed_tools = Some(definitions.iter().map(|d| d.name.clone()).collect());
        self
    }
}

impl std::fmt::Debug for SubAgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubAgentConfig")
            .field("provider", &self.provider.name())
            .field("task", &self.task)
            .field("model", &self.model)
            .field("allowed_tools", &self.allowed_tools)
            .field("max_turns", &self.max_turns)
            .field("parent_agent_id", &self.parent_agent_id)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Error,
}

/// What a delegated task produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Model turns the sub-agent took.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    pub sub_agent_id: String,
}

impl TaskResult {
    pub fn failed(sub_agent_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            turns: None,
            tokens_used: None,
            sub_agent_id: sub_agent_id.into(),
        }
    }
}
