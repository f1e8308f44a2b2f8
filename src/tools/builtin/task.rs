//! The `task` tool: hand a self-contained job to a restricted sub-agent.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::provider::Provider;
use crate::subagent::{
    format_task_result_as_tool_response, SubAgentConfig, SubAgentManager, TimeoutPolicy,
};
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{Tool, ToolExecutionContext};
use crate::tools::types::{ParameterSchema, ToolDefinition, ToolErrorKind, ToolResult};

pub const TASK_TOOL_NAME: &str = "task";

/// Spawns a sub-agent per call, bound to the parent's provider.
///
/// The sub-agent sees the registry the call was dispatched from, narrowed
/// by `allowedTools`. It is destroyed once the call returns.
pub struct TaskTool {
    definition: ToolDefinition,
    provider: Arc<dyn Provider>,
    manager: Arc<SubAgentManager>,
    default_model: Option<String>,
    policy: TimeoutPolicy,
}

impl TaskTool {
    pub fn new(provider: Arc<dyn Provider>, manager: Arc<SubAgentManager>) -> Self {
        Self {
            definition: task_definition(),
            provider,
            manager,
            default_model: None,
            policy: TimeoutPolicy::default(),
        }
    }

    /// Model used when the call does not name one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn manager(&self) -> &Arc<SubAgentManager> {
        &self.manager
    }
}

fn task_definition() -> ToolDefinition {
    ToolDefinition::new(
        TASK_TOOL_NAME,
        "Create a sub-agent to carry out a specific task. The sub-agent has its own \
         context and a restricted tool set.",
        ParameterSchema::object()
            .string("task", "Task description for the sub-agent to carry out", true)
            .array(
                "allowedTools",
                "Tools the sub-agent may use. Omit to allow every available tool.",
                ParameterSchema::String {
                    description: None,
                    enum_values: None,
                },
                false,
            )
            .string("systemPrompt", "Custom system prompt for the sub-agent", false)
            .string("model", "Model for the sub-agent. Defaults to the parent's model.", false)
            .number("maxTurns", "Maximum turns for the sub-agent", false)
            .number("timeout", "Task timeout in milliseconds", false)
            .build(),
    )
}

#[async_trait]
impl Tool for TaskTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResult, AgentError> {
        let Some(task) = args.get_str_opt("task").filter(|t| !t.trim().is_empty()) else {
            return Ok(ToolResult::failure(
                ToolErrorKind::InvalidParameters,
                "Task parameter is required",
            ));
        };

        let allowed_tools = match args.get_str_list("allowedTools") {
            Ok(tools) => tools,
            Err(err) => {
                return Ok(ToolResult::failure(
                    ToolErrorKind::InvalidParameters,
                    err.to_string(),
                ))
            }
        };

        let config = SubAgentConfig {
            provider: self.provider.clone(),
            task: Some(task.to_string()),
            system_prompt: args.get_str_opt("systemPrompt").map(str::to_string),
            model: args
                .get_str_opt("model")
                .map(str::to_string)
                .or_else(|| self.default_model.clone()),
            allowed_tools,
            max_turns: args
                .get_u64_opt("maxTurns")
                .map(|turns| u32::try_from(turns).unwrap_or(u32::MAX)),
            parent_agent_id: ctx.agent_id.clone(),
            settings: Default::default(),
            storage: None,
        };

        let id = match self.manager.create_sub_agent(config, &ctx.registry).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(error = %err, "failed to create sub-agent");
                return Ok(ToolResult::failure(ToolErrorKind::ExecutionError, err.to_string()));
            }
        };

        let timeout = args
            .get_u64_opt("timeout")
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);
        tracing::debug!(
            sub_agent_id = %id,
            parent = ?ctx.agent_id,
            timeout_ms = ?timeout.map(|t| t.as_millis() as u64),
            "delegating task"
        );
        let result = self.manager.run_task(&id, timeout, self.policy).await;
        Ok(format_task_result_as_tool_response(&result))
    }
}

impl std::fmt::Debug for TaskTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTool")
            .field("provider", &self.provider.name())
            .field("default_model", &self.default_model)
            .field("policy", &self.policy)
            .finish()
    }
}
