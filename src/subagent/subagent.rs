//! A restricted child agent that runs one task.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use super::types::{SubAgentConfig, TaskResult, TaskStatus};
use crate::agent::{Agent, AgentConfig, SendMessageOptions, DEFAULT_MAX_ITERATIONS};
use crate::error::{AgentError, Result};
use crate::tools::ToolRegistry;

pub(crate) const CANCELLED_TASK: &str = "Task cancelled";

#[derive(Debug)]
struct TaskState {
    status: TaskStatus,
    result: Option<TaskResult>,
}

/// Owns a private [`Agent`] whose tools are a filtered view of the parent's.
///
/// Status moves `pending → running → (completed | error)`.
pub struct SubAgent {
    id: String,
    parent_agent_id: Option<String>,
    task: Option<String>,
    agent: tokio::sync::Mutex<Agent>,
    state: Mutex<TaskState>,
    cancel: CancellationToken,
}

impl SubAgent {
    pub fn new(config: SubAgentConfig, parent_registry: &ToolRegistry) -> Result<Self> {
        let id = format!("subagent-{}", uuid::Uuid::new_v4());
        let registry = parent_registry.filtered(config.allowed_tools.as_deref());
        let agent = Agent::new(AgentConfig {
            provider: config.provider,
            model: config.model,
            system_prompt: config.system_prompt,
            user_memory: None,
            tools: registry.all(),
            // One exchange per task: the turn budget bounds its tool loop,
            // and history keeps the default bound.
            max_turns: None,
            max_iterations: config.max_turns.unwrap_or(DEFAULT_MAX_ITERATIONS).max(1),
            max_history_length: None,
            settings: config.settings,
            storage: config.storage,
            session_id: Some(id.clone()),
            schedule_mode: Default::default(),
        })?;
        tracing::debug!(
            sub_agent_id = %id,
            parent = ?config.parent_agent_id,
            tools = ?registry.names(),
            "sub-agent created"
        );

        Ok(Self {
            id,
            parent_agent_id: config.parent_agent_id,
            task: config.task,
            agent: tokio::sync::Mutex::new(agent),
            state: Mutex::new(TaskState {
                status: TaskStatus::Pending,
                result: None,
            }),
            cancel: CancellationToken::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent_agent_id(&self) -> Option<&str> {
        self.parent_agent_id.as_deref()
    }

    pub fn task(&self) -> Option<&str> {
        self.task.as_deref()
    }

    pub fn task_status(&self) -> TaskStatus {
        self.state().status
    }

    pub fn task_result(&self) -> Option<TaskResult> {
        self.state().result.clone()
    }

    /// Names of the tools the sub-agent can call.
    pub async fn tool_names(&self) -> Vec<String> {
        self.agent.lock().await.tool_registry().names()
    }

    /// Send the task as a single user message and wait for the exchange.
    ///
    /// Agent failures are reported in the returned result, not as `Err`.
    pub async fn execute_task(&self) -> Result<TaskResult> {
        let task = self
            .task
            .clone()
            .ok_or_else(|| AgentError::InvalidState("No task specified".to_string()))?;

        {
            let mut state = self.state();
            state.status = TaskStatus::Running;
            state.result = None;
        }
        tracing::debug!(sub_agent_id = %self.id, "task started");

        let options = SendMessageOptions::default().with_cancel(self.cancel.clone());
        let outcome = self.agent.lock().await.send_message(task, options).await;

        let mut state = self.state();
        if self.cancel.is_cancelled() {
            if let Some(result) = state.result.clone() {
                return Ok(result);
            }
        }
        let result = match outcome {
            Ok(exchange) => {
                state.status = TaskStatus::Completed;
                TaskResult {
                    success: true,
                    result: Some(exchange.content),
                    error: None,
                    turns: Some(exchange.iterations),
                    tokens_used: Some(exchange.usage.total()),
                    sub_agent_id: self.id.clone(),
                }
            }
            Err(err) => {
                tracing::warn!(sub_agent_id = %self.id, error = %err, "task failed");
                state.status = TaskStatus::Error;
                TaskResult::failed(self.id.clone(), err.to_string())
            }
        };
        state.result = Some(result.clone());
        Ok(result)
    }

    /// Stop a running task. No effect in any other status.
    pub fn cancel_task(&self) {
        let mut state = self.state();
        if state.status != TaskStatus::Running {
            return;
        }
        state.status = TaskStatus::Error;
        state.result = Some(TaskResult::failed(self.id.clone(), CANCELLED_TASK));
        self.cancel.cancel();
        tracing::debug!(sub_agent_id = %self.id, "task cancelled");
    }

    fn state(&self) -> MutexGuard<'_, TaskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SubAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubAgent")
            .field("id", &self.id)
            .field("parent_agent_id", &self.parent_agent_id)
            .field("task", &self.task)
            .field("status", &self.task_status())
            .finish()
    }
}
