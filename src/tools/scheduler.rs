//! Batch dispatch of tool calls.

use std::sync::Arc;

use futures::future;
use serde::{Deserialize, Serialize};

use super::executor::execute_tool;
use super::registry::ToolRegistry;
use super::tool::ToolExecutionContext;
use super::types::{ToolCall, ToolErrorKind, ToolResult};

/// How a batch of calls is dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// One call at a time, in input order.
    #[default]
    Sequential,
    /// All calls at once on the current task, joined in input order.
    Parallel,
}

/// Resolves calls against a registry and runs them through the executor.
#[derive(Debug, Clone, Default)]
pub struct ToolScheduler {
    registry: Arc<ToolRegistry>,
}

impl ToolScheduler {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run a batch. `results[i]` always answers `calls[i]`, and no tool
    /// failure escapes as an error.
    pub async fn schedule(
        &self,
        calls: &[ToolCall],
        ctx: &ToolExecutionContext,
        mode: ScheduleMode,
    ) -> Vec<ToolResult> {
        let base = ToolExecutionContext {
            registry: self.registry.clone(),
            ..ctx.clone()
        };
        tracing::debug!(calls = calls.len(), ?mode, "scheduling tool calls");

        match mode {
            ScheduleMode::Sequential => {
                let mut results = Vec::with_capacity(calls.len());
                for call in calls {
                    results.push(self.run_call(call, &base).await);
                }
                results
            }
            ScheduleMode::Parallel => {
                future::join_all(calls.iter().map(|call| self.run_call(call, &base))).await
            }
        }
    }

    async fn run_call(&self, call: &ToolCall, base: &ToolExecutionContext) -> ToolResult {
        let Some(tool) = self.registry.get(&call.name) else {
            tracing::warn!(tool = %call.name, "tool not found");
            return ToolResult::failure(
                ToolErrorKind::ToolNotFound,
                format!("Tool \"{}\" not found", call.name),
            );
        };
        execute_tool(tool.as_ref(), call, &base.for_call(call)).await
    }
}
