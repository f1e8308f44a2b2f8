//! Turning task results into tool responses and readable reports.

use super::manager::TASK_TIMEOUT;
use super::types::TaskResult;
use crate::error::Result;
use crate::tools::{ToolErrorKind, ToolResult};

/// `success` mirrors the task; failures are `EXECUTION_ERROR`, and timeouts
/// also carry the code `task_timeout`.
pub fn format_task_result_as_tool_response(result: &TaskResult) -> ToolResult {
    if result.success {
        return ToolResult::ok(result.result.clone().unwrap_or_default());
    }
    let message = result
        .error
        .clone()
        .unwrap_or_else(|| "Task execution failed".to_string());
    let timed_out = message == TASK_TIMEOUT;
    let failure = ToolResult::failure(ToolErrorKind::ExecutionError, message);
    if timed_out {
        failure.with_code("task_timeout")
    } else {
        failure
    }
}

pub fn format_task_result_as_json(result: &TaskResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Multi-line summary, one section per populated field.
pub fn create_task_status_report(result: &TaskResult) -> String {
    let mut parts = vec![format!(
        "Task Status: {}",
        if result.success { "Success" } else { "Failed" }
    )];
    if let Some(text) = result.result.as_deref().filter(|t| !t.is_empty()) {
        parts.push(format!("\nResult:\n{text}"));
    }
    if let Some(error) = result.error.as_deref().filter(|e| !e.is_empty()) {
        parts.push(format!("\nError: {error}"));
    }
    if let Some(turns) = result.turns {
        parts.push(format!("\nTurns: {turns}"));
    }
    if let Some(tokens) = result.tokens_used {
        parts.push(format!("\nTokens Used: {tokens}"));
    }
    if !result.sub_agent_id.is_empty() {
        parts.push(format!("\nSubAgent ID: {}", result.sub_agent_id));
    }
    parts.join("\n")
}
