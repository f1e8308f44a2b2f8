//! Validate-then-invoke for a single tool call.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::{ToolCall, ToolErrorKind, ToolResult};
use super::validation::validate_arguments;

/// Run one call against a resolved tool.
///
/// Never fails: invalid arguments, tool errors and panics inside the tool are
/// all reported as a failed [`ToolResult`]. Invalid arguments never reach
/// the tool.
pub async fn execute_tool(
    tool: &dyn Tool,
    call: &ToolCall,
    ctx: &ToolExecutionContext,
) -> ToolResult {
    let definition = tool.definition();

    if let Err(err) = validate_arguments(&call.args, &definition.parameters) {
        tracing::warn!(tool = %call.name, error = %err, "tool arguments rejected");
        return ToolResult::failure(ToolErrorKind::InvalidParameters, err.to_string());
    }

    let args = ToolArguments::new(call.args.clone());
    tracing::debug!(tool = %call.name, call_id = ?call.id, "executing tool");

    match AssertUnwindSafe(tool.execute(&args, ctx)).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            tracing::warn!(tool = %call.name, error = %err, "tool execution failed");
            ToolResult::failure(ToolErrorKind::ExecutionError, err.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::warn!(tool = %call.name, %message, "tool panicked");
            ToolResult::failure(ToolErrorKind::ExecutionError, message)
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Tool panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::tools::{FunctionTool, ParameterSchema};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn call(args: serde_json::Value) -> ToolCall {
        ToolCall::from_value("read_file", args)
    }

    fn counting_tool(counter: Arc<AtomicUsize>) -> FunctionTool {
        FunctionTool::new(
            "read_file",
            "Read a file",
            ParameterSchema::object().string("path", "File path", true).build(),
            move |args, _ctx| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(format!("contents of {}", args.get_str("path")?)))
                }
            },
        )
    }

    #[tokio::test]
    async fn wrong_type_never_reaches_the_tool() {
        let counter = Arc::new(AtomicUsize::new(0));
        let tool = counting_tool(counter.clone());

        let result = execute_tool(&tool, &call(json!({"path": 7})), &Default::default()).await;

        assert!(!result.success);
        assert_eq!(result.error_kind(), Some(ToolErrorKind::InvalidParameters));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_is_returned_unchanged() {
        let counter = Arc::new(AtomicUsize::new(0));
        let tool = counting_tool(counter.clone());

        let result =
            execute_tool(&tool, &call(json!({"path": "a.txt"})), &Default::default()).await;

        assert_eq!(result, ToolResult::ok(json!("contents of a.txt")));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn tool_errors_become_execution_errors() {
        let tool = FunctionTool::new(
            "boom",
            "Always fails",
            ParameterSchema::empty(),
            |_args, _ctx| async { Err(AgentError::tool("boom", "disk on fire")) },
        );

        let result = execute_tool(&tool, &ToolCall::from_value("boom", json!({})), &Default::default()).await;

        assert_eq!(result.error_kind(), Some(ToolErrorKind::ExecutionError));
        assert!(result.error_message().unwrap().contains("disk on fire"));
    }

    #[tokio::test]
    async fn panics_are_contained() {
        let tool = FunctionTool::new(
            "panicky",
            "Panics",
            ParameterSchema::empty(),
            |_args, _ctx| async {
                if true {
                    panic!("kaboom");
                }
                Ok(serde_json::Value::Null)
            },
        );

        let result = execute_tool(&tool, &ToolCall::from_value("panicky", json!({})), &Default::default()).await;

        assert_eq!(result.error_kind(), Some(ToolErrorKind::ExecutionError));
        assert_eq!(result.error_message(), Some("kaboom"));
    }
}
