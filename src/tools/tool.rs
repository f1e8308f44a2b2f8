//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::arguments::ToolArguments;
use super::registry::ToolRegistry;
use super::types::{ParameterSchema, ToolCall, ToolDefinition, ToolResult};
use crate::error::AgentError;

/// Context available during tool execution.
///
/// The scheduler derives one context per call from a shared base, filling in
/// [`ToolExecutionContext::call`].
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    pub agent_id: Option<String>,
    pub session_id: Option<String>,
    /// Fired when the surrounding exchange is cancelled.
    pub cancel: CancellationToken,
    /// The registry the call was dispatched from.
    pub registry: Arc<ToolRegistry>,
    pub call: Option<ToolCall>,
    pub metadata: serde_json::Value,
}

impl ToolExecutionContext {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Context for one call, sharing everything else with `self`.
    pub fn for_call(&self, call: &ToolCall) -> Self {
        Self {
            call: Some(call.clone()),
            ..self.clone()
        }
    }
}

/// Core tool trait. Implement to create custom tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameter schema.
    fn definition(&self) -> &ToolDefinition;

    /// Tool name (must match what the model calls).
    fn name(&self) -> &str {
        &self.definition().name
    }

    /// Execute with arguments that already passed schema validation.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResult, AgentError>;
}

type ToolHandler = dyn Fn(
        ToolArguments,
        ToolExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, AgentError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
///
/// ```
/// use agentlite::tools::{FunctionTool, ParameterSchema};
///
/// let echo = FunctionTool::new(
///     "echo",
///     "Echo the input back",
///     ParameterSchema::object().string("text", "Text to echo", true).build(),
///     |args, _ctx| async move { Ok(serde_json::json!(args.get_str("text")?)) },
/// );
/// # let _ = echo;
/// ```
pub struct FunctionTool {
    definition: ToolDefinition,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    /// Create a tool from a closure. `Ok` values become successful results.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, AgentError>> + Send + 'static,
    {
        Self {
            definition: ToolDefinition::new(name, description, parameters),
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResult, AgentError> {
        let value = (self.handler)(args.clone(), ctx.clone()).await?;
        Ok(ToolResult::ok(value))
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.definition.name)
            .field("description", &self.definition.description)
            .finish()
    }
}
