//! Convenience re-exports for common use.

pub use crate::agent::{
    Agent, AgentConfig, AgentStatus, Chat, ChatConfig, SendMessageOptions, SendMessageResult,
    Turn, TurnResult, TurnState,
};
pub use crate::config::{AppConfig, Config};
pub use crate::error::{AgentError, Result};
pub use crate::provider::{ChatRequest, Provider, StreamChunk};
pub use crate::storage::{FileStorage, MemoryStorage, Storage};
pub use crate::subagent::{SubAgentConfig, SubAgentManager, TaskResult, TimeoutPolicy};
pub use crate::tools::{
    FunctionTool, ParameterSchema, ScheduleMode, TaskTool, Tool, ToolArguments, ToolCall,
    ToolDefinition, ToolRegistry, ToolResult,
};
pub use crate::types::{FinishReason, GenerationSettings, Message, Role, StreamEvent};
