//! Tool system: definitions, registry, validation and dispatch.

pub mod arguments;
pub mod builtin;
pub mod executor;
pub mod registry;
pub mod scheduler;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use builtin::{TaskTool, TimeoutPolicy};
pub use executor::execute_tool;
pub use registry::ToolRegistry;
pub use scheduler::{ScheduleMode, ToolScheduler};
pub use tool::{FunctionTool, Tool, ToolExecutionContext};
pub use types::{
    ParameterBuilder, ParameterKind, ParameterSchema, ToolCall, ToolDefinition, ToolError,
    ToolErrorKind, ToolResult,
};
pub use validation::{validate_arguments, ValidationError};
