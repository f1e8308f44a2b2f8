//! Tools shipped with the crate.

pub mod task;

pub use crate::subagent::TimeoutPolicy;
pub use task::{TaskTool, TASK_TOOL_NAME};
