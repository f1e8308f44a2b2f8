//! Delegation to restricted child agents.
//!
//! A [`SubAgent`] owns a private [`Agent`](crate::agent::Agent) whose tool
//! registry is a filtered view of its parent's. The [`SubAgentManager`] keeps
//! them alive while a task runs and races the task against an optional
//! timeout.

pub mod manager;
pub mod report;
#[allow(clippy::module_inception)]
pub mod subagent;
pub mod types;

pub use manager::{SubAgentManager, TASK_TIMEOUT};
pub use report::{
    create_task_status_report, format_task_result_as_json, format_task_result_as_tool_response,
};
pub use subagent::SubAgent;
pub use types::{SubAgentConfig, TaskResult, TaskStatus, TimeoutPolicy};
