//! Agent system: multi-turn conversations with tool execution.
//!
//! A [`Chat`] owns the bounded history and talks to the provider, a [`Turn`]
//! drives one streamed request, and the [`Agent`] loops turns and tool rounds
//! until the model stops calling tools.

#[allow(clippy::module_inception)]
pub mod agent;
pub mod chat;
pub mod context;
pub mod turn;
pub mod types;

pub use agent::Agent;
pub use chat::{Chat, ChatConfig, ChatStatus, DEFAULT_MAX_HISTORY_LENGTH};
pub use context::ContextBuilder;
pub use turn::{Turn, TurnResult, TurnState, CANCELLED_MESSAGE};
pub use types::{
    AgentConfig, AgentStatus, SendMessageOptions, SendMessageResult, DEFAULT_MAX_ITERATIONS,
};
