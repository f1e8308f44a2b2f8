//! agentlite: a small LLM agent core.
//!
//! Streams model output through a per-request [`Turn`](agent::Turn) state
//! machine, dispatches the tool calls it produces through a validating
//! [`ToolScheduler`](tools::ToolScheduler), feeds the results back, and can
//! delegate bounded sub-tasks to restricted child agents via the built-in
//! `task` tool.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use agentlite::prelude::*;
//!
//! # async fn example(provider: Arc<dyn Provider>) -> agentlite::error::Result<()> {
//! let echo = FunctionTool::new(
//!     "echo",
//!     "Echo the input back",
//!     ParameterSchema::object().string("text", "Text to echo", true).build(),
//!     |args, _ctx| async move { Ok(serde_json::json!(args.get_str("text")?)) },
//! );
//! let config = AgentConfig::builder()
//!     .provider(provider)
//!     .tools(vec![Arc::new(echo) as Arc<dyn Tool>])
//!     .build();
//! let mut agent = Agent::new(config)?;
//! let reply = agent.send_message("Say hi through the echo tool", Default::default()).await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod storage;
pub mod subagent;
pub mod tools;
pub mod types;
