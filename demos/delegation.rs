//! Delegation example: the parent hands a job to a sub-agent through the
//! `task` tool. The sub-agent only sees `read_file`.
//!
//! Run: `cargo run --example delegation`

#[path = "support/mod.rs"]
mod support;

use std::sync::Arc;

use agentlite::prelude::*;
use agentlite::types::FunctionCall;

use support::{finished, first_user_text, last_tool_output, reply, LocalModel};

#[tokio::main]
async fn main() -> agentlite::error::Result<()> {
    // Parent and child share this model; the tools offered tell them apart.
    let model = LocalModel::new(|request| {
        let offers_task = request.tools.iter().any(|tool| tool.name == "task");
        if let Some(output) = last_tool_output(request) {
            let prefix = if offers_task { "Delegated result" } else { "README says" };
            return reply(&format!("{prefix}: {output}"));
        }
        let call = if offers_task {
            FunctionCall::from_value(
                "task",
                serde_json::json!({
                    "task": format!("Summarize for the user: {}", first_user_text(request)),
                    "allowedTools": ["read_file"],
                    "maxTurns": 3,
                    "timeout": 5_000,
                }),
            )
        } else {
            FunctionCall::from_value("read_file", serde_json::json!({"path": "README.md"}))
        };
        vec![
            StreamChunk::FunctionCall(call.with_id("call-1")),
            finished(FinishReason::ToolCalls, 6),
        ]
    });

    let read_file = FunctionTool::new(
        "read_file",
        "Read a file from the workspace",
        ParameterSchema::object().string("path", "File path", true).build(),
        |args, _ctx| async move {
            Ok(serde_json::json!(format!(
                "{} describes a small LLM agent core.",
                args.get_str("path")?
            )))
        },
    );
    let write_file = FunctionTool::new(
        "write_file",
        "Write a file in the workspace",
        ParameterSchema::object()
            .string("path", "File path", true)
            .string("content", "New contents", true)
            .build(),
        |_args, _ctx| async move { Ok(serde_json::json!("written")) },
    );

    let mut agent = Agent::new(
        AgentConfig::builder()
            .provider(model)
            .tools(vec![
                Arc::new(read_file) as Arc<dyn Tool>,
                Arc::new(write_file) as Arc<dyn Tool>,
            ])
            .build(),
    )?;
    let manager = agent.enable_delegation()?;

    let result = agent
        .send_message("What is in the README?", Default::default())
        .await?;
    println!("Agent: {}", result.content);
    println!("Live sub-agents afterwards: {}", manager.len().await);

    Ok(())
}
