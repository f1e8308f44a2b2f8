//! Agent example with a tool loop, run against a local model.
//!
//! Run: `cargo run --example agent`

#[path = "support/mod.rs"]
mod support;

use std::sync::Arc;

use agentlite::prelude::*;
use agentlite::types::FunctionCall;

use support::{finished, first_user_text, last_tool_output, reply, LocalModel};

#[tokio::main]
async fn main() -> agentlite::error::Result<()> {
    // Calls `calculate` once, then reports what the tool returned.
    let model = LocalModel::new(|request| match last_tool_output(request) {
        Some(output) => reply(&format!("The answer is {output}.")),
        None => vec![
            StreamChunk::FunctionCall(
                FunctionCall::from_value(
                    "calculate",
                    serde_json::json!({"expression": first_user_text(request)}),
                )
                .with_id("call-1"),
            ),
            finished(FinishReason::ToolCalls, 8),
        ],
    });

    let calculate = FunctionTool::new(
        "calculate",
        "Add the integers in an expression",
        ParameterSchema::object()
            .string("expression", "Expression such as `2 + 2`", true)
            .build(),
        |args, _ctx| async move {
            let sum: i64 = args
                .get_str("expression")?
                .split('+')
                .filter_map(|term| term.trim().parse::<i64>().ok())
                .sum();
            Ok(serde_json::json!(sum))
        },
    );

    let mut agent = Agent::new(
        AgentConfig::builder()
            .provider(model)
            .system_prompt("You are a helpful math assistant.")
            .tools(vec![Arc::new(calculate) as Arc<dyn Tool>])
            .build(),
    )?;

    let result = agent.send_message("2 + 2", Default::default()).await?;
    println!("Agent: {}", result.content);
    println!(
        "Iterations: {}, tokens: {}, history: {} messages",
        result.iterations,
        result.usage.total(),
        agent.history().len()
    );

    Ok(())
}
