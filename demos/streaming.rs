//! Streaming example: print content as it arrives and show tool traffic.
//!
//! Run: `cargo run --example streaming`

#[path = "support/mod.rs"]
mod support;

use std::io::Write;

use agentlite::prelude::*;
use futures::StreamExt;

use support::{reply, LocalModel};

#[tokio::main]
async fn main() -> agentlite::error::Result<()> {
    let model = LocalModel::new(|_| {
        reply("Ferris scuttles on, borrowed claws return unharmed, the heap stays tidy.")
    });
    let mut agent = Agent::new(AgentConfig::builder().provider(model).build())?;

    let mut stream = agent.send_message_stream("Write a haiku about Rust.", Default::default());
    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Content(text) => {
                print!("{text}");
                std::io::stdout().flush()?;
            }
            StreamEvent::FunctionCall(call) => println!("\n[calling {}]", call.name),
            StreamEvent::FunctionResponse(response) => {
                println!("[{} returned {}]", response.name, response.response)
            }
            StreamEvent::Finished { reason, usage } => {
                let tokens = usage.map(|u| u.total()).unwrap_or_default();
                println!("\n[finished: {reason}, {tokens} tokens]");
            }
            StreamEvent::Error(message) => eprintln!("\n[error: {message}]"),
            StreamEvent::Thought(_) | StreamEvent::Retry => {}
        }
    }

    Ok(())
}
