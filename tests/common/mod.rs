//! Shared test helpers and a scripted mock provider.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;

use agentlite::error::{AgentError, Result};
use agentlite::provider::{ChatRequest, ChunkStream, Model, Provider, StreamChunk};
use agentlite::tools::{FunctionTool, ParameterSchema, Tool};
use agentlite::types::{FinishReason, FunctionCall, UsageMetadata};

/// One queued provider response.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub chunks: Vec<std::result::Result<StreamChunk, String>>,
    /// Slept before the first chunk.
    pub delay: Option<Duration>,
    /// Slept between chunks.
    pub chunk_delay: Option<Duration>,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Self {
            chunks: vec![
                Ok(StreamChunk::Content(text.to_string())),
                Ok(finished(FinishReason::Stop, 10)),
            ],
            ..Self::default()
        }
    }

    pub fn tool_call(name: &str, args: Value) -> Self {
        Self::tool_calls(vec![FunctionCall::from_value(name, args).with_id(format!("call-{name}"))])
    }

    pub fn tool_calls(calls: Vec<FunctionCall>) -> Self {
        let mut chunks: Vec<_> = calls
            .into_iter()
            .map(|call| Ok(StreamChunk::FunctionCall(call)))
            .collect();
        chunks.push(Ok(finished(FinishReason::ToolCalls, 5)));
        Self {
            chunks,
            ..Self::default()
        }
    }

    pub fn chunks(chunks: Vec<StreamChunk>) -> Self {
        Self {
            chunks: chunks.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }

    /// Stream `chunks`, then fail with a stream error.
    pub fn failing_after(chunks: Vec<StreamChunk>, message: &str) -> Self {
        let mut reply = Self::chunks(chunks);
        reply.chunks.push(Err(message.to_string()));
        reply
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn paced(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }
}

pub fn finished(reason: FinishReason, total: u32) -> StreamChunk {
    StreamChunk::Finished {
        finish_reason: Some(reason),
        usage: Some(UsageMetadata {
            prompt_token_count: Some(total / 2),
            candidates_token_count: Some(total - total / 2),
            total_token_count: Some(total),
        }),
    }
}

/// Provider that answers requests from a queue, in order, and records what
/// it was sent. An empty queue answers with "done".
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Tool names advertised in request `index`.
    pub fn tool_names(&self, index: usize) -> Vec<String> {
        self.requests.lock().unwrap()[index]
            .tools
            .iter()
            .map(|tool| tool.name.clone())
            .collect()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        Ok(vec![Model {
            id: "scripted-1".to_string(),
            name: "Scripted".to_string(),
            provider: "scripted".to_string(),
            context_window: Some(8_192),
            supports_streaming: Some(true),
            supports_function_calling: Some(true),
        }])
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChunkStream> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::text("done"));

        Ok(async_stream::stream! {
            if let Some(delay) = reply.delay {
                tokio::time::sleep(delay).await;
            }
            for (index, chunk) in reply.chunks.into_iter().enumerate() {
                if index > 0 {
                    if let Some(delay) = reply.chunk_delay {
                        tokio::time::sleep(delay).await;
                    }
                }
                yield chunk.map_err(AgentError::Stream);
            }
        }
        .boxed())
    }
}

/// Tool returning `{"tool": name, "args": args}`.
pub fn echo_tool(name: &str) -> Arc<dyn Tool> {
    let owned = name.to_string();
    Arc::new(FunctionTool::new(
        name,
        format!("Echo tool {name}"),
        ParameterSchema::object()
            .string("path", "Target path", false)
            .build(),
        move |args, _ctx| {
            let name = owned.clone();
            async move { Ok(serde_json::json!({"tool": name, "args": args.raw()})) }
        },
    ))
}

/// Tool that sleeps for `delay` and then returns `label`.
pub fn slow_tool(name: &str, delay: Duration, label: &str) -> Arc<dyn Tool> {
    let label = label.to_string();
    Arc::new(FunctionTool::new(
        name,
        "Sleeps, then answers",
        ParameterSchema::empty(),
        move |_args, _ctx| {
            let label = label.clone();
            async move {
                tokio::time::sleep(delay).await;
                Ok(Value::String(label))
            }
        },
    ))
}

/// Tool that always fails.
pub fn failing_tool(name: &str) -> Arc<dyn Tool> {
    let owned = name.to_string();
    Arc::new(FunctionTool::new(
        name,
        "Always fails",
        ParameterSchema::empty(),
        move |_args, _ctx| {
            let name = owned.clone();
            async move { Err(AgentError::tool(name, "disk on fire")) }
        },
    ))
}
