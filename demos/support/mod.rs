//! A local, deterministic provider shared by the demos so they run offline.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use agentlite::error::Result;
use agentlite::provider::{ChatRequest, ChunkStream, Model, Provider, StreamChunk};
use agentlite::types::{FinishReason, Message, MessagePart, Role, UsageMetadata};

type Planner = dyn Fn(&ChatRequest) -> Vec<StreamChunk> + Send + Sync;

/// Answers every request with the chunks its planner returns.
pub struct LocalModel {
    planner: Box<Planner>,
}

impl LocalModel {
    pub fn new(
        planner: impl Fn(&ChatRequest) -> Vec<StreamChunk> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            planner: Box::new(planner),
        })
    }
}

#[async_trait]
impl Provider for LocalModel {
    fn name(&self) -> &str {
        "local"
    }

    async fn list_models(&self) -> Result<Vec<Model>> {
        Ok(vec![Model {
            id: "local-1".into(),
            name: "Local demo model".into(),
            provider: "local".into(),
            context_window: Some(4096),
            supports_streaming: Some(true),
            supports_function_calling: Some(true),
        }])
    }

    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChunkStream> {
        let chunks = (self.planner)(request);
        Ok(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }
}

/// Split `text` into word chunks followed by a `Finished` chunk.
pub fn reply(text: &str) -> Vec<StreamChunk> {
    let mut chunks: Vec<_> = text
        .split_inclusive(' ')
        .map(|word| StreamChunk::Content(word.to_string()))
        .collect();
    chunks.push(finished(FinishReason::Stop, text.len() as u32));
    chunks
}

pub fn finished(reason: FinishReason, tokens: u32) -> StreamChunk {
    StreamChunk::Finished {
        finish_reason: Some(reason),
        usage: Some(UsageMetadata {
            total_token_count: Some(tokens),
            ..Default::default()
        }),
    }
}

/// Text of the latest tool response in the request, if the last message is one.
pub fn last_tool_output(request: &ChatRequest) -> Option<String> {
    let last = request.messages.last().filter(|m| m.role == Role::Tool)?;
    last.parts.iter().find_map(|part| match part {
        MessagePart::FunctionResponse(response) => Some(match &response.response {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }),
        _ => None,
    })
}

/// Text of the first user message.
pub fn first_user_text(request: &ChatRequest) -> String {
    request
        .messages
        .iter()
        .find(|m| m.role == Role::User)
        .map(Message::text)
        .unwrap_or_default()
}
