//! Model provider trait and request/response types.
//!
//! Transport is left to implementors: a provider only has to turn a
//! [`ChatRequest`] into a stream of [`StreamChunk`]s.

use async_trait::async_trait;
use bon::Builder;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::tools::ToolDefinition;
use crate::types::{
    FinishReason, FunctionCall, FunctionResponse, GenerationSettings, Message, UsageMetadata,
};

/// A model offered by a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_streaming: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_function_calling: Option<bool>,
}

/// A request sent to a provider.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    #[builder(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub system_prompt: Option<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub model: Option<String>,
    #[builder(default)]
    #[serde(flatten)]
    pub settings: GenerationSettings,
}

/// One unit of provider output.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Content(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
    Thought(String),
    Finished {
        finish_reason: Option<FinishReason>,
        usage: Option<UsageMetadata>,
    },
    /// A provider-level failure reported in-band.
    Error {
        message: String,
        code: Option<String>,
    },
}

/// Stream of provider chunks.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk>>;

/// Aggregated, non-streaming response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub content: String,
    pub function_calls: Vec<FunctionCall>,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<UsageMetadata>,
}

/// Core trait implemented by all model backends.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Models this provider can serve.
    async fn list_models(&self) -> Result<Vec<Model>>;

    /// Start a streaming chat. The returned stream is consumed exactly once.
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChunkStream>;

    /// Non-streaming chat, aggregated from [`Provider::stream_chat`].
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut stream = self.stream_chat(request).await?;
        let mut response = ChatResponse::default();
        while let Some(chunk) = stream.next().await {
            match chunk? {
                StreamChunk::Content(text) => response.content.push_str(&text),
                StreamChunk::FunctionCall(call) => response.function_calls.push(call),
                StreamChunk::Finished {
                    finish_reason,
                    usage,
                } => {
                    response.finish_reason = finish_reason;
                    response.usage = usage;
                }
                StreamChunk::Error { message, .. } => {
                    return Err(AgentError::provider(self.name(), message));
                }
                StreamChunk::FunctionResponse(_) | StreamChunk::Thought(_) => {}
            }
        }
        Ok(response)
    }

    /// Rough token estimate: one token per four characters.
    fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}
