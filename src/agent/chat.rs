//! Bounded conversation history and the streaming path to the provider.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::AgentError;
use crate::provider::{ChatRequest, Provider, StreamChunk};
use crate::types::{EventStream, FinishReason, Message, MessagePart, Role, StreamEvent};

/// Default cap on stored messages.
pub const DEFAULT_MAX_HISTORY_LENGTH: usize = 1000;

/// History settings, persisted with each session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub max_history_length: usize,
    pub enable_history_compression: bool,
    pub compression_threshold: f64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            enable_history_compression: false,
            compression_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ChatStatus {
    Idle,
    Processing,
    Error,
}

/// Single owner of a conversation's message history.
///
/// The history never holds more than `max_history_length` messages; the
/// oldest are dropped after every append. Reads hand out copies.
pub struct Chat {
    provider: Arc<dyn Provider>,
    history: VecDeque<Message>,
    config: ChatConfig,
    status: ChatStatus,
}

impl Chat {
    pub fn new(provider: Arc<dyn Provider>, config: ChatConfig) -> Self {
        Self {
            provider,
            history: VecDeque::new(),
            config,
            status: ChatStatus::Idle,
        }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Replace the config and re-apply the history bound.
    pub fn update_config(&mut self, config: ChatConfig) {
        self.config = config;
        self.trim();
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    /// Full history, oldest first.
    pub fn history(&self) -> Vec<Message> {
        self.history.iter().cloned().collect()
    }

    /// History without empty or whitespace-only messages.
    pub fn curated_history(&self) -> Vec<Message> {
        self.history
            .iter()
            .filter(|message| !message.is_blank())
            .cloned()
            .collect()
    }

    pub fn add_message(&mut self, message: Message) {
        self.history.push_back(message);
        self.trim();
    }

    pub fn add_user_message(&mut self, text: impl Into<String>) {
        self.add_message(Message::user(text));
    }

    pub fn add_assistant_message(&mut self, text: impl Into<String>) {
        self.add_message(Message::assistant(text));
    }

    /// Replace the whole history; the bound still applies.
    pub fn set_history(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.history.clear();
        for message in messages {
            self.add_message(message);
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn trim(&mut self) {
        let max = self.config.max_history_length;
        while self.history.len() > max {
            self.history.pop_front();
        }
    }

    /// Stream one model response.
    ///
    /// A trailing user message in `request` is appended to history, then the
    /// provider is called with the curated history. Text and function calls
    /// are recorded as one assistant message once the provider finishes, and
    /// a final `Finished` event is emitted. Provider failures end the stream
    /// with an `Err` item.
    pub fn send_message_stream(&mut self, request: ChatRequest) -> EventStream<'_> {
        Box::pin(async_stream::stream! {
            self.status = ChatStatus::Processing;

            if let Some(last) = request.messages.last() {
                if last.role == Role::User {
                    self.add_message(last.clone());
                }
            }

            let provider_request = ChatRequest {
                messages: self.curated_history(),
                ..request
            };
            let provider = self.provider.clone();

            let mut chunks = match provider.stream_chat(&provider_request).await {
                Ok(chunks) => chunks,
                Err(err) => {
                    tracing::error!(provider = provider.name(), error = %err, "provider call failed");
                    self.status = ChatStatus::Error;
                    yield Err(err);
                    return;
                }
            };

            let mut content = String::new();
            let mut calls = Vec::new();
            let mut finish_reason = None;
            let mut usage = None;

            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(StreamChunk::Content(text)) => {
                        if text.is_empty() {
                            continue;
                        }
                        content.push_str(&text);
                        yield Ok(StreamEvent::Content(text));
                    }
                    Ok(StreamChunk::FunctionCall(call)) => {
                        calls.push(call.clone());
                        yield Ok(StreamEvent::FunctionCall(call));
                    }
                    Ok(StreamChunk::FunctionResponse(response)) => {
                        yield Ok(StreamEvent::FunctionResponse(response));
                    }
                    Ok(StreamChunk::Thought(text)) => {
                        yield Ok(StreamEvent::Thought(text));
                    }
                    Ok(StreamChunk::Finished { finish_reason: reason, usage: reported }) => {
                        finish_reason = reason;
                        usage = reported;
                    }
                    Ok(StreamChunk::Error { message, code }) => {
                        tracing::error!(provider = provider.name(), ?code, %message, "provider stream error");
                        self.status = ChatStatus::Error;
                        yield Err(AgentError::provider(provider.name(), message));
                        return;
                    }
                    Err(err) => {
                        tracing::error!(provider = provider.name(), error = %err, "provider stream failed");
                        self.status = ChatStatus::Error;
                        yield Err(err);
                        return;
                    }
                }
            }

            if !content.is_empty() || !calls.is_empty() {
                let mut parts = Vec::with_capacity(calls.len() + 1);
                if !content.is_empty() {
                    parts.push(MessagePart::Text { text: content });
                }
                parts.extend(calls.into_iter().map(MessagePart::FunctionCall));
                self.add_message(Message::new(Role::Assistant, parts));
            }

            self.status = ChatStatus::Idle;
            yield Ok(StreamEvent::Finished {
                reason: finish_reason.unwrap_or(FinishReason::Stop),
                usage,
            });
        })
    }

    /// Reset status after a stream was abandoned mid-way.
    pub(crate) fn mark_idle(&mut self) {
        self.status = ChatStatus::Idle;
    }
}

impl std::fmt::Debug for Chat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chat")
            .field("provider", &self.provider.name())
            .field("messages", &self.history.len())
            .field("config", &self.config)
            .field("status", &self.status)
            .finish()
    }
}
