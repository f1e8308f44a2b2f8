//! Streaming types.

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use super::generation::FinishReason;
use super::message::{FunctionCall, FunctionResponse};
use super::usage::UsageMetadata;
use crate::error::AgentError;

/// An event emitted while a turn streams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text content.
    Content(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
    /// Model reasoning, surfaced but never stored.
    Thought(String),
    Finished {
        reason: FinishReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<UsageMetadata>,
    },
    Error(String),
    Retry,
}

impl StreamEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Lazy, finite, non-restartable sequence of stream events.
pub type EventStream<'a> = BoxStream<'a, Result<StreamEvent, AgentError>>;
