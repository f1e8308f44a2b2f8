//! Per-request streaming state machine.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio_util::sync::CancellationToken;

use super::chat::Chat;
use crate::error::AgentError;
use crate::provider::ChatRequest;
use crate::tools::ToolCall;
use crate::types::{EventStream, FinishReason, Message, StreamEvent, UsageMetadata};

/// Message emitted when a turn is cancelled.
pub const CANCELLED_MESSAGE: &str = "User cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TurnState {
    Idle,
    Streaming,
    Finished,
    Errored,
    Cancelled,
}

/// What a finished turn produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// History snapshot taken when the turn ended.
    pub messages: Vec<Message>,
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

enum Outcome {
    Completed,
    Cancelled,
    Failed(AgentError),
}

/// One request/response exchange with the model.
///
/// A turn runs once: `Idle → Streaming → {Finished, Errored, Cancelled}`.
#[derive(Debug)]
pub struct Turn {
    id: String,
    state: TurnState,
    response_text: String,
    tool_calls: Vec<ToolCall>,
    finish_reason: Option<FinishReason>,
    usage: Option<UsageMetadata>,
    messages: Vec<Message>,
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

impl Turn {
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: TurnState::Idle,
            response_text: String::new(),
            tool_calls: Vec::new(),
            finish_reason: None,
            usage: None,
            messages: Vec::new(),
        }
    }

    /// Drive `chat` for one request and forward its events.
    ///
    /// Cancellation is checked before every pull and before forwarding what
    /// was pulled. A pull already in flight is allowed to finish. Once cancelled, exactly one `Error("User cancelled")`
    /// event is emitted and nothing more is consumed. A source failure is
    /// forwarded as an `Error` event followed by the error itself.
    pub fn run<'a>(
        &'a mut self,
        chat: &'a mut Chat,
        request: ChatRequest,
        cancel: Option<CancellationToken>,
    ) -> EventStream<'a> {
        Box::pin(async_stream::stream! {
            if self.state != TurnState::Idle {
                yield Err(AgentError::InvalidState(format!("turn {} already ran", self.id)));
                return;
            }
            self.state = TurnState::Streaming;
            let cancel = cancel.unwrap_or_default();
            tracing::debug!(turn_id = %self.id, "turn started");

            let mut events = chat.send_message_stream(request);
            let outcome = loop {
                if cancel.is_cancelled() {
                    break Outcome::Cancelled;
                }
                let Some(item) = events.next().await else {
                    break Outcome::Completed;
                };
                if cancel.is_cancelled() {
                    break Outcome::Cancelled;
                }
                match item {
                    Ok(event) => {
                        self.record(&event);
                        yield Ok(event);
                    }
                    Err(err) => break Outcome::Failed(err),
                }
            };
            drop(events);

            match outcome {
                Outcome::Completed => {
                    self.state = TurnState::Finished;
                    self.messages = chat.history();
                    tracing::debug!(
                        turn_id = %self.id,
                        tool_calls = self.tool_calls.len(),
                        finish_reason = ?self.finish_reason,
                        "turn finished"
                    );
                }
                Outcome::Cancelled => {
                    chat.mark_idle();
                    self.state = TurnState::Cancelled;
                    self.finish_reason = Some(FinishReason::Cancelled);
                    self.messages = chat.history();
                    tracing::debug!(turn_id = %self.id, "turn cancelled");
                    yield Ok(StreamEvent::Error(CANCELLED_MESSAGE.to_string()));
                }
                Outcome::Failed(err) => {
                    self.state = TurnState::Errored;
                    self.finish_reason = Some(FinishReason::Error);
                    self.messages = chat.history();
                    tracing::debug!(turn_id = %self.id, error = %err, "turn failed");
                    yield Ok(StreamEvent::Error(err.to_string()));
                    yield Err(err);
                }
            }
        })
    }

    fn record(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::Content(text) => self.response_text.push_str(text),
            StreamEvent::FunctionCall(call) => self.tool_calls.push(call.clone()),
            StreamEvent::Finished { reason, usage } => {
                self.finish_reason = Some(*reason);
                self.usage = usage.clone();
            }
            _ => {}
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    pub fn result(&self) -> TurnResult {
        TurnResult {
            messages: self.messages.clone(),
            response_text: self.response_text.clone(),
            finish_reason: self.finish_reason,
            usage: self.usage.clone(),
            tool_calls: self.tool_calls.clone(),
        }
    }
}
