//! The agent: turns, tool rounds and session persistence.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::chat::{Chat, ChatConfig};
use super::context::ContextBuilder;
use super::turn::{Turn, TurnState};
use super::types::{AgentConfig, AgentStatus, SendMessageOptions, SendMessageResult};
use crate::error::{AgentError, Result};
use crate::provider::ChatRequest;
use crate::storage::{SessionData, SessionMetadata};
use crate::subagent::SubAgentManager;
use crate::tools::{
    ScheduleMode, TaskTool, Tool, ToolCall, ToolExecutionContext, ToolRegistry, ToolResult,
    ToolScheduler,
};
use crate::types::{EventStream, FunctionResponse, Message, StreamEvent, UsageMetadata};

/// Item of the internal exchange stream.
enum Exchange {
    Event(StreamEvent),
    Done(SendMessageResult),
}

/// Drives a conversation: runs a turn, executes the tool calls it produced,
/// feeds results back, and repeats until the model stops calling tools.
pub struct Agent {
    id: String,
    config: AgentConfig,
    chat: Chat,
    context: ContextBuilder,
    registry: ToolRegistry,
    status: AgentStatus,
    turn_count: u32,
}

impl Agent {
    /// Build an agent. Fails if two configured tools share a name.
    pub fn new(config: AgentConfig) -> Result<Self> {
        let id = config
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let chat = Chat::new(
            config.provider.clone(),
            ChatConfig {
                max_history_length: config.history_limit(),
                ..ChatConfig::default()
            },
        );
        let mut registry = ToolRegistry::new();
        registry.register_all(config.tools.iter().cloned())?;

        tracing::debug!(agent_id = %id, tools = registry.len(), "agent created");
        Ok(Self {
            id,
            config,
            chat,
            context: ContextBuilder::new(),
            registry,
            status: AgentStatus::Idle,
            turn_count: 0,
        })
    }

    /// Agent id, also used as the session key.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    /// Completed exchanges.
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn history(&self) -> Vec<Message> {
        self.chat.history()
    }

    pub fn clear_history(&mut self) {
        self.chat.clear_history();
    }

    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        self.registry.register(tool)
    }

    pub fn unregister_tool(&mut self, name: &str) -> bool {
        self.registry.unregister(name)
    }

    /// Register the `task` tool, letting the model delegate work to
    /// sub-agents that share this agent's provider and model.
    pub fn enable_delegation(&mut self) -> Result<Arc<SubAgentManager>> {
        let manager = Arc::new(SubAgentManager::new());
        let mut tool = TaskTool::new(self.config.provider.clone(), manager.clone());
        if let Some(model) = &self.config.model {
            tool = tool.with_default_model(model.clone());
        }
        self.registry.register(Arc::new(tool))?;
        Ok(manager)
    }

    /// Run one exchange to completion.
    pub async fn send_message(
        &mut self,
        message: impl Into<Message>,
        options: SendMessageOptions,
    ) -> Result<SendMessageResult> {
        let mut exchange = self.exchange(message.into(), options);
        while let Some(item) = exchange.next().await {
            if let Exchange::Done(result) = item? {
                return Ok(result);
            }
        }
        Err(AgentError::InvalidState(
            "exchange ended without a result".to_string(),
        ))
    }

    /// Run one exchange, streaming every event. Tool results appear as
    /// `FunctionResponse` events between turns.
    pub fn send_message_stream(
        &mut self,
        message: impl Into<Message>,
        options: SendMessageOptions,
    ) -> EventStream<'_> {
        self.exchange(message.into(), options)
            .filter_map(|item| async move {
                match item {
                    Ok(Exchange::Event(event)) => Some(Ok(event)),
                    Ok(Exchange::Done(_)) => None,
                    Err(err) => Some(Err(err)),
                }
            })
            .boxed()
    }

    fn exchange(
        &mut self,
        message: Message,
        options: SendMessageOptions,
    ) -> BoxStream<'_, Result<Exchange>> {
        Box::pin(async_stream::stream! {
            if let Some(max) = self.config.max_turns {
                if self.turn_count >= max {
                    self.status = AgentStatus::Error;
                    yield Err(AgentError::MaxTurnsReached(max));
                    return;
                }
            }

            self.status = AgentStatus::Processing;
            let cancel = options.cancel.clone().unwrap_or_default();
            let mode = options.schedule_mode.unwrap_or(self.config.schedule_mode);
            let mut pending = Some(message);
            let mut iterations = 0u32;
            let mut usage = UsageMetadata::default();

            let last = loop {
                iterations += 1;
                let request = self.build_request(pending.take(), &options);
                let mut turn = Turn::new();
                let mut failure = None;
                {
                    let mut events = turn.run(&mut self.chat, request, Some(cancel.clone()));
                    while let Some(item) = events.next().await {
                        match item {
                            Ok(event) => yield Ok(Exchange::Event(event)),
                            Err(err) => {
                                failure = Some(err);
                                break;
                            }
                        }
                    }
                }
                if let Some(err) = failure {
                    self.status = AgentStatus::Error;
                    yield Err(err);
                    return;
                }

                let result = turn.result();
                if let Some(turn_usage) = &result.usage {
                    usage.merge(turn_usage);
                }
                tracing::debug!(
                    agent_id = %self.id,
                    iteration = iterations,
                    tool_calls = result.tool_calls.len(),
                    "agent iteration complete"
                );

                if turn.state() == TurnState::Cancelled || result.tool_calls.is_empty() {
                    break result;
                }

                self.status = AgentStatus::WaitingTool;
                let tool_results = self.run_tools(&result.tool_calls, &cancel, mode).await;
                for (call, tool_result) in result.tool_calls.iter().zip(tool_results) {
                    let response = FunctionResponse {
                        name: call.name.clone(),
                        response: tool_result.response_value(),
                        id: call.id.clone(),
                    };
                    self.chat.add_message(Message::tool_response(response.clone()));
                    yield Ok(Exchange::Event(StreamEvent::FunctionResponse(response)));
                }
                self.status = AgentStatus::Processing;

                if iterations >= self.config.max_iterations {
                    tracing::warn!(
                        agent_id = %self.id,
                        max_iterations = self.config.max_iterations,
                        "tool loop stopped at iteration limit"
                    );
                    break result;
                }
            };

            self.turn_count += 1;
            if let Err(err) = self.save_session().await {
                self.status = AgentStatus::Error;
                yield Err(err);
                return;
            }
            self.status = AgentStatus::Idle;

            yield Ok(Exchange::Done(SendMessageResult {
                content: last.response_text.clone(),
                messages: self.chat.history(),
                turn_result: last,
                iterations,
                usage,
            }));
        })
    }

    fn build_request(&self, message: Option<Message>, options: &SendMessageOptions) -> ChatRequest {
        let tools = options
            .tools
            .clone()
            .unwrap_or_else(|| self.registry.definitions());
        let system_prompt = options
            .system_prompt
            .as_deref()
            .or(self.config.system_prompt.as_deref());
        let mut request = self.context.build_chat_request(
            message.into_iter().collect(),
            system_prompt,
            tools,
            self.config.user_memory.as_deref(),
        );
        request.model = self.config.model.clone();
        request.settings = self.config.settings.clone();
        request
    }

    async fn run_tools(
        &self,
        calls: &[ToolCall],
        cancel: &CancellationToken,
        mode: ScheduleMode,
    ) -> Vec<ToolResult> {
        let registry = Arc::new(self.registry.clone());
        let ctx = ToolExecutionContext::new(registry.clone())
            .with_agent_id(self.id.clone())
            .with_session_id(self.id.clone())
            .with_cancel(cancel.child_token());
        ToolScheduler::new(registry).schedule(calls, &ctx, mode).await
    }

    /// Persist history and chat settings, if storage is configured.
    pub async fn save_session(&self) -> Result<()> {
        let Some(storage) = &self.config.storage else {
            return Ok(());
        };
        let data = SessionData {
            id: self.id.clone(),
            history: self.chat.history(),
            config: self.chat.config().clone(),
            metadata: SessionMetadata::new(Some(self.id.clone())),
        };
        storage.save_session(&self.id, &data).await
    }

    /// Reload history and chat settings from storage. Returns whether a
    /// session was found.
    pub async fn restore_session(&mut self) -> Result<bool> {
        let Some(storage) = self.config.storage.clone() else {
            return Ok(false);
        };
        let Some(session) = storage.restore_session(&self.id).await? else {
            return Ok(false);
        };
        tracing::debug!(agent_id = %self.id, messages = session.history.len(), "session restored");
        self.chat.update_config(session.config);
        self.chat.set_history(session.history);
        Ok(true)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("turn_count", &self.turn_count)
            .field("chat", &self.chat)
            .field("registry", &self.registry)
            .finish()
    }
}
