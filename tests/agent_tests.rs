//! Tests for the agent loop: turns, tool rounds, limits and persistence.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use agentlite::agent::{Agent, AgentConfig, AgentStatus, SendMessageOptions};
use agentlite::error::AgentError;
use agentlite::storage::{MemoryStorage, Storage};
use agentlite::tools::ScheduleMode;
use agentlite::types::{FinishReason, FunctionCall, Role, StreamEvent};

use common::{echo_tool, failing_tool, slow_tool, Reply, ScriptedProvider};

fn agent(provider: Arc<ScriptedProvider>) -> Agent {
    Agent::new(
        AgentConfig::builder()
            .provider(provider)
            .system_prompt("You are terse.")
            .tools(vec![echo_tool("read_file")])
            .build(),
    )
    .unwrap()
}

#[tokio::test]
async fn plain_reply_takes_one_iteration() {
    let provider = ScriptedProvider::new([Reply::text("hello")]);
    let mut agent = agent(provider.clone());

    let result = agent.send_message("hi", SendMessageOptions::default()).await.unwrap();

    assert_eq!(result.content, "hello");
    assert_eq!(result.iterations, 1);
    assert_eq!(result.turn_result.finish_reason, Some(FinishReason::Stop));
    assert_eq!(agent.turn_count(), 1);
    assert_eq!(agent.status(), AgentStatus::Idle);

    let roles: Vec<Role> = agent.history().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);

    let request = &provider.requests()[0];
    assert!(request.system_prompt.as_deref().unwrap().starts_with("You are terse."));
    assert_eq!(provider.tool_names(0), vec!["read_file"]);
}

#[tokio::test]
async fn tool_results_are_fed_back_until_the_model_stops() {
    let provider = ScriptedProvider::new([
        Reply::tool_call("read_file", json!({"path": "notes.md"})),
        Reply::text("notes read"),
    ]);
    let mut agent = agent(provider.clone());

    let result = agent.send_message("read my notes", Default::default()).await.unwrap();

    assert_eq!(result.content, "notes read");
    assert_eq!(result.iterations, 2);
    assert_eq!(result.usage.total(), 15);

    let history = agent.history();
    let roles: Vec<Role> = history.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );

    // The second request carries the tool response.
    let second = &provider.requests()[1];
    let tool_message = second
        .messages
        .iter()
        .find(|m| m.role == Role::Tool)
        .expect("tool message sent back");
    let value = serde_json::to_value(tool_message).unwrap();
    assert_eq!(value["parts"][0]["type"], "function_response");
    assert_eq!(value["parts"][0]["id"], "call-read_file");
    assert_eq!(value["parts"][0]["response"]["args"]["path"], "notes.md");
}

#[tokio::test]
async fn stream_surfaces_tool_results_between_turns() {
    let provider = ScriptedProvider::new([
        Reply::tool_call("read_file", json!({"path": "a"})),
        Reply::text("ok"),
    ]);
    let mut agent = agent(provider);

    let events: Vec<StreamEvent> = agent
        .send_message_stream("go", Default::default())
        .map(|item| item.unwrap())
        .collect()
        .await;

    let kinds: Vec<&str> = events
        .iter()
        .map(|event| match event {
            StreamEvent::Content(_) => "content",
            StreamEvent::FunctionCall(_) => "call",
            StreamEvent::FunctionResponse(_) => "response",
            StreamEvent::Finished { .. } => "finished",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["call", "finished", "response", "content", "finished"]
    );
}

#[tokio::test]
async fn failed_tool_is_reported_to_the_model() {
    let provider = ScriptedProvider::new([
        Reply::tool_call("broken", json!({})),
        Reply::text("sorry"),
    ]);
    let mut agent = Agent::new(
        AgentConfig::builder()
            .provider(provider.clone())
            .tools(vec![failing_tool("broken")])
            .build(),
    )
    .unwrap();

    let result = agent.send_message("try", Default::default()).await.unwrap();
    assert_eq!(result.content, "sorry");

    let tool_message = &agent.history()[2];
    let value = serde_json::to_value(tool_message).unwrap();
    let error = value["parts"][0]["response"]["error"].as_str().unwrap();
    assert!(error.contains("disk on fire"), "{error}");
}

#[tokio::test]
async fn unknown_tool_does_not_abort_the_exchange() {
    let provider = ScriptedProvider::new([
        Reply::tool_call("write_file", json!({})),
        Reply::text("fine"),
    ]);
    let mut agent = agent(provider);

    let result = agent.send_message("write", Default::default()).await.unwrap();

    assert_eq!(result.content, "fine");
    let value = serde_json::to_value(&agent.history()[2]).unwrap();
    assert_eq!(
        value["parts"][0]["response"]["error"],
        "Tool \"write_file\" not found"
    );
}

#[tokio::test]
async fn max_turns_is_enforced_before_calling_the_provider() {
    let provider = ScriptedProvider::new([Reply::text("one")]);
    let mut agent = Agent::new(
        AgentConfig::builder()
            .provider(provider.clone())
            .max_turns(1)
            .build(),
    )
    .unwrap();

    agent.send_message("first", Default::default()).await.unwrap();
    let err = agent.send_message("second", Default::default()).await.unwrap_err();

    assert!(matches!(err, AgentError::MaxTurnsReached(1)));
    assert_eq!(provider.request_count(), 1);
    assert_eq!(agent.status(), AgentStatus::Error);
}

#[tokio::test]
async fn tool_loop_stops_at_max_iterations() {
    let provider = ScriptedProvider::new([
        Reply::tool_call("read_file", json!({})),
        Reply::tool_call("read_file", json!({})),
        Reply::tool_call("read_file", json!({})),
    ]);
    let mut agent = Agent::new(
        AgentConfig::builder()
            .provider(provider.clone())
            .tools(vec![echo_tool("read_file")])
            .max_iterations(2)
            .build(),
    )
    .unwrap();

    let result = agent.send_message("loop", Default::default()).await.unwrap();

    assert_eq!(result.iterations, 2);
    assert_eq!(provider.request_count(), 2);
    assert_eq!(result.turn_result.tool_calls.len(), 1);
    assert_eq!(agent.status(), AgentStatus::Idle);
}

#[tokio::test]
async fn provider_failure_propagates_and_marks_error() {
    let provider = ScriptedProvider::new([Reply::failing_after(
        vec![agentlite::provider::StreamChunk::Content("par".into())],
        "connection reset",
    )]);
    let mut agent = agent(provider);

    let err = agent.send_message("hi", Default::default()).await.unwrap_err();

    assert!(matches!(err, AgentError::Stream(ref m) if m == "connection reset"));
    assert_eq!(agent.status(), AgentStatus::Error);
    assert_eq!(agent.turn_count(), 0);
}

#[tokio::test]
async fn cancelled_exchange_schedules_no_tools() {
    let provider = ScriptedProvider::new([Reply::tool_call("read_file", json!({}))]);
    let mut agent = agent(provider.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = agent
        .send_message("hi", SendMessageOptions::default().with_cancel(cancel))
        .await
        .unwrap();

    assert_eq!(result.turn_result.finish_reason, Some(FinishReason::Cancelled));
    assert_eq!(result.iterations, 1);
    assert_eq!(provider.request_count(), 0);
    assert!(agent.history().iter().all(|m| m.role != Role::Tool));
}

#[tokio::test(start_paused = true)]
async fn parallel_mode_keeps_call_order() {
    let provider = ScriptedProvider::new([
        Reply::tool_calls(vec![
            FunctionCall::from_value("slow", json!({})).with_id("1"),
            FunctionCall::from_value("fast", json!({})).with_id("2"),
        ]),
        Reply::text("both done"),
    ]);
    let mut agent = Agent::new(
        AgentConfig::builder()
            .provider(provider)
            .tools(vec![
                slow_tool("slow", Duration::from_millis(100), "slow"),
                slow_tool("fast", Duration::from_millis(10), "fast"),
            ])
            .build(),
    )
    .unwrap();

    let started = tokio::time::Instant::now();
    let responses: Vec<String> = agent
        .send_message_stream(
            "both",
            SendMessageOptions::default().with_schedule_mode(ScheduleMode::Parallel),
        )
        .filter_map(|item| async move {
            match item.unwrap() {
                StreamEvent::FunctionResponse(response) => Some(response.name),
                _ => None,
            }
        })
        .collect()
        .await;

    assert_eq!(responses, vec!["slow", "fast"]);
    assert!(started.elapsed() < Duration::from_millis(110));
}

#[tokio::test]
async fn history_is_bounded() {
    let provider = ScriptedProvider::new([Reply::text("a"), Reply::text("b")]);
    let mut agent = Agent::new(
        AgentConfig::builder()
            .provider(provider)
            .max_history_length(3)
            .build(),
    )
    .unwrap();

    agent.send_message("one", Default::default()).await.unwrap();
    agent.send_message("two", Default::default()).await.unwrap();

    let texts: Vec<String> = agent.history().iter().map(|m| m.text()).collect();
    assert_eq!(texts, vec!["a", "two", "b"]);
}

#[test]
fn history_bound_follows_max_turns() {
    let provider = ScriptedProvider::new([]);
    let config = AgentConfig::builder().provider(provider.clone()).max_turns(5).build();
    assert_eq!(config.history_limit(), 10);

    let config = AgentConfig::builder().provider(provider.clone()).build();
    assert_eq!(config.history_limit(), 1000);

    let config = AgentConfig::builder()
        .provider(provider)
        .max_turns(5)
        .max_history_length(7)
        .build();
    assert_eq!(config.history_limit(), 7);
}

#[test]
fn duplicate_tools_are_rejected() {
    let err = Agent::new(
        AgentConfig::builder()
            .provider(ScriptedProvider::new([]))
            .tools(vec![echo_tool("read_file"), echo_tool("read_file")])
            .build(),
    )
    .unwrap_err();
    assert!(matches!(err, AgentError::ToolAlreadyRegistered(name) if name == "read_file"));
}

#[tokio::test]
async fn sessions_are_saved_and_restored() {
    let storage = Arc::new(MemoryStorage::new());
    let provider = ScriptedProvider::new([Reply::text("remembered")]);
    let config = AgentConfig::builder()
        .provider(provider)
        .storage(storage.clone() as Arc<dyn Storage>)
        .session_id("session-1")
        .build();

    let mut first = Agent::new(config.clone()).unwrap();
    first.send_message("remember this", Default::default()).await.unwrap();
    assert!(storage.has_session("session-1").await.unwrap());

    let mut second = Agent::new(config).unwrap();
    assert!(second.history().is_empty());
    assert!(second.restore_session().await.unwrap());
    assert_eq!(second.history(), first.history());
}

#[tokio::test]
async fn restore_without_storage_is_a_no_op() {
    let mut agent = agent(ScriptedProvider::new([]));
    assert!(!agent.restore_session().await.unwrap());
}

#[tokio::test]
async fn delegation_adds_the_task_tool() {
    let provider = ScriptedProvider::new([Reply::text("hi")]);
    let mut agent = agent(provider.clone());
    agent.enable_delegation().unwrap();

    agent.send_message("hi", Default::default()).await.unwrap();

    assert_eq!(provider.tool_names(0), vec!["read_file", "task"]);
    assert!(agent.enable_delegation().is_err());
}
