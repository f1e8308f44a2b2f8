//! Registry of live sub-agents and the timeout race around their tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::subagent::SubAgent;
use super::types::{SubAgentConfig, TaskResult, TaskStatus, TimeoutPolicy};
use crate::error::Result;
use crate::tools::ToolRegistry;

/// Error recorded when a task loses its timeout race.
pub const TASK_TIMEOUT: &str = "Task timeout";

#[derive(Debug, Default)]
pub struct SubAgentManager {
    sub_agents: Mutex<HashMap<String, Arc<SubAgent>>>,
}

impl SubAgentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sub-agent whose tools are `parent_registry` filtered by the
    /// config's allow-list. Returns its id.
    pub async fn create_sub_agent(
        &self,
        config: SubAgentConfig,
        parent_registry: &ToolRegistry,
    ) -> Result<String> {
        let sub_agent = Arc::new(SubAgent::new(config, parent_registry)?);
        let id = sub_agent.id().to_string();
        self.sub_agents.lock().await.insert(id.clone(), sub_agent);
        Ok(id)
    }

    pub async fn get_sub_agent(&self, id: &str) -> Option<Arc<SubAgent>> {
        self.sub_agents.lock().await.get(id).cloned()
    }

    /// Remove a sub-agent, cancelling its task first if it is running.
    /// Returns whether it existed.
    pub async fn destroy_sub_agent(&self, id: &str) -> bool {
        let removed = self.sub_agents.lock().await.remove(id);
        match removed {
            Some(sub_agent) => {
                if sub_agent.task_status() == TaskStatus::Running {
                    sub_agent.cancel_task();
                }
                tracing::debug!(sub_agent_id = %id, "sub-agent destroyed");
                true
            }
            None => false,
        }
    }

    /// Ids of live sub-agents, sorted.
    pub async fn list_sub_agents(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sub_agents.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Destroy every sub-agent.
    pub async fn clear(&self) {
        let drained: Vec<_> = self.sub_agents.lock().await.drain().collect();
        for (_, sub_agent) in drained {
            if sub_agent.task_status() == TaskStatus::Running {
                sub_agent.cancel_task();
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.sub_agents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sub_agents.lock().await.is_empty()
    }

    /// Run a sub-agent's task and destroy the sub-agent afterwards.
    ///
    /// With a timeout the task races a timer and the first to settle wins.
    /// When the timer wins the result is a `"Task timeout"` failure, and
    /// `policy` decides whether the task keeps running detached or is
    /// aborted.
    pub async fn run_task(
        self: &Arc<Self>,
        id: &str,
        timeout: Option<Duration>,
        policy: TimeoutPolicy,
    ) -> TaskResult {
        let Some(sub_agent) = self.get_sub_agent(id).await else {
            return TaskResult::failed(id, format!("Sub-agent {id} not found"));
        };

        let Some(limit) = timeout else {
            let result = sub_agent
                .execute_task()
                .await
                .unwrap_or_else(|err| TaskResult::failed(id, err.to_string()));
            self.destroy_sub_agent(id).await;
            return result;
        };

        let manager = Arc::clone(self);
        let worker = Arc::clone(&sub_agent);
        let worker_id = id.to_string();
        let mut handle = tokio::spawn(async move {
            let result = worker.execute_task().await;
            manager.destroy_sub_agent(&worker_id).await;
            result
        });

        tokio::select! {
            joined = &mut handle => match joined {
                Ok(Ok(result)) => result,
                Ok(Err(err)) => TaskResult::failed(id, err.to_string()),
                Err(err) => {
                    tracing::warn!(sub_agent_id = %id, error = %err, "task join failed");
                    TaskResult::failed(id, "Task execution failed")
                }
            },
            _ = tokio::time::sleep(limit) => {
                tracing::warn!(
                    sub_agent_id = %id,
                    timeout_ms = limit.as_millis() as u64,
                    ?policy,
                    "task timed out"
                );
                if policy == TimeoutPolicy::Abort {
                    sub_agent.cancel_task();
                    handle.abort();
                    self.destroy_sub_agent(id).await;
                }
                TaskResult::failed(id, TASK_TIMEOUT)
            }
        }
    }
}
