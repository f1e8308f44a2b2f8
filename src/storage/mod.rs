//! Session persistence.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::agent::ChatConfig;
use crate::error::Result;
use crate::types::Message;

/// Snapshot of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionData {
    pub id: String,
    pub history: Vec<Message>,
    #[serde(default)]
    pub config: ChatConfig,
    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionMetadata {
    pub fn new(agent_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            agent_id,
            extra: serde_json::Map::new(),
        }
    }
}

/// Key-value store for session snapshots.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_session(&self, session_id: &str, data: &SessionData) -> Result<()>;

    /// `None` when nothing was saved under `session_id`.
    async fn restore_session(&self, session_id: &str) -> Result<Option<SessionData>>;

    /// Deleting an unknown session is not an error.
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    async fn list_sessions(&self) -> Result<Vec<String>>;

    async fn has_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.restore_session(session_id).await?.is_some())
    }
}

/// Which backend to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "type", default)]
    pub kind: StorageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn build(&self) -> Arc<dyn Storage> {
        match self.kind {
            StorageKind::Memory => Arc::new(MemoryStorage::new()),
            StorageKind::File => Arc::new(match &self.path {
                Some(path) => FileStorage::new(path.clone()),
                None => FileStorage::new_default(),
            }),
        }
    }
}
