//! In-process session storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{SessionData, Storage};
use crate::error::Result;

/// Sessions kept in a map for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn save_session(&self, session_id: &str, data: &SessionData) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let mut data = data.clone();
        if let Some(existing) = sessions.get(session_id) {
            data.metadata.created_at = existing.metadata.created_at;
        }
        data.metadata.updated_at = Utc::now();
        sessions.insert(session_id.to_string(), data);
        Ok(())
    }

    async fn restore_session(&self, session_id: &str) -> Result<Option<SessionData>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
