//! File-backed session storage: one JSON document per session.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::{SessionData, Storage};
use crate::error::{AgentError, Result};

const FILE_VERSION: u32 = 1;

/// Stores each session as `<base_dir>/<session-id>.json`.
///
/// Ids are normalized into file names, so distinct ids can share a file.
/// Each file records the id that owns it: reads under any other id see no
/// session, and saves under another id are refused.
///
/// # Example
/// ```no_run
/// use agentlite::storage::{FileStorage, Storage};
///
/// # async fn example() -> agentlite::error::Result<()> {
/// let storage = FileStorage::new_default();
/// let ids = storage.list_sessions().await?;
/// println!("{ids:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `~/.agentlite/sessions`.
    pub fn new_default() -> Self {
        Self::new(default_sessions_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.json", normalize_label(session_id)))
    }

    async fn read_file(path: &Path) -> Result<Option<SessionFile>> {
        let raw = match fs::read_to_string(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn save_session(&self, session_id: &str, data: &SessionData) -> Result<()> {
        let path = self.session_path(session_id);
        fs::create_dir_all(&self.base_dir).await?;

        let mut session = data.clone();
        if let Some(existing) = Self::read_file(&path).await? {
            if existing.session_id != session_id {
                return Err(AgentError::Storage(format!(
                    "Session \"{session_id}\" maps to {} which belongs to session \"{}\"",
                    path.display(),
                    existing.session_id
                )));
            }
            session.metadata.created_at = existing.session.metadata.created_at;
        }
        let saved_at = Utc::now();
        session.metadata.updated_at = saved_at;

        let file = SessionFile {
            version: FILE_VERSION,
            session_id: session_id.to_string(),
            saved_at,
            session,
        };
        fs::write(&path, serde_json::to_vec_pretty(&file)?).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        tracing::debug!(session_id, path = %path.display(), "session saved");
        Ok(())
    }

    async fn restore_session(&self, session_id: &str) -> Result<Option<SessionData>> {
        let file = Self::read_file(&self.session_path(session_id)).await?;
        Ok(file
            .filter(|f| f.session_id == session_id)
            .map(|f| f.session))
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let path = self.session_path(session_id);
        match Self::read_file(&path).await {
            Ok(Some(file)) if file.session_id != session_id => return Ok(()),
            Ok(_) | Err(AgentError::Serialization(_)) => {}
            Err(err) => return Err(err),
        }
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_file(&path).await {
                Ok(Some(file)) => ids.push(file.session_id),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable session file");
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    session_id: String,
    saved_at: DateTime<Utc>,
    session: SessionData,
}

fn default_sessions_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".agentlite"))
        .unwrap_or_else(|| PathBuf::from(".agentlite"))
        .join("sessions")
}

/// File-name-safe form of a session id.
fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    let out: String = trimmed
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
