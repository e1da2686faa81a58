use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use trainer_core::model::{Attempt, SessionRecord, UserId};

use crate::repository::CatalogError;

/// Per-user training history: completed session records plus a flat response
/// log for difficulty estimation.
///
/// Append-only like the scenario catalog; records are never rewritten.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a finished session and its attempts under the record's user.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the backend cannot be written.
    async fn record_session(&self, record: SessionRecord) -> Result<(), CatalogError>;

    /// The user's trailing `limit` attempts across all sessions, oldest
    /// first. An unknown user yields an empty history.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the backend cannot be read.
    async fn recent_attempts(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Attempt>, CatalogError>;

    /// All recorded sessions for the user, in recording order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the backend cannot be read.
    async fn sessions_for(&self, user_id: &UserId) -> Result<Vec<SessionRecord>, CatalogError>;
}

/// On-disk document shape: `{"users": {"<id>": {...}}}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    users: BTreeMap<String, UserEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserEntry {
    #[serde(default)]
    attempts: Vec<Attempt>,
    #[serde(default)]
    sessions: Vec<SessionRecord>,
}

/// Flat-file session store backed by a JSON document.
///
/// Same lifecycle as [`crate::JsonCatalog`]: the whole file is read at open,
/// queries are served from memory, and every write rewrites the file before
/// memory is updated.
#[derive(Debug)]
pub struct JsonSessionStore {
    path: PathBuf,
    users: Arc<Mutex<BTreeMap<String, UserEntry>>>,
}

impl JsonSessionStore {
    /// Opens an existing history file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read, or
    /// `Serialization` if it is not a valid history document.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path).map_err(|e| CatalogError::Io(e.to_string()))?;
        let file: HistoryFile =
            serde_json::from_str(&raw).map_err(|e| CatalogError::Serialization(e.to_string()))?;

        Ok(Self {
            path,
            users: Arc::new(Mutex::new(file.users)),
        })
    }

    /// Opens the store, seeding a missing file with an empty history.
    ///
    /// # Errors
    ///
    /// Same conditions as [`JsonSessionStore::open`], plus `Io` if the seed
    /// file cannot be written.
    pub fn create_if_missing(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).map_err(|e| CatalogError::Io(e.to_string()))?;
            }
            write_file(path, &BTreeMap::new())?;
        }
        Self::open(path)
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, UserEntry>>, CatalogError> {
        self.users
            .lock()
            .map_err(|e| CatalogError::Io(e.to_string()))
    }
}

fn write_file(path: &Path, users: &BTreeMap<String, UserEntry>) -> Result<(), CatalogError> {
    let doc = serde_json::json!({ "users": users });
    let json = serde_json::to_string_pretty(&doc)
        .map_err(|e| CatalogError::Serialization(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| CatalogError::Io(e.to_string()))
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn record_session(&self, record: SessionRecord) -> Result<(), CatalogError> {
        let mut guard = self.lock()?;

        let mut updated = guard.clone();
        let entry = updated
            .entry(record.user_id.as_str().to_string())
            .or_default();
        entry.attempts.extend(record.attempts.iter().cloned());
        entry.sessions.push(record);

        // Rewrite the file first so memory never holds a record the disk
        // rejected.
        write_file(&self.path, &updated)?;
        *guard = updated;
        Ok(())
    }

    async fn recent_attempts(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Attempt>, CatalogError> {
        let guard = self.lock()?;
        Ok(guard
            .get(user_id.as_str())
            .map(|entry| {
                let start = entry.attempts.len().saturating_sub(limit);
                entry.attempts[start..].to_vec()
            })
            .unwrap_or_default())
    }

    async fn sessions_for(&self, user_id: &UserId) -> Result<Vec<SessionRecord>, CatalogError> {
        let guard = self.lock()?;
        Ok(guard
            .get(user_id.as_str())
            .map(|entry| entry.sessions.clone())
            .unwrap_or_default())
    }
}
