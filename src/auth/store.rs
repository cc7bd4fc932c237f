//! Durable copy of the session cache.
//!
//! The file layout matches the browser store the web front-end kept under the
//! name `user-store`, so a state file can be inspected or seeded by hand:
//!
//! ```json
//! {"state": {"session": "...", "userID": "...", "email": "...",
//!            "customerID": null, "isPaidUser": true,
//!            "lastFetchTime": 1717171717000},
//!  "version": 0}
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::session::SessionSnapshot;

/// Fixed store name, also the file stem on disk
pub const STORE_NAME: &str = "user-store";

/// Persisted fields of the session cache (loading state is never stored)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default, rename = "userID")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "customerID")]
    pub customer_id: Option<String>,
    #[serde(default, rename = "isPaidUser")]
    pub is_paid_user: bool,
    /// Epoch milliseconds of the last refresh, 0 when never refreshed
    #[serde(default, rename = "lastFetchTime")]
    pub last_fetch_time: i64,
}

impl PersistedSession {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        Self {
            session: snapshot.session_token.clone(),
            user_id: snapshot.user_id.clone(),
            email: snapshot.email.clone(),
            customer_id: snapshot.customer_id.clone(),
            is_paid_user: snapshot.is_paid_user,
            last_fetch_time: snapshot
                .last_refresh
                .map(|t| t.timestamp_millis())
                .unwrap_or(0),
        }
    }

    pub fn into_snapshot(self) -> SessionSnapshot {
        let last_refresh = if self.last_fetch_time > 0 {
            Utc.timestamp_millis_opt(self.last_fetch_time).single()
        } else {
            None
        };
        SessionSnapshot {
            session_token: self.session,
            user_id: self.user_id,
            email: self.email,
            customer_id: self.customer_id,
            is_paid_user: self.is_paid_user,
            last_refresh,
            is_loading: false,
        }
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.clone().into_snapshot().last_refresh
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreEnvelope {
    state: PersistedSession,
    #[serde(default)]
    version: u32,
}

/// Where the session cache keeps its durable copy
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>>;
    fn save(&self, session: &PersistedSession) -> Result<()>;
}

/// JSON file at `{state_dir}/user-store.json`
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(format!("{}.json", STORE_NAME)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).context("Failed to read session store")?;
        let envelope: StoreEnvelope =
            serde_json::from_str(&contents).context("Failed to parse session store")?;
        Ok(Some(envelope.state))
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create state directory")?;
        }
        let envelope = StoreEnvelope {
            state: session.clone(),
            version: 0,
        };
        let contents = serde_json::to_string_pretty(&envelope)?;

        // Write beside the target, then rename, so a crash never leaves a torn file
        let tmp_path = self.path.with_extension("json.tmp");
        // A leftover from an earlier crash would keep its old mode
        if tmp_path.exists() {
            fs::remove_file(&tmp_path).context("Failed to remove stale session store")?;
        }
        let mut file = owner_only()
            .open(&tmp_path)
            .context("Failed to create session store")?;
        file.write_all(contents.as_bytes())
            .context("Failed to write session store")?;
        file.sync_all().context("Failed to flush session store")?;
        drop(file);

        fs::rename(&tmp_path, &self.path).context("Failed to replace session store")?;
        Ok(())
    }
}

/// Options for a fresh file only the current user can read, since it holds a bearer token
fn owner_only() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

/// Keeps the session in memory only; for one-shot commands and tests
#[derive(Default)]
pub struct MemorySessionStore {
    saved: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: PersistedSession) -> Self {
        Self {
            saved: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        Ok(self
            .saved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        *self
            .saved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> PersistedSession {
        PersistedSession {
            session: Some("tok".to_string()),
            user_id: Some("u1".to_string()),
            email: Some("a@b.c".to_string()),
            customer_id: None,
            is_paid_user: true,
            last_fetch_time: 1_717_171_717_000,
        }
    }

    #[test]
    fn test_file_store_uses_store_name() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        assert!(store.path().ends_with("user-store.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_writes_browser_layout() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(&temp_dir.path().join("state"));
        store.save(&sample()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["version"], 0);
        assert_eq!(raw["state"]["userID"], "u1");
        assert_eq!(raw["state"]["isPaidUser"], true);
        assert_eq!(raw["state"]["lastFetchTime"], 1_717_171_717_000_i64);

        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        store.save(&sample()).unwrap();
        // Overwriting keeps the mode and leaves no temp file behind
        store.save(&PersistedSession::default()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!store.path().with_extension("json.tmp").exists());
        assert_eq!(store.load().unwrap(), Some(PersistedSession::default()));
    }

    #[test]
    fn test_zero_fetch_time_means_never_refreshed() {
        let mut never = sample();
        never.last_fetch_time = 0;
        assert_eq!(never.last_refresh(), None);
        assert!(sample().last_refresh().is_some());
    }

    #[test]
    fn test_corrupt_store_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        fs::write(store.path(), "not json").unwrap();
        assert!(store.load().is_err());
    }
}
