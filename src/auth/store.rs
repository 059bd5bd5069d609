// Credential persistence
// Key/value stores holding the access and refresh tokens

use dashmap::DashMap;
use rusqlite::OptionalExtension;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::types::{CredentialKeys, TokenPair};
use crate::error::StoreError;

/// Process-wide key/value persistence for credentials.
///
/// The client re-reads this on every request and never caches a copy.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read a token, treating empty values and backend errors as "absent"
pub(crate) fn read_token(store: &dyn CredentialStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(Some(token)) if !token.is_empty() => Some(token),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(key = key, error = %e, "Failed to read credential, treating as absent");
            None
        }
    }
}

/// Write a token pair. The refresh token is only overwritten when present.
pub(crate) fn write_tokens(
    store: &dyn CredentialStore,
    keys: CredentialKeys,
    tokens: &TokenPair,
) -> Result<(), StoreError> {
    store.set(keys.access_token, &tokens.access_token)?;
    if let Some(ref refresh_token) = tokens.refresh_token {
        store.set(keys.refresh_token, refresh_token)?;
    }
    Ok(())
}

/// Remove both tokens. Both removals are attempted; the first error wins.
pub(crate) fn clear_tokens(
    store: &dyn CredentialStore,
    keys: CredentialKeys,
) -> Result<(), StoreError> {
    let access = store.remove(keys.access_token);
    let refresh = store.remove(keys.refresh_token);
    access.and(refresh)
}

/// In-memory store, lost on exit
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: DashMap<String, String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a token pair
    pub fn with_tokens(keys: CredentialKeys, access_token: &str, refresh_token: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .insert(keys.access_token.to_string(), access_token.to_string());
        store
            .entries
            .insert(keys.refresh_token.to_string(), refresh_token.to_string());
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// SQLite-backed store.
///
/// Uses a single `auth_kv` table so credentials survive process restarts.
pub struct SqliteCredentialStore {
    conn: Mutex<rusqlite::Connection>,
    path: Option<PathBuf>,
}

impl SqliteCredentialStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::debug!("Opening credential store: {}", path.display());
        let conn = rusqlite::Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Non-persistent database, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: rusqlite::Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM auth_kv WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO auth_kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM auth_kv WHERE key = ?", [key])?;
        Ok(())
    }
}
