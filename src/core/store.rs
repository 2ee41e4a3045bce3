use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension};
use tokio::sync::broadcast;

use crate::error::Result;

/// Schema DDL run on open.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);
";

const CHANGE_CAPACITY: usize = 64;

/// Bumped whenever the meaning of a persisted key changes. A screen whose
/// stored version differs gets its preferences wiped back to defaults.
pub const PREFS_VERSION: &str = "1";

/// Emitted on every successful write or remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceChange {
    pub key: String,
    pub value: Option<String>,
}

/// Key-value preference storage. Last writer wins; there is no cross-process
/// coordination.
pub trait PreferenceStore: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn subscribe(&self) -> broadcast::Receiver<PreferenceChange>;
}

/// `accounts` + `view_mode` -> `accounts.view_mode`.
pub fn scoped_key(screen: &str, name: &str) -> String {
    format!("{screen}.{name}")
}

/// Check the stored schema version for `screen`; on mismatch drop `names`
/// and stamp the current version. Returns true if a reset happened.
pub fn ensure_version(store: &dyn PreferenceStore, screen: &str, names: &[&str]) -> bool {
    let version_key = scoped_key(screen, "prefs_version");
    let stored = store.read(&version_key);
    if stored.as_deref() == Some(PREFS_VERSION) {
        return false;
    }

    let reset = stored.is_some();
    if reset {
        log::info!(
            "Preference version for {screen} is {:?}, expected {PREFS_VERSION}; resetting",
            stored
        );
        clear_screen(store, screen, names);
    }
    if let Err(e) = store.write(&version_key, PREFS_VERSION) {
        log::warn!("Failed to stamp preference version for {screen}: {e}");
    }
    reset
}

pub fn clear_screen(store: &dyn PreferenceStore, screen: &str, names: &[&str]) {
    for name in names {
        if let Err(e) = store.remove(&scoped_key(screen, name)) {
            log::warn!("Failed to clear preference {screen}.{name}: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Process-local store, used by tests and when the database cannot be opened.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    changes: broadcast::Sender<PreferenceChange>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        MemoryStore {
            entries: Mutex::new(HashMap::new()),
            changes,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        let _ = self.changes.send(PreferenceChange {
            key: key.to_string(),
            value: Some(value.to_string()),
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let removed = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        if removed.is_some() {
            let _ = self.changes.send(PreferenceChange {
                key: key.to_string(),
                value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.changes.subscribe()
    }
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// Preferences persisted in a small SQLite database.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<PreferenceChange>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Preference store opened at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        SqliteStore {
            conn: Mutex::new(conn),
            changes,
        }
    }

    fn do_read(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM preferences WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()
    }

    fn do_write(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%s', 'now')",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn do_remove(conn: &Connection, key: &str) -> rusqlite::Result<usize> {
        conn.execute("DELETE FROM preferences WHERE key = ?1", [key])
    }
}

impl PreferenceStore for SqliteStore {
    fn read(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        match Self::do_read(&conn, key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Preference read failed for {key:?}: {e}");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        {
            let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
            Self::do_write(&conn, key, value)?;
        }
        let _ = self.changes.send(PreferenceChange {
            key: key.to_string(),
            value: Some(value.to_string()),
        });
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let removed = {
            let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
            Self::do_remove(&conn, key)?
        };
        if removed > 0 {
            let _ = self.changes.send(PreferenceChange {
                key: key.to_string(),
                value: None,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<PreferenceChange> {
        self.changes.subscribe()
    }
}
