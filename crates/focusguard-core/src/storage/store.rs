//! SQLite-backed persistence.
//!
//! Two tables:
//! - `kv` holds the persisted session record field-per-key (plus pending
//!   alarm deadlines), JSON-encoded values.
//! - `rules` holds the installed blocking ruleset, standing in for the host
//!   network layer's rule table.

use std::rc::Rc;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::data_dir;
use crate::error::StorageError;
use crate::rules::{BlockRule, RuleTable};
use crate::session::FocusState;

const K_BLOCKLIST: &str = "blocklist";
const K_FOCUSING: &str = "focusing";
const K_SESSION_TYPE: &str = "session_type";
const K_ENDS_AT: &str = "ends_at";
const K_FOCUS_MINUTES: &str = "focus_minutes";
const K_BREAK_MINUTES: &str = "break_minutes";
const K_LOOP_ENABLED: &str = "loop_enabled";
const K_DARK_MODE: &str = "dark_mode";
/// First-install marker; field repair runs only while it is absent.
const K_INSTALLED: &str = "installed";

/// SQLite database holding the session record, alarms, and rule table.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the database at `<data_dir>/focusguard.db`, creating the schema
    /// if needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()
            .map_err(|e| StorageError::QueryFailed(format!("data dir: {e}")))?
            .join("focusguard.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &std::path::Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS rules (
                id           INTEGER PRIMARY KEY,
                priority     INTEGER NOT NULL,
                url_filter   TEXT NOT NULL,
                redirect_url TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    // ── Key-value access ─────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// JSON-decode a value. Missing and malformed values both read as
    /// `None`; repair happens only at install time.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.kv_get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::debug!(key, error = %e, "ignoring malformed persisted value");
                Ok(None)
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::EncodeFailed { key: key.to_string(), message: e.to_string() })?;
        self.kv_set(key, &raw)
    }

    // ── Session record ───────────────────────────────────────────────

    /// Read the persisted record, falling back to defaults for absent
    /// fields without writing anything back.
    pub fn load_state(&self) -> Result<FocusState, StorageError> {
        let defaults = FocusState::default();
        Ok(FocusState {
            blocklist: self.get_json(K_BLOCKLIST)?.unwrap_or(defaults.blocklist),
            focusing: self.get_json(K_FOCUSING)?.unwrap_or(defaults.focusing),
            session_type: self.get_json(K_SESSION_TYPE)?.unwrap_or(defaults.session_type),
            ends_at: self.get_json(K_ENDS_AT)?.unwrap_or(defaults.ends_at),
            focus_minutes: self.get_json(K_FOCUS_MINUTES)?.unwrap_or(defaults.focus_minutes),
            break_minutes: self.get_json(K_BREAK_MINUTES)?.unwrap_or(defaults.break_minutes),
            loop_enabled: self.get_json(K_LOOP_ENABLED)?.unwrap_or(defaults.loop_enabled),
            dark_mode: self.get_json(K_DARK_MODE)?.unwrap_or(defaults.dark_mode),
        })
    }

    /// Persist the full record, field per key.
    pub fn save_state(&self, state: &FocusState) -> Result<(), StorageError> {
        self.set_json(K_BLOCKLIST, &state.blocklist)?;
        self.set_json(K_FOCUSING, &state.focusing)?;
        self.set_json(K_SESSION_TYPE, &state.session_type)?;
        self.set_json(K_ENDS_AT, &state.ends_at)?;
        self.set_json(K_FOCUS_MINUTES, &state.focus_minutes)?;
        self.set_json(K_BREAK_MINUTES, &state.break_minutes)?;
        self.set_json(K_LOOP_ENABLED, &state.loop_enabled)?;
        self.set_json(K_DARK_MODE, &state.dark_mode)?;
        Ok(())
    }

    /// First-install repair: fill absent fields with defaults, once. Later
    /// calls are no-ops. Returns whether the repair ran.
    pub fn initialize(&self) -> Result<bool, StorageError> {
        if self.kv_get(K_INSTALLED)?.is_some() {
            return Ok(false);
        }
        let repaired = self.load_state()?;
        self.save_state(&repaired)?;
        self.kv_set(K_INSTALLED, "1")?;
        Ok(true)
    }

    // ── Rule table ───────────────────────────────────────────────────

    fn rules_installed(&self) -> Result<Vec<BlockRule>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, priority, url_filter, redirect_url FROM rules ORDER BY id")?;
        let rules = stmt
            .query_map([], |row| {
                Ok(BlockRule {
                    id: row.get(0)?,
                    priority: row.get(1)?,
                    url_filter: row.get(2)?,
                    redirect_url: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    fn rules_update(&self, remove_ids: &[u32], add: &[BlockRule]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        for id in remove_ids {
            tx.execute("DELETE FROM rules WHERE id = ?1", params![id])?;
        }
        for rule in add {
            tx.execute(
                "INSERT OR REPLACE INTO rules (id, priority, url_filter, redirect_url)
                 VALUES (?1, ?2, ?3, ?4)",
                params![rule.id, rule.priority, rule.url_filter, rule.redirect_url],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Rule table backed by the store's `rules` table.
pub struct SqliteRuleTable {
    store: Rc<Store>,
}

impl SqliteRuleTable {
    pub fn new(store: Rc<Store>) -> Self {
        Self { store }
    }
}

impl RuleTable for SqliteRuleTable {
    fn installed(&self) -> Result<Vec<BlockRule>, StorageError> {
        self.store.rules_installed()
    }

    fn update(&self, remove_ids: &[u32], add: &[BlockRule]) -> Result<(), StorageError> {
        self.store.rules_update(remove_ids, add)
    }
}
