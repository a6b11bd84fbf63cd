//! One-shot named trigger scheduling.
//!
//! The contract mirrors a host alarm facility: one named trigger fires once
//! at an absolute wall-clock time and must survive the process being torn
//! down between scheduling and delivery. The durable implementation keeps
//! the pending deadline in the key-value store; delivery happens when a
//! poll observes the deadline has passed.

use std::rc::Rc;

use crate::error::StorageError;
use crate::storage::Store;

/// External trigger facility: schedule/clear one named one-shot alarm.
pub trait AlarmScheduler {
    fn schedule(&self, name: &str, at_ms: i64) -> Result<(), StorageError>;

    /// Clearing an alarm that is not pending is a no-op.
    fn clear(&self, name: &str) -> Result<(), StorageError>;

    /// Deadline of the pending alarm, if any (epoch ms).
    fn pending(&self, name: &str) -> Result<Option<i64>, StorageError>;
}

/// Alarm scheduler persisted in the key-value store, surviving restarts.
pub struct StoredAlarm {
    store: Rc<Store>,
}

impl StoredAlarm {
    pub fn new(store: Rc<Store>) -> Self {
        Self { store }
    }

    fn key(name: &str) -> String {
        format!("alarm:{name}")
    }
}

impl AlarmScheduler for StoredAlarm {
    fn schedule(&self, name: &str, at_ms: i64) -> Result<(), StorageError> {
        self.store.kv_set(&Self::key(name), &at_ms.to_string())
    }

    fn clear(&self, name: &str) -> Result<(), StorageError> {
        self.store.kv_delete(&Self::key(name))
    }

    fn pending(&self, name: &str) -> Result<Option<i64>, StorageError> {
        Ok(self
            .store
            .kv_get(&Self::key(name))?
            .and_then(|v| v.parse::<i64>().ok()))
    }
}
