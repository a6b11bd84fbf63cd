//! Session manager: the single writer of the persisted record.
//!
//! Every operation re-reads the record from storage, applies a pure
//! transition, persists the result, and only then runs the requested side
//! effects. No in-memory continuity is assumed between calls; a recycled
//! process picks up exactly where the store says it left off.

use std::rc::Rc;

use chrono::Utc;

use crate::alarm::StoredAlarm;
use crate::effects::{EffectRunner, LogAudio, LogNotifier};
use crate::error::CoreError;
use crate::rules::BlockRule;
use crate::session::state::{self, FocusState, Transition, ALARM_NAME};
use crate::storage::{Config, SqliteRuleTable, Store};

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Owns the persisted record and exposes the transition operations.
pub struct SessionManager {
    store: Rc<Store>,
    effects: EffectRunner,
}

impl SessionManager {
    pub fn new(store: Rc<Store>, effects: EffectRunner) -> Self {
        Self { store, effects }
    }

    /// Open the default on-disk store with the durable alarm scheduler,
    /// the SQLite rule table, and log-backed notification/audio sinks.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened.
    pub fn open() -> Result<Self, CoreError> {
        let store = Rc::new(Store::open()?);
        let prefs = Config::load_or_default();
        let effects = EffectRunner::new(
            Box::new(StoredAlarm::new(store.clone())),
            Box::new(SqliteRuleTable::new(store.clone())),
            Box::new(LogNotifier),
            Box::new(LogAudio),
            prefs,
        );
        Ok(Self::new(store, effects))
    }

    /// First-install repair plus an initial rule sync. Safe to call on
    /// every startup; the repair itself runs only once.
    pub fn initialize(&self) -> Result<(), CoreError> {
        if self.store.initialize()? {
            tracing::info!("initialized persisted record with defaults");
        }
        self.sync_rules()
    }

    /// Read-only snapshot of the persisted record. Performs no repair.
    pub fn state(&self) -> Result<FocusState, CoreError> {
        Ok(self.store.load_state()?)
    }

    fn commit(&self, transition: Transition) -> Result<FocusState, CoreError> {
        // Persist first; effects never roll the record back.
        self.store.save_state(&transition.next)?;
        self.effects.run(&transition.next, &transition.effects)?;
        Ok(transition.next)
    }

    // ── Session transitions ──────────────────────────────────────────

    /// Start a focus session (overriding any session in progress) and
    /// return the new record.
    pub fn start_focus(&self, minutes: Option<u32>) -> Result<FocusState, CoreError> {
        let current = self.store.load_state()?;
        self.commit(state::start_focus(&current, minutes, now_ms()))
    }

    /// Stop the current session. Idempotent.
    pub fn stop_focus(&self) -> Result<FocusState, CoreError> {
        let current = self.store.load_state()?;
        self.commit(state::stop_focus(&current))
    }

    /// Deliver a fired trigger by name. Returns whether it caused a
    /// transition (wrong names and stale deliveries are ignored).
    pub fn deliver_trigger(&self, alarm: &str) -> Result<bool, CoreError> {
        let current = self.store.load_state()?;
        match state::trigger_fired(&current, alarm, now_ms()) {
            Some(transition) => {
                self.commit(transition)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deliver any due trigger, cascading (a focus end immediately
    /// followed by an overdue break end fires both). Returns the number of
    /// deliveries.
    pub fn poll(&self) -> Result<usize, CoreError> {
        let mut fired = 0;
        while let Some(at_ms) = self.effects.pending_trigger()? {
            if at_ms > now_ms() {
                break;
            }
            // One-shot: the trigger is consumed even if delivery is a no-op.
            self.effects.clear_trigger()?;
            self.deliver_trigger(ALARM_NAME)?;
            fired += 1;
        }
        Ok(fired)
    }

    /// Deadline of the pending trigger, if any (epoch ms).
    pub fn next_deadline(&self) -> Result<Option<i64>, CoreError> {
        self.effects.pending_trigger()
    }

    // ── Rules ────────────────────────────────────────────────────────

    /// Force a rule recompute from the current record.
    pub fn sync_rules(&self) -> Result<(), CoreError> {
        let current = self.store.load_state()?;
        self.effects.sync_rules(&current)
    }

    pub fn installed_rules(&self) -> Result<Vec<BlockRule>, CoreError> {
        self.effects.installed_rules()
    }

    // ── Blocklist and settings ───────────────────────────────────────

    /// Normalize and add a domain, then re-sync rules. Returns the
    /// normalized domain and whether it was newly added.
    pub fn add_domain(&self, raw: &str) -> Result<(String, bool), CoreError> {
        let mut current = self.store.load_state()?;
        let (domain, added) = current.blocklist.insert(raw)?;
        if added {
            self.store.save_state(&current)?;
            self.effects.sync_rules(&current)?;
        }
        Ok((domain, added))
    }

    /// Remove a domain and re-sync rules. Returns whether it was present.
    pub fn remove_domain(&self, raw: &str) -> Result<bool, CoreError> {
        let mut current = self.store.load_state()?;
        let removed = current.blocklist.remove(raw);
        if removed {
            self.store.save_state(&current)?;
            self.effects.sync_rules(&current)?;
        }
        Ok(removed)
    }

    pub fn set_focus_minutes(&self, minutes: u32) -> Result<(), CoreError> {
        self.set_minutes("focus_minutes", minutes, |s, m| s.focus_minutes = m)
    }

    pub fn set_break_minutes(&self, minutes: u32) -> Result<(), CoreError> {
        self.set_minutes("break_minutes", minutes, |s, m| s.break_minutes = m)
    }

    fn set_minutes(
        &self,
        key: &str,
        minutes: u32,
        assign: impl FnOnce(&mut FocusState, u32),
    ) -> Result<(), CoreError> {
        if minutes == 0 {
            return Err(CoreError::InvalidValue {
                key: key.to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let mut current = self.store.load_state()?;
        assign(&mut current, minutes);
        Ok(self.store.save_state(&current)?)
    }

    pub fn set_loop_enabled(&self, enabled: bool) -> Result<(), CoreError> {
        let mut current = self.store.load_state()?;
        current.loop_enabled = enabled;
        Ok(self.store.save_state(&current)?)
    }

    pub fn set_dark_mode(&self, enabled: bool) -> Result<(), CoreError> {
        let mut current = self.store.load_state()?;
        current.dark_mode = enabled;
        Ok(self.store.save_state(&current)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionType;

    fn manager() -> SessionManager {
        let store = Rc::new(Store::open_in_memory().unwrap());
        let effects = EffectRunner::new(
            Box::new(StoredAlarm::new(store.clone())),
            Box::new(SqliteRuleTable::new(store.clone())),
            Box::new(LogNotifier),
            Box::new(LogAudio),
            Config::default(),
        );
        SessionManager::new(store, effects)
    }

    #[test]
    fn start_focus_installs_rules_and_schedules_trigger() {
        let mgr = manager();
        mgr.add_domain("https://www.Example.com/feed").unwrap();

        let state = mgr.start_focus(Some(1)).unwrap();
        assert_eq!(state.session_type, Some(SessionType::Focus));
        assert_eq!(mgr.next_deadline().unwrap(), state.ends_at);

        let rules = mgr.installed_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].url_filter, "example.com");
        assert_eq!(rules[0].redirect_url, "/blocked.html?site=example.com");
    }

    #[test]
    fn stop_focus_clears_rules_and_trigger() {
        let mgr = manager();
        mgr.add_domain("example.com").unwrap();
        mgr.start_focus(Some(5)).unwrap();

        let state = mgr.stop_focus().unwrap();
        assert!(!state.focusing);
        assert_eq!(mgr.next_deadline().unwrap(), None);
        assert!(mgr.installed_rules().unwrap().is_empty());

        // Idempotent.
        let state = mgr.stop_focus().unwrap();
        assert!(!state.focusing);
    }

    #[test]
    fn stale_trigger_delivery_is_ignored() {
        let mgr = manager();
        assert!(!mgr.deliver_trigger(ALARM_NAME).unwrap());
        assert!(!mgr.deliver_trigger("other-alarm").unwrap());
    }

    #[test]
    fn poll_is_a_noop_before_the_deadline() {
        let mgr = manager();
        mgr.start_focus(Some(30)).unwrap();
        assert_eq!(mgr.poll().unwrap(), 0);
        assert_eq!(mgr.state().unwrap().session_type, Some(SessionType::Focus));
    }

    #[test]
    fn blocklist_edit_during_focus_resyncs_rules() {
        let mgr = manager();
        mgr.add_domain("a.com").unwrap();
        mgr.start_focus(Some(5)).unwrap();
        assert_eq!(mgr.installed_rules().unwrap().len(), 1);

        mgr.add_domain("b.com").unwrap();
        assert_eq!(mgr.installed_rules().unwrap().len(), 2);

        assert!(mgr.remove_domain("a.com").unwrap());
        let rules = mgr.installed_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].url_filter, "b.com");
    }

    #[test]
    fn duration_settings_are_validated() {
        let mgr = manager();
        assert!(mgr.set_focus_minutes(0).is_err());
        mgr.set_focus_minutes(50).unwrap();
        mgr.set_break_minutes(10).unwrap();
        let state = mgr.state().unwrap();
        assert_eq!(state.focus_minutes, 50);
        assert_eq!(state.break_minutes, 10);
    }

    #[test]
    fn initialize_is_idempotent_and_syncs_rules() {
        let mgr = manager();
        mgr.initialize().unwrap();
        mgr.initialize().unwrap();
        assert!(mgr.installed_rules().unwrap().is_empty());
    }
}
