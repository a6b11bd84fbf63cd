//! # FocusGuard Core Library
//!
//! Core business logic for FocusGuard, a focus-session timer that blocks a
//! user-defined list of websites while a focus period runs, alternates with
//! break periods, and optionally loops. The CLI binary is a thin layer over
//! this crate.
//!
//! ## Architecture
//!
//! - **Session state machine**: pure transitions over a single persisted
//!   record (Idle → Focusing → OnBreak), each returning the next record
//!   plus a list of intended side effects
//! - **Rule synchronizer**: pure projection of (blocklist, session state)
//!   into the blocking ruleset, installed by full replace of a reserved
//!   identifier range
//! - **Storage**: SQLite-backed key-value record and rule table, TOML-based
//!   ambient preferences
//! - **Effects**: fire-and-forget notification/audio dispatch behind traits
//!
//! ## Key Components
//!
//! - [`SessionManager`]: owns the persisted record, exposes transitions
//! - [`Service`]: JSON message handler over the manager
//! - [`Store`]: persistence layer
//! - [`compute_rules`]: blocklist → ruleset projection

pub mod alarm;
pub mod blocklist;
pub mod effects;
pub mod error;
pub mod protocol;
pub mod rules;
pub mod session;
pub mod storage;

pub use alarm::{AlarmScheduler, StoredAlarm};
pub use blocklist::{normalize_domain, Blocklist};
pub use effects::{AudioSink, EffectRunner, LogAudio, LogNotifier, Notifier};
pub use error::{ConfigError, CoreError, StorageError};
pub use protocol::{Command, Response, Service, StateView};
pub use rules::{compute_rules, BlockRule, RuleTable, RULE_BASE, RULE_RANGE};
pub use session::{FocusState, SessionManager, SessionType, ALARM_NAME};
pub use storage::{Config, SqliteRuleTable, Store};
