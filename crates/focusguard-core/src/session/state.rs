//! Pure session state machine.
//!
//! The machine is a wall-clock-based three-state automaton:
//!
//! ```text
//! Idle -> Focusing -> OnBreak -> (Focusing | Idle)
//! ```
//!
//! Transitions are pure: each operation maps the persisted record plus a
//! wall-clock time to the next record and a list of intended side effects.
//! Executing those effects (rule sync, trigger scheduling, audio,
//! notifications) is the job of [`crate::effects::EffectRunner`], so the
//! transition logic stays testable without any external surface.

use serde::{Deserialize, Serialize};

use crate::blocklist::Blocklist;

/// Name of the single session-end trigger. Trigger deliveries carrying any
/// other name are ignored.
pub const ALARM_NAME: &str = "focus-end";

pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

const MINUTE_MS: i64 = 60_000;

/// Kind of the currently active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Focus,
    Break,
}

/// The single persisted record. Owned by the session manager; everything
/// else reads snapshots or sends commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusState {
    pub blocklist: Blocklist,
    /// A session (focus or break) is currently active.
    pub focusing: bool,
    /// Current session kind; `None` iff `!focusing`.
    pub session_type: Option<SessionType>,
    /// Scheduled end of the current session (epoch ms); `None` iff `!focusing`.
    pub ends_at: Option<i64>,
    pub focus_minutes: u32,
    pub break_minutes: u32,
    /// Whether break end auto-restarts the next focus session.
    pub loop_enabled: bool,
    /// UI-only flag, persisted alongside the rest of the record.
    pub dark_mode: bool,
}

impl Default for FocusState {
    fn default() -> Self {
        Self {
            blocklist: Blocklist::new(),
            focusing: false,
            session_type: None,
            ends_at: None,
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            loop_enabled: false,
            dark_mode: false,
        }
    }
}

impl FocusState {
    /// Blocking is enforced only during an active focus session with a
    /// non-empty blocklist.
    pub fn blocking_active(&self) -> bool {
        self.focusing
            && self.session_type == Some(SessionType::Focus)
            && !self.blocklist.is_empty()
    }

    fn enter(&mut self, session: SessionType, ends_at: i64) {
        self.focusing = true;
        self.session_type = Some(session);
        self.ends_at = Some(ends_at);
    }

    fn clear_session(&mut self) {
        self.focusing = false;
        self.session_type = None;
        self.ends_at = None;
    }
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Clear any pending trigger, then schedule one at the given time.
    ScheduleTrigger { at_ms: i64 },
    /// Clear any pending trigger without rescheduling.
    ClearTrigger,
    /// Recompute and reinstall the blocking ruleset.
    SyncRules,
    StartAmbient,
    StopAmbient,
    Chime,
    Notify { title: String, message: String },
}

/// Result of a transition: the record to persist and the effects to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: FocusState,
    pub effects: Vec<Effect>,
}

/// Start a focus session, overriding any session in progress.
///
/// `minutes` falls back to the configured focus duration and is clamped to
/// at least one minute.
pub fn start_focus(state: &FocusState, minutes: Option<u32>, now_ms: i64) -> Transition {
    let minutes = minutes.unwrap_or(state.focus_minutes).max(1);
    let ends_at = now_ms + i64::from(minutes) * MINUTE_MS;
    let mut next = state.clone();
    next.enter(SessionType::Focus, ends_at);
    Transition {
        next,
        effects: vec![
            Effect::ScheduleTrigger { at_ms: ends_at },
            Effect::SyncRules,
            Effect::StartAmbient,
        ],
    }
}

/// Return to idle. Idempotent: from idle this only re-syncs rules.
pub fn stop_focus(state: &FocusState) -> Transition {
    let mut next = state.clone();
    next.clear_session();
    Transition {
        next,
        effects: vec![Effect::StopAmbient, Effect::ClearTrigger, Effect::SyncRules],
    }
}

/// Handle a fired trigger.
///
/// Returns `None` when the delivery is ignored: a trigger with the wrong
/// name, or one arriving after the session was already stopped.
pub fn trigger_fired(state: &FocusState, alarm: &str, now_ms: i64) -> Option<Transition> {
    if alarm != ALARM_NAME || !state.focusing {
        return None;
    }
    match state.session_type {
        Some(SessionType::Focus) => Some(focus_ended(state, now_ms)),
        Some(SessionType::Break) => Some(break_ended(state, now_ms)),
        None => None,
    }
}

fn focus_ended(state: &FocusState, now_ms: i64) -> Transition {
    let break_minutes = state.break_minutes.max(1);
    let ends_at = now_ms + i64::from(break_minutes) * MINUTE_MS;
    let mut next = state.clone();
    next.enter(SessionType::Break, ends_at);
    Transition {
        next,
        effects: vec![
            Effect::StopAmbient,
            Effect::SyncRules,
            Effect::ScheduleTrigger { at_ms: ends_at },
            Effect::Chime,
            Effect::Notify {
                title: "☕ Time for a break!".to_string(),
                message: format!("Great focus session! Take a {break_minutes}-minute break."),
            },
        ],
    }
}

fn break_ended(state: &FocusState, now_ms: i64) -> Transition {
    if state.loop_enabled {
        let ends_at = now_ms + i64::from(state.focus_minutes.max(1)) * MINUTE_MS;
        let mut next = state.clone();
        next.enter(SessionType::Focus, ends_at);
        Transition {
            next,
            effects: vec![
                Effect::ScheduleTrigger { at_ms: ends_at },
                Effect::SyncRules,
                Effect::StartAmbient,
                Effect::Chime,
                Effect::Notify {
                    title: "🔥 Ready to focus again!".to_string(),
                    message: "Starting next focus session. Let's do this!".to_string(),
                },
            ],
        }
    } else {
        let mut next = state.clone();
        next.clear_session();
        Transition {
            next,
            effects: vec![
                Effect::ClearTrigger,
                Effect::SyncRules,
                Effect::Chime,
                Effect::Notify {
                    title: "✓ Session completed!".to_string(),
                    message: "Great work! You can start a new session anytime.".to_string(),
                },
            ],
        }
    }
}
