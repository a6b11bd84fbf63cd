//! Side-effect execution for session transitions.
//!
//! The state machine emits [`Effect`] lists; the runner executes them
//! against the external collaborators. Session bookkeeping effects (rule
//! sync, trigger scheduling) propagate failures to the caller; audio and
//! notification effects are fire-and-forget, logged and swallowed, so a
//! broken speaker never rolls back a transition.

use std::error::Error;

use tracing::warn;

use crate::alarm::AlarmScheduler;
use crate::error::CoreError;
use crate::rules::{self, RuleTable};
use crate::session::{Effect, FocusState, ALARM_NAME};
use crate::storage::Config;

/// User-visible notification surface.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), Box<dyn Error>>;

    /// Short attention chime.
    fn chime(&self) -> Result<(), Box<dyn Error>>;
}

/// Looping ambient audio surface, active while a focus session runs.
pub trait AudioSink {
    fn start_ambient(&self) -> Result<(), Box<dyn Error>>;
    fn stop_ambient(&self) -> Result<(), Box<dyn Error>>;
}

/// Notifier that writes to the log. Desktop notification backends are out
/// of scope; this keeps the dispatch path observable.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<(), Box<dyn Error>> {
        tracing::info!(title, message, "notification");
        Ok(())
    }

    fn chime(&self) -> Result<(), Box<dyn Error>> {
        tracing::info!("chime");
        Ok(())
    }
}

/// Audio sink that writes to the log.
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn start_ambient(&self) -> Result<(), Box<dyn Error>> {
        tracing::info!("ambient audio started");
        Ok(())
    }

    fn stop_ambient(&self) -> Result<(), Box<dyn Error>> {
        tracing::info!("ambient audio stopped");
        Ok(())
    }
}

/// Executes transition effects against the external collaborators.
pub struct EffectRunner {
    alarm: Box<dyn AlarmScheduler>,
    rules: Box<dyn RuleTable>,
    notifier: Box<dyn Notifier>,
    audio: Box<dyn AudioSink>,
    prefs: Config,
}

impl EffectRunner {
    pub fn new(
        alarm: Box<dyn AlarmScheduler>,
        rules: Box<dyn RuleTable>,
        notifier: Box<dyn Notifier>,
        audio: Box<dyn AudioSink>,
        prefs: Config,
    ) -> Self {
        Self { alarm, rules, notifier, audio, prefs }
    }

    /// Run all effects in order against `state` (the already-persisted
    /// post-transition record).
    ///
    /// # Errors
    /// Propagates rule-table and trigger-scheduling failures; audio and
    /// notification failures are logged and swallowed.
    pub fn run(&self, state: &FocusState, effects: &[Effect]) -> Result<(), CoreError> {
        for effect in effects {
            match effect {
                Effect::SyncRules => self.sync_rules(state)?,
                Effect::ScheduleTrigger { at_ms } => {
                    // Clear-then-schedule: never two pending deliveries.
                    self.alarm.clear(ALARM_NAME)?;
                    self.alarm.schedule(ALARM_NAME, *at_ms)?;
                }
                Effect::ClearTrigger => self.alarm.clear(ALARM_NAME)?,
                Effect::StartAmbient => {
                    if self.prefs.audio.ambient {
                        if let Err(e) = self.audio.start_ambient() {
                            warn!(error = %e, "failed to start ambient audio");
                        }
                    }
                }
                Effect::StopAmbient => {
                    if let Err(e) = self.audio.stop_ambient() {
                        warn!(error = %e, "failed to stop ambient audio");
                    }
                }
                Effect::Chime => {
                    if self.prefs.notifications.chime {
                        if let Err(e) = self.notifier.chime() {
                            warn!(error = %e, "failed to play chime");
                        }
                    }
                }
                Effect::Notify { title, message } => {
                    if self.prefs.notifications.enabled {
                        if let Err(e) = self.notifier.notify(title, message) {
                            warn!(error = %e, "failed to show notification");
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Recompute the ruleset from `state` and replace the owned range.
    pub fn sync_rules(&self, state: &FocusState) -> Result<(), CoreError> {
        let computed = rules::compute_rules_for(state);
        rules::sync(self.rules.as_ref(), &computed)?;
        Ok(())
    }

    pub fn installed_rules(&self) -> Result<Vec<crate::rules::BlockRule>, CoreError> {
        Ok(self.rules.installed()?)
    }

    pub fn pending_trigger(&self) -> Result<Option<i64>, CoreError> {
        Ok(self.alarm.pending(ALARM_NAME)?)
    }

    pub fn clear_trigger(&self) -> Result<(), CoreError> {
        Ok(self.alarm.clear(ALARM_NAME)?)
    }
}
