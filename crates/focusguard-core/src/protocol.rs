//! JSON message protocol.
//!
//! The command surface of the background service: `type`-tagged JSON
//! requests with `{ ok, ... }` responses. A [`Service`] handles one
//! message per call against freshly read persisted state; nothing is
//! cached between calls, so a recycled process behaves identically.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::session::{FocusState, SessionManager, SessionType};

pub const ERR_UNKNOWN_MESSAGE: &str = "UNKNOWN_MESSAGE";

/// Commands accepted by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    #[serde(rename = "GET_STATE")]
    GetState,
    #[serde(rename = "START_FOCUS")]
    StartFocus {
        #[serde(default)]
        minutes: Option<u32>,
    },
    #[serde(rename = "STOP_FOCUS")]
    StopFocus,
    #[serde(rename = "SYNC_RULES")]
    SyncRules,
}

/// The state subset exposed to UI surfaces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub blocklist: Vec<String>,
    pub focusing: bool,
    pub ends_at: Option<i64>,
    pub session_type: Option<SessionType>,
}

impl From<&FocusState> for StateView {
    fn from(state: &FocusState) -> Self {
        Self {
            blocklist: state.blocklist.domains().to_vec(),
            focusing: state.focusing,
            ends_at: state.ends_at,
            session_type: state.session_type,
        }
    }
}

/// Responses, all carrying an `ok` flag.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    State {
        ok: bool,
        state: StateView,
    },
    #[serde(rename_all = "camelCase")]
    Started {
        ok: bool,
        ends_at: i64,
    },
    Ack {
        ok: bool,
    },
    Error {
        ok: bool,
        error: String,
    },
}

impl Response {
    fn error(error: impl Into<String>) -> Self {
        Response::Error { ok: false, error: error.into() }
    }

    fn from_result<T>(result: Result<T, CoreError>, map: impl FnOnce(T) -> Response) -> Response {
        match result {
            Ok(value) => map(value),
            Err(e) => Response::error(e.to_string()),
        }
    }
}

/// Stateless request handler over the session manager.
pub struct Service {
    manager: SessionManager,
}

impl Service {
    pub fn new(manager: SessionManager) -> Self {
        Self { manager }
    }

    /// Open the default service over the on-disk store, running the
    /// first-install repair if needed.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or initialized.
    pub fn open() -> Result<Self, CoreError> {
        let manager = SessionManager::open()?;
        manager.initialize()?;
        Ok(Self::new(manager))
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn handle(&self, command: Command) -> Response {
        match command {
            Command::GetState => Response::from_result(self.manager.state(), |state| {
                Response::State { ok: true, state: StateView::from(&state) }
            }),
            Command::StartFocus { minutes } => {
                Response::from_result(self.manager.start_focus(minutes), |state| {
                    Response::Started { ok: true, ends_at: state.ends_at.unwrap_or_default() }
                })
            }
            Command::StopFocus => {
                Response::from_result(self.manager.stop_focus(), |_| Response::Ack { ok: true })
            }
            Command::SyncRules => {
                Response::from_result(self.manager.sync_rules(), |()| Response::Ack { ok: true })
            }
        }
    }

    /// Handle a raw JSON message. Anything that does not parse into a
    /// known command yields the structured `UNKNOWN_MESSAGE` failure
    /// rather than an error.
    pub fn handle_value(&self, message: &Value) -> Response {
        match serde_json::from_value::<Command>(message.clone()) {
            Ok(command) => self.handle(command),
            Err(_) => Response::error(ERR_UNKNOWN_MESSAGE),
        }
    }

    /// Handle a raw JSON string, returning the serialized response.
    pub fn handle_json(&self, raw: &str) -> String {
        let response = match serde_json::from_str::<Value>(raw) {
            Ok(message) => self.handle_value(&message),
            Err(_) => Response::error(ERR_UNKNOWN_MESSAGE),
        };
        serde_json::to_string(&response)
            .unwrap_or_else(|_| format!(r#"{{"ok":false,"error":"{ERR_UNKNOWN_MESSAGE}"}}"#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::alarm::StoredAlarm;
    use crate::effects::{EffectRunner, LogAudio, LogNotifier};
    use crate::storage::{Config, SqliteRuleTable, Store};

    fn service() -> Service {
        let store = Rc::new(Store::open_in_memory().unwrap());
        let effects = EffectRunner::new(
            Box::new(StoredAlarm::new(store.clone())),
            Box::new(SqliteRuleTable::new(store.clone())),
            Box::new(LogNotifier),
            Box::new(LogAudio),
            Config::default(),
        );
        Service::new(SessionManager::new(store, effects))
    }

    #[test]
    fn unknown_message_type_yields_structured_error() {
        let svc = service();
        let out = svc.handle_json(r#"{"type":"SELF_DESTRUCT"}"#);
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"], "UNKNOWN_MESSAGE");
    }

    #[test]
    fn malformed_json_yields_structured_error() {
        let svc = service();
        let out = svc.handle_json("{not json");
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["error"], "UNKNOWN_MESSAGE");
    }

    #[test]
    fn get_state_returns_wire_shape() {
        let svc = service();
        let out = svc.handle_json(r#"{"type":"GET_STATE"}"#);
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["ok"], true);
        assert_eq!(v["state"]["focusing"], false);
        assert!(v["state"]["endsAt"].is_null());
        assert!(v["state"]["sessionType"].is_null());
        assert!(v["state"]["blocklist"].as_array().unwrap().is_empty());
    }

    #[test]
    fn start_focus_reports_ends_at() {
        let svc = service();
        let out = svc.handle_json(r#"{"type":"START_FOCUS","minutes":2}"#);
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["ok"], true);
        assert!(v["endsAt"].as_i64().unwrap() > 0);

        let out = svc.handle_json(r#"{"type":"GET_STATE"}"#);
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["state"]["sessionType"], "focus");
    }

    #[test]
    fn stop_focus_acks_even_when_idle() {
        let svc = service();
        let out = svc.handle_json(r#"{"type":"STOP_FOCUS"}"#);
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["ok"], true);
        let out = svc.handle_json(r#"{"type":"STOP_FOCUS"}"#);
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["ok"], true);
    }

    #[test]
    fn sync_rules_acks() {
        let svc = service();
        let out = svc.handle_json(r#"{"type":"SYNC_RULES"}"#);
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["ok"], true);
    }
}
