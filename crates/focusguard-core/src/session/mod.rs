mod manager;
mod state;

pub use manager::SessionManager;
pub use state::{
    start_focus, stop_focus, trigger_fired, Effect, FocusState, SessionType, Transition,
    ALARM_NAME, DEFAULT_BREAK_MINUTES, DEFAULT_FOCUS_MINUTES,
};
