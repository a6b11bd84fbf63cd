mod config;
mod store;

pub use config::Config;
pub use store::{SqliteRuleTable, Store};

use std::path::PathBuf;

/// Returns the data directory, `~/.config/focusguard[-dev]/`.
///
/// `FOCUSGUARD_DATA_DIR` overrides the location entirely (used by tests);
/// `FOCUSGUARD_ENV=dev` switches to the development directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = if let Ok(dir) = std::env::var("FOCUSGUARD_DATA_DIR") {
        PathBuf::from(dir)
    } else {
        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config");
        let env = std::env::var("FOCUSGUARD_ENV").unwrap_or_else(|_| "production".to_string());
        if env == "dev" {
            base_dir.join("focusguard-dev")
        } else {
            base_dir.join("focusguard")
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
