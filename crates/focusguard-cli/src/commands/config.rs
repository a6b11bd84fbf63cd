use clap::Subcommand;

const KEYS: [&str; 4] = ["focus-minutes", "break-minutes", "loop-enabled", "dark-mode"];

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a setting value
    Get { key: String },
    /// Change a setting
    Set { key: String, value: String },
    /// Print all settings as JSON
    List,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let svc = super::open_service()?;
    let manager = svc.manager();

    match action {
        ConfigAction::Get { key } => {
            let state = manager.state()?;
            let value = match key.as_str() {
                "focus-minutes" => state.focus_minutes.to_string(),
                "break-minutes" => state.break_minutes.to_string(),
                "loop-enabled" => state.loop_enabled.to_string(),
                "dark-mode" => state.dark_mode.to_string(),
                _ => return Err(unknown_key(&key)),
            };
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            match key.as_str() {
                "focus-minutes" => manager.set_focus_minutes(value.parse()?)?,
                "break-minutes" => manager.set_break_minutes(value.parse()?)?,
                "loop-enabled" => manager.set_loop_enabled(value.parse()?)?,
                "dark-mode" => manager.set_dark_mode(value.parse()?)?,
                _ => return Err(unknown_key(&key)),
            }
            println!("{key} = {value}");
        }
        ConfigAction::List => {
            let state = manager.state()?;
            let settings = serde_json::json!({
                "focus-minutes": state.focus_minutes,
                "break-minutes": state.break_minutes,
                "loop-enabled": state.loop_enabled,
                "dark-mode": state.dark_mode,
            });
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

fn unknown_key(key: &str) -> Box<dyn std::error::Error> {
    format!("unknown config key '{key}' (expected one of: {})", KEYS.join(", ")).into()
}
