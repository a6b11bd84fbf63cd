use clap::Subcommand;
use focusguard_core::protocol::Command;

#[derive(Subcommand)]
pub enum RulesAction {
    /// Force a rule recompute from the current state
    Sync,
    /// Print the installed blocking rules as JSON
    List,
}

pub fn run(action: RulesAction) -> Result<(), Box<dyn std::error::Error>> {
    let svc = super::open_service()?;

    match action {
        RulesAction::Sync => {
            let response = svc.handle(Command::SyncRules);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        RulesAction::List => {
            let rules = svc.manager().installed_rules()?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
    }

    Ok(())
}
