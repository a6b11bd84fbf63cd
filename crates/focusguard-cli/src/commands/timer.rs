use clap::Subcommand;
use focusguard_core::protocol::Command;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus session (overrides any session in progress)
    Start {
        /// Session length; defaults to the configured focus duration
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Stop the current session
    Stop,
    /// Deliver any due trigger, then print the current state as JSON
    Status,
    /// Run in the foreground, delivering triggers as they come due
    Watch,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let svc = super::open_service()?;

    match action {
        TimerAction::Start { minutes } => {
            let response = svc.handle(Command::StartFocus { minutes });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        TimerAction::Stop => {
            let response = svc.handle(Command::StopFocus);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        TimerAction::Status => {
            // The CLI has no resident process, so due transitions are
            // applied when somebody looks.
            svc.manager().poll()?;
            let response = svc.handle(Command::GetState);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        TimerAction::Watch => watch(svc)?,
    }

    Ok(())
}

/// Foreground trigger loop: sleep until the pending deadline (re-reading it
/// every cycle so edits from another invocation are picked up), deliver,
/// and print the resulting state. Ctrl-C exits.
fn watch(svc: focusguard_core::Service) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(async move {
        loop {
            let fired = svc.manager().poll()?;
            if fired > 0 {
                let response = svc.handle(Command::GetState);
                println!("{}", serde_json::to_string(&response)?);
            }

            let now = chrono::Utc::now().timestamp_millis();
            let sleep_ms = match svc.manager().next_deadline()? {
                Some(at_ms) => (at_ms - now).clamp(250, 30_000) as u64,
                None => 1_000,
            };

            tokio::select! {
                () = tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)) => {}
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        Ok(())
    })
}
