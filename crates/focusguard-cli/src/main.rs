use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusguard", version, about = "FocusGuard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Blocklist management
    Block {
        #[command(subcommand)]
        action: commands::block::BlockAction,
    },
    /// Blocking rule inspection
    Rules {
        #[command(subcommand)]
        action: commands::rules::RulesAction,
    },
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Send a raw JSON message to the service
    Msg {
        /// JSON message, e.g. '{"type":"GET_STATE"}'
        message: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Block { action } => commands::block::run(action),
        Commands::Rules { action } => commands::rules::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Msg { message } => commands::msg::run(&message),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
