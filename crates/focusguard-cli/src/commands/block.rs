use clap::Subcommand;

#[derive(Subcommand)]
pub enum BlockAction {
    /// Add a site to the blocklist (normalized to a bare domain)
    Add {
        /// Site to block, e.g. "https://www.example.com/feed"
        domain: String,
    },
    /// Remove a site from the blocklist
    Remove { domain: String },
    /// List blocked domains
    List {
        /// Output as a JSON array
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: BlockAction) -> Result<(), Box<dyn std::error::Error>> {
    let svc = super::open_service()?;
    let manager = svc.manager();

    match action {
        BlockAction::Add { domain } => {
            let (normalized, added) = manager.add_domain(&domain)?;
            if added {
                println!("Added {normalized}");
            } else {
                println!("{normalized} is already in the blocklist");
            }
        }
        BlockAction::Remove { domain } => {
            if manager.remove_domain(&domain)? {
                println!("Removed {domain}");
            } else {
                println!("{domain} is not in the blocklist");
            }
        }
        BlockAction::List { json } => {
            let state = manager.state()?;
            if json {
                println!("{}", serde_json::to_string(state.blocklist.domains())?);
            } else {
                for domain in state.blocklist.domains() {
                    println!("{domain}");
                }
            }
        }
    }

    Ok(())
}
