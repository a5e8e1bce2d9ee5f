//! traymux CLI binary
//!
//! Manage the services file and run the interactive service menu.

use clap::{Parser, Subcommand};
use cli::commands::{self, ServiceChanges};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{error, info};
use traymux_core::{config, utils, ServiceDefinition, ServiceRegistry};

#[derive(Parser)]
#[command(name = "traymux")]
#[command(about = "Start and stop shell commands as named services")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Services file (defaults to $TRAYMUX_CONFIG or ~/.traymux/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured services
    List,
    /// Add a service
    Add {
        /// Unique service name
        #[arg(long)]
        name: String,
        /// Working directory for the command
        #[arg(long, default_value = "")]
        work_dir: String,
        /// Shell command line to run
        #[arg(long)]
        command: String,
    },
    /// Change a service's name, working directory or command
    Edit {
        /// Service to change
        service: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New working directory
        #[arg(long)]
        work_dir: Option<String>,
        /// New command line
        #[arg(long)]
        command: Option<String>,
    },
    /// Delete a service
    Remove {
        /// Service to delete
        service: String,
    },
    /// Interactive menu: toggle services and watch them exit
    Menu {
        /// Services to start when the menu opens
        #[arg(long = "start", value_name = "NAME")]
        start: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> cli::Result<()> {
    let args = Cli::parse();
    utils::init_tracing(&args.log_level)?;

    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let mut stdout = std::io::stdout();

    match args.command {
        Commands::List => commands::list(&config_path, &mut stdout)?,
        Commands::Add {
            name,
            work_dir,
            command,
        } => {
            commands::add(&config_path, ServiceDefinition::new(name.clone(), work_dir, command))?;
            writeln!(stdout, "Added {name}")?;
        }
        Commands::Edit {
            service,
            name,
            work_dir,
            command,
        } => {
            let changes = ServiceChanges {
                name,
                work_dir,
                command,
            };
            let updated = commands::edit(&config_path, &service, changes)?;
            writeln!(stdout, "Updated {service} -> {}", updated.name)?;
        }
        Commands::Remove { service } => {
            let removed = commands::remove(&config_path, &service)?;
            writeln!(stdout, "Removed {}", removed.name)?;
        }
        Commands::Menu { start } => {
            let file = config::load_or_create(&config_path)?;
            let registry = ServiceRegistry::from_file(&file)?;
            info!(
                "Loaded {} services from {}",
                registry.len(),
                config_path.display()
            );

            for name in &start {
                if let Err(e) = registry.start(name).await {
                    error!("Error starting service {}: {}", name, e);
                }
            }

            let input = BufReader::new(tokio::io::stdin());
            let mut output = tokio::io::stdout();
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    std::future::pending::<()>().await;
                }
                info!("Received Ctrl+C, shutting down...");
            };
            cli::run_menu(&registry, input, &mut output, shutdown).await?;
        }
    }

    Ok(())
}
