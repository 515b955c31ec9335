//! forge - project request lifecycle runner
//!
//! Replays JSON scenarios against a fresh in-memory store and validates
//! configuration files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forge_core::{ForgeConfig, LogConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod scenario;

use scenario::{Runner, Scenario};

/// forge - project request lifecycle runner
#[derive(Parser, Debug)]
#[command(name = "forge")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a scenario and print each step's outcome
    Run {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file
    CheckConfig {
        /// Configuration TOML file
        path: PathBuf,
    },
}

fn init_logging(config: &LogConfig) {
    // RUST_LOG wins over the configured directive
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<ForgeConfig> {
    match path {
        Some(path) => ForgeConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ForgeConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { scenario, json } => {
            let config = load_config(cli.config.as_ref())?;
            init_logging(&config.log);

            let scenario = Scenario::load(&scenario)?;
            tracing::info!(
                users = scenario.users.len(),
                steps = scenario.steps.len(),
                "replaying scenario"
            );

            let outcomes = Runner::new(config).run(scenario).await?;
            let failed = outcomes.iter().filter(|o| !o.is_ok()).count();

            if json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for outcome in &outcomes {
                    println!("{outcome}");
                }
                println!();
                println!("{} steps, {failed} failed", outcomes.len());
            }
            Ok(())
        }
        Commands::CheckConfig { path } => {
            let config = ForgeConfig::load(&path)
                .with_context(|| format!("invalid config {}", path.display()))?;
            println!("{} is valid", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
