mod commands;
mod config;
mod contracts;
mod ledger;
mod project;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{Command, Context};
use config::AppConfig;
use ledger::Ledger;
use project::ProjectType;

#[derive(Parser, Debug)]
#[command(name = "solscribe")]
#[command(about = "Deploy, register and call Solidity contracts through a deployment ledger")]
#[command(version)]
struct Cli {
    /// Path to the project directory
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Skip project detection and force a specific project type
    #[arg(long, global = true, value_parser = ["foundry", "hardhat"])]
    project_type: Option<String>,

    /// Network to use (defaults to the configured default, then localhost)
    #[arg(long, global = true, env = "SOLSCRIBE_NETWORK")]
    network: Option<String>,

    /// Ledger file (defaults to deployments.json in the project directory)
    #[arg(long, global = true, env = "SOLSCRIBE_LEDGER")]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    // Logs go to stderr, stdout carries only the JSON result
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let project_root = cli.project.canonicalize().unwrap_or(cli.project);

    let config = AppConfig::load(&project_root)?;
    match config.config_path() {
        Some(path) => tracing::debug!("Config path: {:?}", path),
        None => tracing::debug!("No config file, using built-in networks"),
    }

    let ledger = match cli.ledger {
        Some(path) => Ledger::new(path),
        None => Ledger::in_dir(&project_root),
    };

    let project_type = match cli.project_type.as_deref() {
        Some("foundry") => Some(ProjectType::Foundry),
        Some("hardhat") => Some(ProjectType::Hardhat),
        _ => None,
    };

    let ctx = Context {
        project_root,
        project_type,
        config,
        network_override: cli.network,
        ledger,
    };

    commands::run(&ctx, cli.command).await
}
