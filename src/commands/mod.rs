pub mod deploy;
pub mod import;
pub mod interact;
pub mod list;
mod output;

use std::path::PathBuf;

use clap::Subcommand;
use eyre::{Result, eyre};

use crate::config::{AppConfig, ResolvedNetwork};
use crate::contracts::ContractCaller;
use crate::ledger::{Ledger, is_valid_address};
use crate::project::{self, Project, ProjectType};

pub use output::emit;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile and deploy a contract, then record it in the ledger
    Deploy(deploy::DeployArgs),
    /// Register an existing contract from a JSON ABI file
    ImportAbi(import::ImportAbiArgs),
    /// Register an existing contract from its Solidity source
    ImportCode(import::ImportCodeArgs),
    /// Call a function on a recorded contract with JSON-encoded arguments
    Interact(interact::InteractArgs),
    /// Call a function on a recorded contract with positional arguments
    Call(interact::CallArgs),
    /// Print every ledger entry
    List,
}

/// Everything a command needs from the environment
pub struct Context {
    pub project_root: PathBuf,
    pub project_type: Option<ProjectType>,
    pub config: AppConfig,
    /// Network requested with `--network`, if any
    pub network_override: Option<String>,
    pub ledger: Ledger,
}

impl Context {
    /// Detect (or load the forced type of) the project
    pub fn project(&self) -> Result<Project> {
        match self.project_type {
            Some(ProjectType::Foundry) => Project::new_foundry(&self.project_root),
            Some(ProjectType::Hardhat) => Project::new_hardhat(&self.project_root),
            None => project::detect(&self.project_root),
        }
    }

    /// The network this invocation talks to
    pub fn network(&self) -> Result<ResolvedNetwork> {
        self.config.get_network(self.network_override.as_deref())
    }

    /// Network for an existing record: `--network` wins, else the one it was recorded on
    pub fn network_for(&self, recorded: &str) -> Result<ResolvedNetwork> {
        self.config
            .get_network(Some(self.network_override.as_deref().unwrap_or(recorded)))
    }

    /// Caller for a network, signing with its wallet when one is configured
    pub fn caller(&self, network: &ResolvedNetwork) -> Result<ContractCaller> {
        let caller = ContractCaller::new(&network.rpc_url).with_chain_id(network.chain_id);

        match self.config.wallet_for(network) {
            Some(wallet) => {
                let key = self
                    .config
                    .resolve_wallet_key(&wallet)?
                    .ok_or_else(|| eyre!("Private key not found for wallet: {}", wallet))?;
                let label = self
                    .config
                    .wallets
                    .get(&wallet)
                    .and_then(|w| w.label.as_deref())
                    .unwrap_or(&wallet);
                tracing::debug!("Using wallet '{}' on {}", label, network.name);
                caller.with_signer(key)
            }
            None => Ok(caller),
        }
    }
}

/// Reject anything that is not `0x` followed by 40 hex digits
pub fn check_address(address: &str) -> Result<()> {
    if is_valid_address(address) {
        Ok(())
    } else {
        Err(eyre!(
            "Invalid contract address '{}': expected 0x followed by 40 hex characters",
            address
        ))
    }
}

/// Run one command and print its JSON summary
pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Deploy(args) => emit(&deploy::run(ctx, &args).await?),
        Command::ImportAbi(args) => emit(&import::run_abi(ctx, &args).await?),
        Command::ImportCode(args) => emit(&import::run_code(ctx, &args).await?),
        Command::Interact(args) => interact::execute(ctx, args.into()).await,
        Command::Call(args) => interact::execute(ctx, args.into()).await,
        Command::List => emit(&list::run(ctx)?),
    }
}
