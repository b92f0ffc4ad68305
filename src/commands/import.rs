use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use clap::Args;
use eyre::{Result, WrapErr, eyre};
use serde::Serialize;
use serde_json::Value;

use super::{Context, check_address};
use crate::contracts::ContractCaller;
use crate::contracts::abi::{parse_abi, probe_function, read_abi_file};
use crate::ledger::{DeploymentRecord, DeploymentType};
use crate::project::{self, Artifact};

#[derive(Args, Debug)]
pub struct ImportAbiArgs {
    /// Address the contract is deployed at
    #[arg(long, env = "CONTRACT_ADDRESS")]
    pub address: String,

    /// Name to record the contract under
    #[arg(long, env = "CONTRACT_NAME")]
    pub name: String,

    /// JSON ABI file, or a Foundry/Hardhat artifact
    #[arg(long, env = "ABI_FILE")]
    pub abi: PathBuf,

    /// Network the contract lives on (defaults to the active network)
    #[arg(long, env = "NETWORK_DEPLOYED")]
    pub network_deployed: Option<String>,

    /// Don't check that the contract answers a read-only call
    #[arg(long)]
    pub skip_probe: bool,
}

#[derive(Args, Debug)]
pub struct ImportCodeArgs {
    /// Address the contract is deployed at
    #[arg(long, env = "CONTRACT_ADDRESS")]
    pub address: String,

    /// Contract name inside the source file
    #[arg(long, env = "CONTRACT_NAME")]
    pub name: String,

    /// Solidity source file declaring the contract
    #[arg(long, env = "SOURCE_FILE")]
    pub source: PathBuf,

    /// Network the contract lives on
    #[arg(long, env = "NETWORK_DEPLOYED")]
    pub network_deployed: String,

    /// Don't check that the contract answers a read-only call
    #[arg(long)]
    pub skip_probe: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub success: bool,
    pub contract_name: String,
    pub contract_address: String,
    pub network: String,
    pub deployment_type: DeploymentType,
    /// Number of functions the ABI declares
    pub functions: usize,
    /// Probe outcome, `None` when no probe ran
    pub accessible: Option<bool>,
    pub timestamp: String,
}

struct ImportedContract {
    name: String,
    address: Address,
    network: String,
    abi_value: Value,
    abi: JsonAbi,
    deployment_type: DeploymentType,
    source_path: String,
}

pub async fn run_abi(ctx: &Context, args: &ImportAbiArgs) -> Result<ImportSummary> {
    check_address(&args.address)?;

    let abi_value = read_abi_file(&args.abi)?;
    let abi = parse_abi(&abi_value)
        .wrap_err_with(|| format!("Invalid ABI in {:?}", args.abi))?;

    let network = match &args.network_deployed {
        Some(name) => name.clone(),
        None => ctx.network()?.name,
    };

    let contract = ImportedContract {
        name: args.name.clone(),
        address: parse_address(&args.address)?,
        network,
        abi_value,
        abi,
        deployment_type: DeploymentType::ExternalAbi,
        source_path: args.abi.display().to_string(),
    };

    register(ctx, contract, args.skip_probe).await
}

pub async fn run_code(ctx: &Context, args: &ImportCodeArgs) -> Result<ImportSummary> {
    check_address(&args.address)?;

    let project = ctx.project()?;
    let source = project.resolve_source(&args.source);
    check_source(&source)?;

    let output = project::compile(&project).await?;
    if !output.stderr.trim().is_empty() {
        tracing::warn!("Compiler reported:\n{}", output.stderr.trim());
    }

    let artifact = Artifact::find(&project, &source, &args.name)?;
    let abi = parse_abi(&artifact.abi)
        .wrap_err_with(|| format!("Invalid ABI in {:?}", artifact.path))?;

    let contract = ImportedContract {
        name: args.name.clone(),
        address: parse_address(&args.address)?,
        network: args.network_deployed.clone(),
        abi_value: artifact.abi,
        abi,
        deployment_type: DeploymentType::ExternalCode,
        source_path: project.relative_source(&source).display().to_string(),
    };

    register(ctx, contract, args.skip_probe).await
}

fn parse_address(address: &str) -> Result<Address> {
    address
        .parse()
        .wrap_err_with(|| format!("Invalid contract address '{}'", address))
}

fn check_source(source: &Path) -> Result<()> {
    if !source.exists() {
        return Err(eyre!("Source file not found: {:?}", source));
    }
    if source.extension().and_then(|e| e.to_str()) != Some("sol") {
        return Err(eyre!("Source file must be a .sol file: {:?}", source));
    }
    Ok(())
}

/// Probe the contract, then write its ledger record
async fn register(
    ctx: &Context,
    contract: ImportedContract,
    skip_probe: bool,
) -> Result<ImportSummary> {
    let accessible = if skip_probe {
        None
    } else {
        probe(ctx, &contract.abi, contract.address, &contract.network).await
    };

    let record = DeploymentRecord::new(
        &contract.network,
        &contract.name,
        &contract.address.to_string(),
        contract.deployment_type,
    )
    .with_source_path(contract.source_path)
    .with_abi(contract.abi_value);
    let timestamp = record.timestamp.clone();

    ctx.ledger.write(&contract.address.to_string(), record)?;
    tracing::info!(
        "Recorded {} at {} on {}",
        contract.name,
        contract.address,
        contract.network
    );

    Ok(ImportSummary {
        success: true,
        contract_name: contract.name,
        contract_address: contract.address.to_checksum(None),
        network: contract.network,
        deployment_type: contract.deployment_type,
        functions: contract.abi.functions().count(),
        accessible,
        timestamp,
    })
}

/// Call the first parameterless read-only function; never fails the import
async fn probe(ctx: &Context, abi: &JsonAbi, address: Address, network: &str) -> Option<bool> {
    let Some(function) = probe_function(abi) else {
        tracing::debug!("No parameterless view function to probe {}", address);
        return None;
    };

    let resolved = match ctx.config.get_network(Some(network)) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!("Skipping accessibility check: {}", e);
            return None;
        }
    };

    match ContractCaller::new(&resolved.rpc_url)
        .call_read(address, function, &[])
        .await
    {
        Ok(_) => {
            tracing::info!("Contract at {} answered {}", address, function.signature());
            Some(true)
        }
        Err(e) => {
            tracing::warn!(
                "Contract at {} did not answer {} on {}: {:#}",
                address,
                function.signature(),
                resolved.name,
                e
            );
            Some(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::commands::tests::context;
    use crate::contracts::abi::tests::token_abi;

    const TOKEN: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn abi_args(abi: PathBuf) -> ImportAbiArgs {
        ImportAbiArgs {
            address: TOKEN.to_string(),
            name: "Token".to_string(),
            abi,
            network_deployed: Some("localhost".to_string()),
            skip_probe: true,
        }
    }

    #[tokio::test]
    async fn test_import_abi_records_contract() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let abi_path = dir.path().join("Token.abi.json");
        std::fs::write(&abi_path, token_abi().to_string()).unwrap();

        let summary = run_abi(&ctx, &abi_args(abi_path.clone())).await.unwrap();
        assert_eq!(summary.deployment_type, DeploymentType::ExternalAbi);
        assert_eq!(summary.functions, 3);
        assert_eq!(summary.accessible, None);

        let record = ctx.ledger.get(TOKEN).unwrap().unwrap();
        assert_eq!(record.contract_address, TOKEN.to_lowercase());
        assert_eq!(record.network, "localhost");
        assert_eq!(record.abi, Some(token_abi()));
        assert_eq!(record.artifact_path, None);
        assert_eq!(record.source_path, Some(abi_path.display().to_string()));
    }

    #[tokio::test]
    async fn test_import_abi_accepts_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let path = dir.path().join("Token.json");
        std::fs::write(&path, json!({"abi": token_abi(), "bytecode": "0x"}).to_string()).unwrap();

        run_abi(&ctx, &abi_args(path)).await.unwrap();
        assert_eq!(ctx.ledger.get(TOKEN).unwrap().unwrap().abi, Some(token_abi()));
    }

    #[tokio::test]
    async fn test_malformed_abi_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        for (file, content) in [
            ("object.json", json!({"name": "Token"}).to_string()),
            ("untyped.json", json!([{"name": "transfer"}]).to_string()),
            ("broken.json", "[{".to_string()),
        ] {
            let path = dir.path().join(file);
            std::fs::write(&path, content).unwrap();
            assert!(run_abi(&ctx, &abi_args(path)).await.is_err(), "{}", file);
        }

        assert!(!ctx.ledger.path().exists());
    }

    #[tokio::test]
    async fn test_address_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let mut args = abi_args(dir.path().join("missing.json"));
        args.address = "0xnothex".to_string();
        let err = run_abi(&ctx, &args).await.unwrap_err().to_string();
        assert!(err.contains("Invalid contract address"));
    }

    #[tokio::test]
    async fn test_probe_skipped_for_unknown_network() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let abi_path = dir.path().join("Token.abi.json");
        std::fs::write(&abi_path, token_abi().to_string()).unwrap();

        let mut args = abi_args(abi_path);
        args.network_deployed = Some("sepolia".to_string());
        args.skip_probe = false;

        let summary = run_abi(&ctx, &args).await.unwrap();
        assert_eq!(summary.accessible, None);
        assert_eq!(ctx.ledger.get(TOKEN).unwrap().unwrap().network, "sepolia");
    }

    #[test]
    fn test_check_source() {
        let dir = tempfile::tempdir().unwrap();
        let sol = dir.path().join("Token.sol");
        let txt = dir.path().join("Token.txt");
        std::fs::write(&sol, "contract Token {}").unwrap();
        std::fs::write(&txt, "contract Token {}").unwrap();

        assert!(check_source(&sol).is_ok());
        assert!(check_source(&txt).unwrap_err().to_string().contains(".sol"));
        assert!(
            check_source(&dir.path().join("Missing.sol"))
                .unwrap_err()
                .to_string()
                .contains("not found")
        );
    }

    #[tokio::test]
    async fn test_import_code_rejects_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foundry.toml"), "[profile.default]\n").unwrap();
        let ctx = context(dir.path());

        let args = ImportCodeArgs {
            address: TOKEN.to_string(),
            name: "Token".to_string(),
            source: PathBuf::from("src/Token.sol"),
            network_deployed: "localhost".to_string(),
            skip_probe: true,
        };

        let err = run_code(&ctx, &args).await.unwrap_err().to_string();
        assert!(err.contains("Source file not found"));
        assert!(!ctx.ledger.path().exists());
    }
}
