use std::path::{Path, PathBuf};

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use clap::Args;
use eyre::{Result, WrapErr, eyre};
use serde::Serialize;

use super::Context;
use crate::contracts::abi::{constructor_inputs, parse_abi};
use crate::contracts::args::{coerce_json_args, describe_params, parse_json_array};
use crate::ledger::{DeploymentRecord, DeploymentType};
use crate::project::{self, Artifact};

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Solidity source file declaring the contract
    #[arg(long, env = "CONTRACT_PATH")]
    pub source: PathBuf,

    /// Name of the contract inside the source file
    #[arg(long, env = "CONTRACT_NAME")]
    pub name: String,

    /// Constructor arguments as a JSON array, e.g. '["MyToken", "1000"]'
    #[arg(long = "args", env = "CONSTRUCTOR_ARGS")]
    pub constructor_args: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploySummary {
    pub success: bool,
    pub contract_name: String,
    pub contract_address: String,
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub network: String,
    pub deployment_type: DeploymentType,
    pub timestamp: String,
}

pub async fn run(ctx: &Context, args: &DeployArgs) -> Result<DeploySummary> {
    let project = ctx.project()?;
    let source = project.resolve_source(&args.source);
    if !source.exists() {
        return Err(eyre!("Source file not found: {:?}", source));
    }

    // Settle the network before spending time on compilation
    let network = ctx.network()?;

    let output = project::compile(&project).await?;
    if !output.stderr.trim().is_empty() {
        tracing::warn!("Compiler reported:\n{}", output.stderr.trim());
    }

    tracing::info!(
        "Deploying {} to {}",
        project.fully_qualified_name(&source, &args.name),
        network.name
    );

    let artifact = Artifact::find(&project, &source, &args.name)?;
    let source_label = project.relative_source(&source);

    deploy_artifact(
        ctx,
        &artifact,
        &source_label,
        args.constructor_args.as_deref(),
    )
    .await
}

/// Deploy an already compiled artifact and record it
pub async fn deploy_artifact(
    ctx: &Context,
    artifact: &Artifact,
    source: &Path,
    constructor_args: Option<&str>,
) -> Result<DeploySummary> {
    let abi = parse_abi(&artifact.abi)
        .wrap_err_with(|| format!("Invalid ABI in {:?}", artifact.path))?;
    let code = creation_code(&abi, artifact.deploy_code()?, constructor_args)?;

    let network = ctx.network()?;
    let caller = ctx.caller(&network)?;

    let receipt = caller.deploy(code).await?;
    let address = receipt
        .contract_address
        .ok_or_else(|| eyre!("Deployment receipt carries no contract address"))?;
    let tx_hash = format!("{:?}", receipt.transaction_hash);

    tracing::info!("{} deployed at {}", artifact.contract_name, address);

    let record = DeploymentRecord::new(
        &network.name,
        &artifact.contract_name,
        &address.to_string(),
        DeploymentType::Local,
    )
    .with_source_path(source.display().to_string())
    .with_abi(artifact.abi.clone())
    .with_transaction_hash(&tx_hash);
    let timestamp = record.timestamp.clone();

    ctx.ledger.write(&address.to_string(), record)?;

    Ok(DeploySummary {
        success: true,
        contract_name: artifact.contract_name.clone(),
        contract_address: address.to_checksum(None),
        transaction_hash: tx_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        network: network.name,
        deployment_type: DeploymentType::Local,
        timestamp,
    })
}

/// Check constructor arguments against the ABI and encode them
pub fn constructor_values(abi: &JsonAbi, raw: Option<&str>) -> Result<Vec<DynSolValue>> {
    let params = constructor_inputs(abi);
    let supplied = parse_json_array(raw).wrap_err("Invalid constructor arguments")?;

    if !params.is_empty() && supplied.is_empty() {
        return Err(eyre!(
            "Constructor arguments required: expected {} ({})",
            params.len(),
            describe_params(params)
        ));
    }

    if params.len() != supplied.len() {
        return Err(eyre!(
            "Constructor argument count mismatch: expected {} ({}), got {}",
            params.len(),
            describe_params(params),
            supplied.len()
        ));
    }

    coerce_json_args(params, &supplied)
}

/// Bytecode followed by the ABI-encoded constructor arguments
fn creation_code(abi: &JsonAbi, bytecode: &Bytes, raw_args: Option<&str>) -> Result<Bytes> {
    let values = constructor_values(abi, raw_args)?;

    let mut code = bytecode.to_vec();
    if let Some(constructor) = abi.constructor() {
        let encoded = constructor
            .abi_encode_input_raw(&values)
            .wrap_err("Failed to encode constructor arguments")?;
        code.extend(encoded);
    }

    Ok(Bytes::from(code))
}
