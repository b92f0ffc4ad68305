use std::path::Path;

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, U256};
use clap::Args;
use eyre::{Result, WrapErr, eyre};
use serde::Serialize;
use serde_json::Value;

use super::{Context, check_address, emit};
use crate::contracts::abi::{find_function, is_read_only, parse_abi, read_abi_file};
use crate::contracts::{CallArguments, ContractCaller, LogEntry, decode_log, normalize_outputs};
use crate::ledger::{DeploymentRecord, now_timestamp};

#[derive(Args, Debug)]
pub struct InteractArgs {
    /// Address of a contract recorded in the ledger
    #[arg(long, env = "CONTRACT_ADDRESS")]
    pub address: String,

    /// Function to call
    #[arg(long = "function", env = "CONTRACT_FUNCTION")]
    pub function: String,

    /// Call arguments as a JSON array, e.g. '["0xabc...", "100"]'
    #[arg(long = "args", env = "CONTRACT_ARGS")]
    pub args: Option<String>,

    /// Wei to send with a payable function
    #[arg(long)]
    pub value: Option<U256>,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Address of a contract recorded in the ledger
    pub address: String,

    /// Function to call
    pub function: String,

    /// Arguments, each parsed as the type of the matching parameter
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Wei to send with a payable function
    #[arg(long)]
    pub value: Option<U256>,
}

/// A call as requested, before anything is looked up
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub address: String,
    pub function: String,
    pub arguments: CallArguments,
    pub value: Option<U256>,
}

impl From<InteractArgs> for CallRequest {
    fn from(args: InteractArgs) -> Self {
        Self {
            address: args.address,
            function: args.function,
            arguments: CallArguments::Json(args.args),
            value: args.value,
        }
    }
}

impl From<CallArgs> for CallRequest {
    fn from(args: CallArgs) -> Self {
        Self {
            address: args.address,
            function: args.function,
            arguments: CallArguments::Tokens(args.args),
            value: args.value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    View,
    Transaction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractReport {
    pub success: bool,
    pub contract_address: String,
    pub function_name: String,
    pub network: String,
    pub timestamp: String,
    pub call_type: CallType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<LogEntry>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractFailure {
    pub success: bool,
    pub error: String,
    pub contract_address: String,
    pub function_name: String,
    pub network: Option<String>,
    pub timestamp: String,
}

/// A call resolved against the ledger, ready to dispatch
#[derive(Debug)]
pub struct PreparedCall {
    pub record: DeploymentRecord,
    pub abi: JsonAbi,
    pub function: Function,
    pub args: Vec<DynSolValue>,
    pub address: Address,
}

/// Resolve record, ABI, function and arguments without touching the network
pub fn prepare(ctx: &Context, request: &CallRequest) -> Result<PreparedCall> {
    check_address(&request.address)?;

    let record = ctx
        .ledger
        .get(&request.address)?
        .ok_or_else(|| eyre!("No deployment found for address {}", request.address))?;

    let abi_value = record_abi(&record, ctx.ledger.path())?;
    let abi = parse_abi(&abi_value)
        .wrap_err_with(|| format!("Invalid ABI stored for {}", record.contract_address))?;

    let function = find_function(&abi, &request.function, request.arguments.count()?)?.clone();
    let args = request
        .arguments
        .coerce(&function.inputs)
        .wrap_err_with(|| format!("Invalid arguments for {}", function.signature()))?;

    let address: Address = record
        .contract_address
        .parse()
        .wrap_err("Invalid contract address in ledger")?;

    Ok(PreparedCall {
        record,
        abi,
        function,
        args,
        address,
    })
}

/// Inlined ABI, else the ABI of the referenced artifact
fn record_abi(record: &DeploymentRecord, ledger_path: &Path) -> Result<Value> {
    if let Some(abi) = &record.abi {
        return Ok(abi.clone());
    }

    if let Some(artifact) = &record.artifact_path {
        let path = Path::new(artifact);
        let path = match ledger_path.parent() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        };
        return read_abi_file(&path);
    }

    Err(eyre!(
        "Ledger entry for {} has neither an ABI nor an artifact path",
        record.contract_address
    ))
}

/// Dispatch a call: `eth_call` for view/pure functions, a transaction otherwise
pub async fn run(ctx: &Context, request: &CallRequest) -> Result<InteractReport> {
    let call = prepare(ctx, request)?;
    let network = ctx.network_for(&call.record.network)?;
    let signature = call.function.signature();

    let mut report = InteractReport {
        success: true,
        contract_address: call.address.to_checksum(None),
        function_name: call.function.name.clone(),
        network: network.name.clone(),
        timestamp: now_timestamp(),
        call_type: CallType::View,
        result: None,
        transaction_hash: None,
        gas_used: None,
        block_number: None,
        status: None,
        events: None,
    };

    if is_read_only(&call.function) {
        if request.value.is_some() {
            tracing::warn!("Ignoring value for read-only function {}", signature);
        }
        tracing::info!("Calling {} on {} ({})", signature, call.address, network.name);

        let outputs = ContractCaller::new(&network.rpc_url)
            .call_read(call.address, &call.function, &call.args)
            .await?;

        report.result = Some(normalize_outputs(&outputs, &call.function.outputs));
    } else {
        tracing::info!(
            "Sending {} to {} ({})",
            signature,
            call.address,
            network.name
        );

        let receipt = ctx
            .caller(&network)?
            .call_write(call.address, &call.function, &call.args, request.value)
            .await?;

        let events = receipt
            .inner
            .logs()
            .iter()
            .map(|log| decode_log(&call.abi, log.address(), log.data()))
            .collect::<Vec<_>>();

        let unparsed = events.iter().filter(|e| e.event == "unparsed").count();
        if unparsed > 0 {
            tracing::warn!("{} log(s) did not match any event in the ABI", unparsed);
        }

        report.call_type = CallType::Transaction;
        report.transaction_hash = Some(format!("{:?}", receipt.transaction_hash));
        report.gas_used = Some(receipt.gas_used);
        report.block_number = receipt.block_number;
        report.status = Some(receipt.status());
        report.events = Some(events);
    }

    Ok(report)
}

/// Run a call and print either its report or a failure object
pub async fn execute(ctx: &Context, request: CallRequest) -> Result<()> {
    match run(ctx, &request).await {
        Ok(report) => emit(&report),
        Err(e) => {
            emit(&failure(ctx, &request, &e))?;
            Err(e)
        }
    }
}

/// Failure object for a call; the network is `--network`, else the recorded one
fn failure(ctx: &Context, request: &CallRequest, error: &eyre::Report) -> InteractFailure {
    let network = ctx.network_override.clone().or_else(|| {
        ctx.ledger
            .get(&request.address)
            .ok()
            .flatten()
            .map(|record| record.network)
    });

    InteractFailure {
        success: false,
        error: format!("{:#}", error),
        contract_address: request.address.clone(),
        function_name: request.function.clone(),
        network,
        timestamp: now_timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::commands::tests::context;
    use crate::contracts::abi::tests::token_abi;
    use crate::ledger::DeploymentType;

    const TOKEN: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn request(function: &str, arguments: CallArguments) -> CallRequest {
        CallRequest {
            address: TOKEN.to_string(),
            function: function.to_string(),
            arguments,
            value: None,
        }
    }

    fn ctx_with_token(dir: &Path) -> Context {
        let ctx = context(dir);
        ctx.ledger
            .write(
                TOKEN,
                DeploymentRecord::new("localhost", "Token", TOKEN, DeploymentType::ExternalAbi)
                    .with_abi(token_abi()),
            )
            .unwrap();
        ctx
    }

    #[test]
    fn test_prepare_view_call() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_token(dir.path());

        let call = prepare(
            &ctx,
            &request(
                "balanceOf",
                CallArguments::Json(Some(
                    r#"["0x0000000000000000000000000000000000000001"]"#.into(),
                )),
            ),
        )
        .unwrap();

        assert_eq!(call.function.name, "balanceOf");
        assert_eq!(call.args.len(), 1);
        assert!(is_read_only(&call.function));
        assert_eq!(call.address.to_checksum(None), TOKEN);
    }

    #[test]
    fn test_lookup_ignores_address_case() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_token(dir.path());

        let mut req = request("totalSupply", CallArguments::Tokens(vec![]));
        req.address = TOKEN.to_lowercase();
        assert!(prepare(&ctx, &req).is_ok());
    }

    #[test]
    fn test_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let err = prepare(&ctx, &request("totalSupply", CallArguments::Json(None)))
            .unwrap_err()
            .to_string();
        assert!(err.contains("No deployment found"));
    }

    #[test]
    fn test_unknown_function() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_token(dir.path());

        let err = prepare(&ctx, &request("mint", CallArguments::Json(None)))
            .unwrap_err()
            .to_string();
        assert!(err.contains("Function 'mint' not found"));
    }

    #[test]
    fn test_argument_count_checked_before_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_token(dir.path());

        let err = prepare(
            &ctx,
            &request(
                "transfer",
                CallArguments::Tokens(vec!["0x0000000000000000000000000000000000000001".into()]),
            ),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("Argument count mismatch"));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_token(dir.path());

        let mut req = request("totalSupply", CallArguments::Json(None));
        req.address = "token".to_string();
        assert!(prepare(&ctx, &req).is_err());
    }

    #[test]
    fn test_abi_from_artifact_path() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        std::fs::write(
            dir.path().join("Token.json"),
            json!({"contractName": "Token", "abi": token_abi()}).to_string(),
        )
        .unwrap();

        let mut record =
            DeploymentRecord::new("localhost", "Token", TOKEN, DeploymentType::ExternalCode);
        record.artifact_path = Some("Token.json".to_string());
        ctx.ledger.write(TOKEN, record).unwrap();

        let call = prepare(&ctx, &request("totalSupply", CallArguments::Json(None))).unwrap();
        assert_eq!(call.function.name, "totalSupply");
    }

    #[test]
    fn test_failure_object() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        ctx.ledger
            .write(
                TOKEN,
                DeploymentRecord::new("sepolia", "Token", TOKEN, DeploymentType::ExternalAbi)
                    .with_abi(token_abi()),
            )
            .unwrap();

        let req = request("mint", CallArguments::Json(None));
        let err = prepare(&ctx, &req).unwrap_err();

        let value = serde_json::to_value(failure(&ctx, &req, &err)).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            [
                "contractAddress",
                "error",
                "functionName",
                "network",
                "success",
                "timestamp"
            ]
        );
        assert_eq!(value["success"], false);
        assert_eq!(value["contractAddress"], TOKEN);
        assert_eq!(value["functionName"], "mint");
        assert_eq!(value["network"], "sepolia");
        assert!(value["error"].as_str().unwrap().contains("Function 'mint' not found"));

        ctx.network_override = Some("anvil".to_string());
        assert_eq!(failure(&ctx, &req, &err).network.as_deref(), Some("anvil"));
    }

    #[test]
    fn test_failure_for_unknown_address() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let req = request("totalSupply", CallArguments::Json(None));
        let err = prepare(&ctx, &req).unwrap_err();

        let value = serde_json::to_value(failure(&ctx, &req, &err)).unwrap();
        assert!(value["network"].is_null());
        assert!(value["error"].as_str().unwrap().contains("No deployment found"));
    }

    #[test]
    fn test_report_shape() {
        let report = InteractReport {
            success: true,
            contract_address: TOKEN.to_string(),
            function_name: "get".to_string(),
            network: "localhost".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            call_type: CallType::View,
            result: Some(Value::Null),
            transaction_hash: None,
            gas_used: None,
            block_number: None,
            status: None,
            events: None,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["callType"], "view");
        assert!(value["result"].is_null());
        assert!(value.as_object().unwrap().contains_key("result"));
        assert!(!value.as_object().unwrap().contains_key("transactionHash"));
    }
}
