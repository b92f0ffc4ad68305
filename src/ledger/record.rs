use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a ledger entry came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentType {
    /// Deployed by this tool
    Local,
    /// Registered from a plain ABI file
    ExternalAbi,
    /// Registered from a Solidity source compiled locally
    ExternalCode,
}

/// One entry of `deployments.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub network: String,
    pub contract_name: String,
    pub contract_address: String,
    pub timestamp: String,
    pub deployment_type: DeploymentType,
    /// Written as `null` when the ABI is inlined
    #[serde(default)]
    pub artifact_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

impl DeploymentRecord {
    pub fn new(
        network: impl Into<String>,
        contract_name: impl Into<String>,
        contract_address: &str,
        deployment_type: DeploymentType,
    ) -> Self {
        Self {
            network: network.into(),
            contract_name: contract_name.into(),
            contract_address: contract_address.to_lowercase(),
            timestamp: now_timestamp(),
            deployment_type,
            artifact_path: None,
            source_path: None,
            abi: None,
            transaction_hash: None,
        }
    }

    pub fn with_abi(mut self, abi: Value) -> Self {
        self.abi = Some(abi);
        self
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    pub fn with_transaction_hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }
}

/// Current UTC time in the `2024-01-01T00:00:00.000Z` form
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Check for the canonical `0x` + 40 hex digit address form
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}
