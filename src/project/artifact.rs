use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::Bytes;
use eyre::{Result, WrapErr, eyre};
use serde_json::Value;

use super::Project;

/// A compiled contract as written by Foundry or Hardhat
#[derive(Debug, Clone)]
pub struct Artifact {
    pub contract_name: String,
    pub path: PathBuf,
    pub abi: Value,
    /// Creation bytecode, absent for interfaces and abstract contracts
    pub bytecode: Option<Bytes>,
}

impl Artifact {
    /// Load the artifact of `contract` declared in `source`
    pub fn find(project: &Project, source: &Path, contract: &str) -> Result<Self> {
        let path = project.artifact_path(source, contract);
        if !path.exists() {
            return Err(eyre!(
                "Artifact for {} not found at {:?}. Was the contract name spelled correctly?",
                project.fully_qualified_name(source, contract),
                path
            ));
        }
        Self::load(&path, contract)
    }

    pub fn load(path: &Path, contract: &str) -> Result<Self> {
        let content =
            fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {:?}", path))?;
        let json: Value = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse artifact {:?}", path))?;

        Self::from_json(json, path, contract)
    }

    fn from_json(json: Value, path: &Path, contract: &str) -> Result<Self> {
        let abi = json
            .get("abi")
            .cloned()
            .ok_or_else(|| eyre!("Artifact {:?} has no abi", path))?;

        // Hardhat: "bytecode": "0x..", Foundry: "bytecode": { "object": "0x.." }
        let encoded = match json.get("bytecode") {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Object(obj)) => obj.get("object").and_then(Value::as_str),
            _ => None,
        };

        let bytecode = match encoded {
            Some(s) => {
                let hex_str = s.strip_prefix("0x").unwrap_or(s);
                if hex_str.is_empty() {
                    None
                } else {
                    let raw = hex::decode(hex_str).wrap_err_with(|| {
                        format!("Invalid bytecode in {:?} (unlinked libraries?)", path)
                    })?;
                    Some(Bytes::from(raw))
                }
            }
            None => None,
        };

        Ok(Self {
            contract_name: contract.to_string(),
            path: path.to_path_buf(),
            abi,
            bytecode,
        })
    }

    /// Creation bytecode, or an error for non-deployable contracts
    pub fn deploy_code(&self) -> Result<&Bytes> {
        self.bytecode.as_ref().ok_or_else(|| {
            eyre!(
                "{} has no bytecode (interface or abstract contract?)",
                self.contract_name
            )
        })
    }
}
