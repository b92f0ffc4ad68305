use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::KeychainManager;

const CONFIG_DIR: &str = "solscribe";
const CONFIG_FILE: &str = "config.toml";
const PROJECT_CONFIG_FILE: &str = "solscribe.toml";

pub const LOCALHOST_NETWORK: &str = "localhost";
const LOCALHOST_RPC_URL: &str = "http://127.0.0.1:8545";
const LOCALHOST_CHAIN_ID: u64 = 31337;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    #[serde(default)]
    pub wallets: HashMap<String, WalletConfig>,

    #[serde(default)]
    pub defaults: Option<Defaults>,

    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: Option<u64>,
    /// Wallet used for deployments and transactions on this network
    pub wallet: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Reference to keychain entry (e.g., "solscribe:deployer")
    pub keychain: Option<String>,
    /// Environment variable containing private key
    pub env_var: Option<String>,
    /// Optional label for display
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    pub network: Option<String>,
    pub wallet: Option<String>,
}

/// A network picked for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNetwork {
    pub name: String,
    pub rpc_url: String,
    pub chain_id: Option<u64>,
    pub wallet: Option<String>,
}

impl AppConfig {
    /// Load `solscribe.toml` from the project, else the user config, else defaults
    pub fn load(project_root: &Path) -> Result<Self> {
        let project_config = project_root.join(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            tracing::debug!("Using project config {:?}", project_config);
            return Self::load_from(&project_config);
        }

        match Self::default_config_path() {
            Ok(path) if path.exists() => {
                tracing::debug!("Using user config {:?}", path);
                Self::load_from(&path)
            }
            Ok(path) => Ok(Self {
                config_path: Some(path),
                ..Default::default()
            }),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: AppConfig =
            toml::from_str(&content).wrap_err("Failed to parse config file")?;

        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the config file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Get the default configuration file path
    fn default_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| eyre!("Could not determine config directory"))?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get a network by name, falling back to the default and then to `localhost`
    pub fn get_network(&self, name: Option<&str>) -> Result<ResolvedNetwork> {
        let name = name
            .map(str::to_string)
            .or_else(|| self.defaults.as_ref().and_then(|d| d.network.clone()))
            .unwrap_or_else(|| LOCALHOST_NETWORK.to_string());

        if let Some(network) = self.networks.get(&name) {
            return Ok(ResolvedNetwork {
                name,
                rpc_url: network.rpc_url.clone(),
                chain_id: network.chain_id,
                wallet: network.wallet.clone(),
            });
        }

        if matches!(name.as_str(), LOCALHOST_NETWORK | "hardhat" | "anvil") {
            return Ok(ResolvedNetwork {
                name,
                rpc_url: LOCALHOST_RPC_URL.to_string(),
                chain_id: Some(LOCALHOST_CHAIN_ID),
                wallet: None,
            });
        }

        let mut known: Vec<&str> = self.networks.keys().map(String::as_str).collect();
        known.sort_unstable();
        Err(eyre!(
            "Unknown network '{}'. Configured networks: {}",
            name,
            if known.is_empty() {
                LOCALHOST_NETWORK.to_string()
            } else {
                known.join(", ")
            }
        ))
    }

    /// Wallet name for a network: its own wallet, else the default wallet
    pub fn wallet_for(&self, network: &ResolvedNetwork) -> Option<String> {
        network
            .wallet
            .clone()
            .or_else(|| self.defaults.as_ref().and_then(|d| d.wallet.clone()))
    }

    /// Resolve a wallet private key
    pub fn resolve_wallet_key(&self, name: &str) -> Result<Option<Zeroizing<String>>> {
        let wallet = match self.wallets.get(name) {
            Some(w) => w,
            None => return Err(eyre!("Wallet '{}' is not configured", name)),
        };

        if let Some(keychain_ref) = &wallet.keychain {
            match keychain_ref.split_once(':') {
                Some((service, key)) => KeychainManager::with_service(service).get_zeroizing(key),
                None => KeychainManager::new().get_zeroizing(keychain_ref),
            }
        } else if let Some(env_var) = &wallet.env_var {
            Ok(std::env::var(env_var).ok().map(Zeroizing::new))
        } else {
            Ok(None)
        }
    }
}
