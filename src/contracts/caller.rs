use alloy::{
    dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt},
    json_abi::Function,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
};
use eyre::{Result, WrapErr, eyre};
use zeroize::Zeroizing;

/// Handles contract calls via Alloy
pub struct ContractCaller {
    rpc_url: String,
    signer: Option<PrivateKeySigner>,
    chain_id: Option<u64>,
}

impl ContractCaller {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            signer: None,
            chain_id: None,
        }
    }

    /// Refuse to send transactions unless the node reports this chain id
    pub fn with_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Set the signer for write transactions
    pub fn with_signer(mut self, private_key: Zeroizing<String>) -> Result<Self> {
        let key_str = private_key.trim();
        let clean_key = key_str.strip_prefix("0x").unwrap_or(key_str);

        let signer: PrivateKeySigner = clean_key.parse().wrap_err("Failed to parse private key")?;

        self.signer = Some(signer);
        Ok(self)
    }

    /// Execute a read-only call (view/pure function) and decode its outputs
    pub async fn call_read(
        &self,
        address: Address,
        function: &Function,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>> {
        let provider = ProviderBuilder::new()
            .connect(&self.rpc_url)
            .await
            .wrap_err("Failed to connect to RPC")?;

        let calldata = function
            .abi_encode_input(args)
            .wrap_err_with(|| format!("Failed to encode arguments for {}", function.signature()))?;

        let tx = TransactionRequest::default()
            .to(address)
            .input(calldata.into());

        let result = provider.call(tx).await.wrap_err("Call failed")?;

        function
            .abi_decode_output(&result)
            .wrap_err_with(|| format!("Failed to decode result of {}", function.signature()))
    }

    /// Send a state-changing call and wait for it to be mined
    pub async fn call_write(
        &self,
        address: Address,
        function: &Function,
        args: &[DynSolValue],
        value: Option<U256>,
    ) -> Result<TransactionReceipt> {
        let calldata = function
            .abi_encode_input(args)
            .wrap_err_with(|| format!("Failed to encode arguments for {}", function.signature()))?;

        let mut tx = TransactionRequest::default()
            .to(address)
            .input(calldata.into());

        if let Some(v) = value {
            tx = tx.value(v);
        }

        self.submit(tx).await
    }

    /// Deploy creation code (bytecode followed by encoded constructor arguments)
    pub async fn deploy(&self, code: Bytes) -> Result<TransactionReceipt> {
        let tx = TransactionRequest::default().with_deploy_code(code);
        self.submit(tx).await
    }

    /// Sign with the configured key, or let the node sign with its first account
    async fn submit(&self, tx: TransactionRequest) -> Result<TransactionReceipt> {
        match &self.signer {
            Some(signer) => {
                tracing::info!("Sending from {}", signer.address());
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer.clone()))
                    .connect(&self.rpc_url)
                    .await
                    .wrap_err("Failed to connect to RPC")?;

                self.check_chain(&provider).await?;
                send_and_wait(&provider, tx).await
            }
            None => {
                let provider = ProviderBuilder::new()
                    .connect(&self.rpc_url)
                    .await
                    .wrap_err("Failed to connect to RPC")?;

                self.check_chain(&provider).await?;
                let accounts = provider
                    .get_accounts()
                    .await
                    .wrap_err("Failed to list node accounts")?;
                let from = accounts.first().copied().ok_or_else(|| {
                    eyre!("No wallet configured and the node exposes no unlocked accounts")
                })?;

                tracing::info!("Sending from node account {}", from);
                send_and_wait(&provider, tx.from(from)).await
            }
        }
    }

    async fn check_chain(&self, provider: &impl Provider) -> Result<()> {
        let Some(expected) = self.chain_id else {
            return Ok(());
        };

        let actual = provider
            .get_chain_id()
            .await
            .wrap_err("Failed to query chain id")?;
        if actual != expected {
            return Err(eyre!(
                "Chain id mismatch: network is configured for {}, node reports {}",
                expected,
                actual
            ));
        }
        Ok(())
    }
}

async fn send_and_wait(
    provider: &impl Provider,
    tx: TransactionRequest,
) -> Result<TransactionReceipt> {
    let pending_tx = provider
        .send_transaction(tx)
        .await
        .wrap_err("Failed to send transaction")?;

    tracing::info!("Transaction sent: {:?}, waiting for receipt", pending_tx.tx_hash());

    let receipt = pending_tx
        .get_receipt()
        .await
        .wrap_err("Failed to get transaction receipt")?;

    if !receipt.status() {
        return Err(eyre!(
            "Transaction {:?} reverted in block {}",
            receipt.transaction_hash,
            receipt.block_number.unwrap_or_default()
        ));
    }

    tracing::info!(
        "Transaction {:?} mined in block {} (gas used: {})",
        receipt.transaction_hash,
        receipt.block_number.unwrap_or_default(),
        receipt.gas_used
    );

    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;

    // First well-known development key of Hardhat and Anvil
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcac784d7bf4f2ff80";

    #[test]
    fn test_with_signer_accepts_prefixed_key() {
        let expected = PrivateKeySigner::from_bytes(&alloy::primitives::b256!(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcac784d7bf4f2ff80"
        ))
        .unwrap()
        .address();

        let padded = format!("  {}\n", DEV_KEY);
        for key in [DEV_KEY, DEV_KEY.trim_start_matches("0x"), padded.as_str()] {
            let caller = ContractCaller::new("http://127.0.0.1:8545")
                .with_signer(Zeroizing::new(key.to_string()))
                .unwrap();
            assert_eq!(caller.signer.unwrap().address(), expected);
        }
    }

    #[test]
    fn test_with_signer_rejects_garbage() {
        assert!(
            ContractCaller::new("http://127.0.0.1:8545")
                .with_signer(Zeroizing::new("not-a-key".to_string()))
                .is_err()
        );
    }
}
