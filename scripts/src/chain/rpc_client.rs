//! A [`ChainClient`] backed by an alloy HTTP provider and a local signer

use std::{str::FromStr, time::Duration};

use alloy::{
    dyn_abi::DynSolValue,
    network::TransactionBuilder,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{http::reqwest::Url, TransportError},
};
use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    artifacts::ArtifactStore,
    chain::{ChainClient, Receipt, TransactionHandle},
    constants::RECEIPT_POLL_INTERVAL,
    errors::ScriptError,
};

/// A chain client sending transactions from a single private key over HTTP
pub struct RpcChainClient {
    /// The provider, with the deployer's wallet attached
    provider: DynProvider,
    /// The deployer's address
    sender: Address,
    /// The compiled artifacts deployments are built from
    artifacts: ArtifactStore,
}

impl RpcChainClient {
    /// Connect to `rpc_url`, signing with `priv_key`
    pub async fn connect(
        priv_key: &str,
        rpc_url: &str,
        artifacts: ArtifactStore,
    ) -> Result<Self, ScriptError> {
        let signer = PrivateKeySigner::from_str(priv_key)
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        let sender = signer.address();
        let url =
            Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

        let provider = ProviderBuilder::new().wallet(signer).connect_http(url);
        let provider = DynProvider::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
        info!(
            chain_id,
            sender = %sender,
            artifacts = %artifacts.dir().display(),
            "connected to RPC node"
        );

        Ok(Self {
            provider,
            sender,
            artifacts,
        })
    }

    /// Poll for the receipt of `tx_hash` until one is available
    async fn poll_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, ScriptError> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(classify_rpc_error)?;

            match receipt {
                Some(receipt) => return Ok(receipt),
                None => tokio::time::sleep(RECEIPT_POLL_INTERVAL).await,
            }
        }
    }

    /// Submit a transaction request, returning its handle
    async fn submit(&self, tx: TransactionRequest) -> Result<TransactionHandle, ScriptError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(classify_rpc_error)?;

        let tx_hash = *pending.tx_hash();
        debug!(tx = %tx_hash, "submitted transaction");
        Ok(TransactionHandle { tx_hash })
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn deploy_contract(
        &self,
        artifact: &str,
        constructor_args: &[DynSolValue],
    ) -> Result<TransactionHandle, ScriptError> {
        let artifact = self.artifacts.load(artifact)?;

        let mut code = artifact.bytecode.to_vec();
        if !constructor_args.is_empty() {
            code.extend(DynSolValue::Tuple(constructor_args.to_vec()).abi_encode_params());
        }

        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_deploy_code(code);
        self.submit(tx).await
    }

    async fn send_transaction(
        &self,
        to: Address,
        calldata: Bytes,
    ) -> Result<TransactionHandle, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_input(calldata);
        self.submit(tx).await
    }

    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, ScriptError> {
        let tx = TransactionRequest::default().with_to(to).with_input(calldata);
        self.provider.call(tx).await.map_err(classify_rpc_error)
    }

    async fn wait_for_confirmation(
        &self,
        tx: TransactionHandle,
        timeout: Duration,
    ) -> Result<Receipt, ScriptError> {
        let receipt = tokio::time::timeout(timeout, self.poll_receipt(tx.tx_hash))
            .await
            .map_err(|_| {
                ScriptError::Timeout(format!(
                    "transaction {:#x} not confirmed after {}s",
                    tx.tx_hash,
                    timeout.as_secs()
                ))
            })??;

        Ok(Receipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            contract_address: receipt.contract_address,
            success: receipt.status(),
        })
    }
}

/// Map a transport error onto the script error taxonomy, surfacing reverts
/// reported by the node (typically during gas estimation) verbatim
fn classify_rpc_error(err: TransportError) -> ScriptError {
    match err {
        TransportError::ErrorResp(payload) if payload.message.contains("revert") => {
            let data = payload.data.as_deref().map(|data| data.get());
            ScriptError::TransactionReverted(revert_reason(&payload.message, data))
        }
        err => ScriptError::ChainCommunication(err.to_string()),
    }
}

/// The node's revert message, followed by the raw revert data if the node
/// returned any
fn revert_reason(message: &str, data: Option<&str>) -> String {
    match data.map(|d| d.trim_matches('"')).filter(|d| !d.is_empty()) {
        Some(data) => format!("{message} (data: {data})"),
        None => message.to_string(),
    }
}
