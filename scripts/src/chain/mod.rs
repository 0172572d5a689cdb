//! The interface through which the scripts talk to a chain

use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, TxHash};
use alloy_sol_types::SolValue;
use async_trait::async_trait;

use crate::errors::ScriptError;

pub mod rpc_client;

/// A handle to a submitted transaction
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransactionHandle {
    /// The hash of the transaction
    pub tx_hash: TxHash,
}

/// The confirmed result of a transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// The hash of the transaction
    pub tx_hash: TxHash,
    /// The block the transaction was included in
    pub block_number: Option<u64>,
    /// The address of the created contract, for deployments
    pub contract_address: Option<Address>,
    /// Whether the transaction executed successfully
    pub success: bool,
}

/// A client capable of submitting transactions from a single account and
/// reading contract state
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The account transactions are sent from
    fn sender(&self) -> Address;

    /// Submit a deployment of the named artifact with the given constructor arguments
    async fn deploy_contract(
        &self,
        artifact: &str,
        constructor_args: &[DynSolValue],
    ) -> Result<TransactionHandle, ScriptError>;

    /// Submit a transaction calling `to` with `calldata`
    async fn send_transaction(
        &self,
        to: Address,
        calldata: Bytes,
    ) -> Result<TransactionHandle, ScriptError>;

    /// Execute a read-only call against `to`, returning the raw return data
    async fn call(&self, to: Address, calldata: Bytes) -> Result<Bytes, ScriptError>;

    /// Wait for the transaction to be included, failing with
    /// [`ScriptError::Timeout`] if that does not happen within `timeout`
    async fn wait_for_confirmation(
        &self,
        tx: TransactionHandle,
        timeout: Duration,
    ) -> Result<Receipt, ScriptError>;
}

/// Wait for a transaction to be confirmed and ensure it executed successfully
pub async fn await_receipt(
    client: &dyn ChainClient,
    tx: TransactionHandle,
    timeout: Duration,
) -> Result<Receipt, ScriptError> {
    let receipt = client.wait_for_confirmation(tx, timeout).await?;
    if !receipt.success {
        return Err(ScriptError::TransactionReverted(format!(
            "transaction {:#x} reverted",
            receipt.tx_hash
        )));
    }

    Ok(receipt)
}

/// Execute a read-only call and decode its single return value
pub async fn call_and_decode<T: SolValue>(
    client: &dyn ChainClient,
    to: Address,
    calldata: Vec<u8>,
) -> Result<T, ScriptError>
where
    T: From<<T::SolType as alloy_sol_types::SolType>::RustType>,
{
    let data = client.call(to, calldata.into()).await?;
    T::abi_decode(&data).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}
