//! Definitions of errors that can occur while provisioning the Overlay contracts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptError {
    /// The deployment plan is malformed (cycle, unknown or undeclared dependency)
    Plan(String),
    /// The RPC node could not be reached or returned an unexpected error
    ChainCommunication(String),
    /// A transaction was rejected on-chain, carrying the revert reason
    TransactionReverted(String),
    /// A transaction was not confirmed within the configured timeout
    Timeout(String),
    /// A registry entry already exists with a different address
    DuplicateRecord(String),
    /// On-chain role state did not match the intended state after a transaction
    VerificationFailed(String),
    /// Error reading the deployments file
    ReadDeployments(String),
    /// Error writing the deployments file
    WriteDeployments(String),
    /// Error parsing a compiled contract artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing or decoding calldata for a contract method
    CalldataConstruction(String),
    /// A deployment confirmed but did not yield a contract address
    ContractDeployment(String),
    /// Error loading or interpreting configuration
    Config(String),
}

impl ScriptError {
    /// Whether the error leaves the on-chain outcome unknown, in which case
    /// re-running the plan is the expected remedy
    pub fn is_inconclusive(&self) -> bool {
        matches!(
            self,
            ScriptError::Timeout(_) | ScriptError::ChainCommunication(_)
        )
    }
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Plan(s) => write!(f, "invalid deployment plan: {}", s),
            ScriptError::ChainCommunication(s) => write!(f, "error communicating with chain: {}", s),
            ScriptError::TransactionReverted(s) => write!(f, "transaction reverted: {}", s),
            ScriptError::Timeout(s) => write!(f, "timed out waiting for confirmation: {}", s),
            ScriptError::DuplicateRecord(s) => write!(f, "conflicting deployment record: {}", s),
            ScriptError::VerificationFailed(s) => write!(f, "role verification failed: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::Config(s) => write!(f, "invalid configuration: {}", s),
        }
    }
}

impl Error for ScriptError {}
