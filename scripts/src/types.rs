//! Type definitions used throughout the scripts

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

use alloy_primitives::{keccak256, Address, TxHash, B256, U256};
use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{constants::MINTER_ROLE_NAME, errors::ScriptError};

/// The networks the Overlay contracts are provisioned on
#[derive(
    ValueEnum, Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkId {
    /// Ethereum mainnet
    Mainnet,
    /// The Rinkeby testnet
    Rinkeby,
    /// The Kovan testnet
    Kovan,
    /// A local fork of mainnet
    MainnetFork,
}

impl Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkId::Mainnet => write!(f, "mainnet"),
            NetworkId::Rinkeby => write!(f, "rinkeby"),
            NetworkId::Kovan => write!(f, "kovan"),
            NetworkId::MainnetFork => write!(f, "mainnet-fork"),
        }
    }
}

/// A price feed to deploy on a given network
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSpec {
    /// The market symbol, e.g. `BTCUSD`
    pub symbol: String,
    /// The oracle aggregator backing the feed, `None` if the feed is
    /// unsupported on the network
    pub source: Option<Address>,
    /// The number of oracle rounds the feed samples over
    pub rounds: u64,
}

/// A contract deployed by a plan step
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeployedContract {
    /// The name of the plan step that deployed the contract
    pub logical_name: String,
    /// The artifact the contract was deployed from
    pub artifact: String,
    /// The deployed address
    pub address: Address,
    /// The network the contract lives on
    pub network: NetworkId,
    /// The hash of the deployment transaction, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<TxHash>,
}

/// A confirmed, non-repeatable action taken by a plan step (mint, transfer)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ActionRecord {
    /// The hash of the transaction that completed the action, if one was sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<TxHash>,
}

/// Access-control roles understood by the provisioner
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Permission to increase the token supply
    Minter,
    /// The OpenZeppelin `DEFAULT_ADMIN_ROLE`, which administers all other roles
    DefaultAdmin,
}

impl Role {
    /// The `bytes32` identifier of the role in an OpenZeppelin `AccessControl` contract
    pub fn id(&self) -> B256 {
        match self {
            Role::Minter => keccak256(MINTER_ROLE_NAME),
            Role::DefaultAdmin => B256::ZERO,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Minter => write!(f, "MINTER_ROLE"),
            Role::DefaultAdmin => write!(f, "DEFAULT_ADMIN_ROLE"),
        }
    }
}

/// The desired membership of `grantee` in `role` on a deployed contract
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleGrant {
    /// The logical name of the contract holding the role
    pub contract_name: String,
    /// The address of the contract holding the role
    pub contract: Address,
    /// The role
    pub role: Role,
    /// The account whose membership is reconciled
    pub grantee: Address,
    /// Whether the grantee should hold the role
    pub granted: bool,
}

impl Display for RoleGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.granted { "grant" } else { "revoke" };
        write!(
            f,
            "{verb} {} on {} ({:#x}) for {:#x}",
            self.role, self.contract_name, self.contract, self.grantee
        )
    }
}

/// The outcome of reconciling a single role grant
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoleGrantStatus {
    /// On-chain state already matched, nothing was sent
    Unchanged,
    /// A transaction was confirmed and the post-condition holds
    Applied,
    /// A transaction was confirmed but the post-condition does not hold
    VerificationFailed,
    /// The grant could not be reconciled
    Failed(ScriptError),
}

/// A role grant paired with the outcome of its reconciliation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleGrantResult {
    /// The grant that was reconciled
    pub grant: RoleGrant,
    /// The outcome
    pub status: RoleGrantStatus,
}

impl RoleGrantResult {
    /// Whether the grant's intended state holds on-chain
    pub fn holds(&self) -> bool {
        matches!(
            self.status,
            RoleGrantStatus::Unchanged | RoleGrantStatus::Applied
        )
    }
}

/// What a completed plan step did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A new contract was deployed and recorded
    Deployed(DeployedContract),
    /// The contract was already recorded in the registry, nothing was sent
    AlreadyDeployed(DeployedContract),
    /// Role grants were reconciled
    RolesReconciled(Vec<RoleGrantResult>),
    /// Token supply was minted to the deployer
    Minted {
        /// The amount minted, zero if the supply already existed
        amount: U256,
    },
    /// Tokens were transferred to a recipient
    Transferred {
        /// The recipient of the transfer
        recipient: Address,
        /// The amount transferred
        amount: U256,
    },
    /// A journaled action was found in the registry, nothing was sent
    AlreadyApplied,
}

/// A plan step that ran to completion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedStep {
    /// The name of the step
    pub name: String,
    /// What the step did
    pub outcome: StepOutcome,
}

impl CompletedStep {
    /// The contract associated with the step, if it is a deploy step
    pub fn contract(&self) -> Option<&DeployedContract> {
        match &self.outcome {
            StepOutcome::Deployed(c) | StepOutcome::AlreadyDeployed(c) => Some(c),
            _ => None,
        }
    }
}

/// A plan step that was not executed because it is unavailable on the network
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedStep {
    /// The name of the step
    pub name: String,
    /// Why the step was skipped
    pub reason: String,
}

/// The outcome of running a deployment plan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeploymentResult {
    /// The network the plan ran against
    pub network: NetworkId,
    /// The steps that completed, in execution order
    pub completed_steps: Vec<CompletedStep>,
    /// The steps that were skipped, in execution order
    pub skipped_steps: Vec<SkippedStep>,
    /// The step that halted the run, if any
    pub failed_step: Option<String>,
    /// The cause of the halt, if any
    pub error: Option<ScriptError>,
}

impl DeploymentResult {
    /// Create an empty result for a run against `network`
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            completed_steps: Vec::new(),
            skipped_steps: Vec::new(),
            failed_step: None,
            error: None,
        }
    }

    /// Whether every executable step completed
    pub fn is_success(&self) -> bool {
        self.failed_step.is_none()
    }

    /// The contracts deployed or reused by the run, in execution order
    pub fn contracts(&self) -> Vec<&DeployedContract> {
        self.completed_steps
            .iter()
            .filter_map(CompletedStep::contract)
            .collect()
    }

    /// The addresses of the contracts in the run, keyed by logical name
    pub fn addresses(&self) -> BTreeMap<String, Address> {
        self.contracts()
            .into_iter()
            .map(|c| (c.logical_name.clone(), c.address))
            .collect()
    }

    /// Whether the named step was skipped
    pub fn was_skipped(&self, name: &str) -> bool {
        self.skipped_steps.iter().any(|s| s.name == name)
    }

    /// Whether the named step completed
    pub fn was_completed(&self, name: &str) -> bool {
        self.completed_steps.iter().any(|s| s.name == name)
    }
}

impl Display for DeploymentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deployment on {}", self.network)?;
        for step in &self.completed_steps {
            match &step.outcome {
                StepOutcome::Deployed(c) => writeln!(f, "  [deployed] {}: {:#x}", step.name, c.address)?,
                StepOutcome::AlreadyDeployed(c) => {
                    writeln!(f, "  [recorded] {}: {:#x}", step.name, c.address)?
                }
                StepOutcome::RolesReconciled(results) => {
                    let summary = results
                        .iter()
                        .map(|r| format!("{} ({:?})", r.grant, r.status))
                        .join("; ");
                    writeln!(f, "  [roles]    {}: {}", step.name, summary)?
                }
                StepOutcome::Minted { amount } => {
                    writeln!(f, "  [minted]   {}: {}", step.name, amount)?
                }
                StepOutcome::Transferred { recipient, amount } => {
                    writeln!(f, "  [funded]   {}: {} to {:#x}", step.name, amount, recipient)?
                }
                StepOutcome::AlreadyApplied => writeln!(f, "  [applied]  {}", step.name)?,
            }
        }
        for step in &self.skipped_steps {
            writeln!(f, "  [skipped]  {}: {}", step.name, step.reason)?;
        }
        match (&self.failed_step, &self.error) {
            (Some(step), Some(err)) => write!(f, "HALTED at {}: {}", step, err),
            (Some(step), None) => write!(f, "HALTED at {}", step),
            _ => write!(f, "Completed {} steps", self.completed_steps.len()),
        }
    }
}
