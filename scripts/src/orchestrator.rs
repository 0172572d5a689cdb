//! Execution of deployment plans
//!
//! Steps run strictly one at a time in the plan's execution order. Deploy
//! steps already recorded in the registry are reused rather than repeated,
//! and registry writes only happen after a deployment confirms, so a halted
//! run can always be resumed by running the same plan again.

use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::{error, info, warn};

use crate::{
    chain::{await_receipt, call_and_decode, ChainClient, Receipt},
    constants::DEFAULT_CONFIRMATION_TIMEOUT,
    errors::ScriptError,
    plan::{lookup, ConstructorArg, DeploymentPlan, Grantee, PlanStep, RoleTarget, StepAction},
    registry::ContractRegistry,
    roles::{first_failure, RoleProvisioner},
    solidity::IOverlayToken::{balanceOfCall, mintCall, totalSupplyCall, transferCall},
    types::{
        ActionRecord, CompletedStep, DeployedContract, DeploymentResult, NetworkId, Role,
        RoleGrant, SkippedStep, StepOutcome,
    },
};

/// Options controlling a plan run
#[derive(Clone, Debug)]
pub struct OrchestratorOptions {
    /// How long to wait for each transaction to confirm
    pub confirmation_timeout: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }
}

/// Executes deployment plans against a chain, recording progress in a registry
pub struct Orchestrator<'a> {
    /// The client transactions are sent through
    client: &'a dyn ChainClient,
    /// The registry of deployed contracts
    registry: &'a mut ContractRegistry,
    /// Run options
    options: OrchestratorOptions,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator
    pub fn new(
        client: &'a dyn ChainClient,
        registry: &'a mut ContractRegistry,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            client,
            registry,
            options,
        }
    }

    /// Run `plan` to completion or until the first failing step
    ///
    /// Returns `Err` only if the plan itself is invalid, in which case nothing
    /// was sent. Step failures are reported through the returned result.
    pub async fn run(&mut self, plan: &DeploymentPlan) -> Result<DeploymentResult, ScriptError> {
        let order = plan.execution_order()?;
        let network = plan.network;
        info!(network = %network, steps = plan.steps.len(), "running deployment plan");

        let mut result = DeploymentResult::new(network);
        let mut resolved: HashMap<String, Address> = HashMap::new();
        let mut skipped: HashSet<&str> = HashSet::new();

        for idx in order {
            let step = &plan.steps[idx];

            if let Some(reason) = skip_reason(step, &skipped) {
                info!(step = %step.name, reason = %reason, "skipping step");
                skipped.insert(step.name.as_str());
                result.skipped_steps.push(SkippedStep {
                    name: step.name.clone(),
                    reason,
                });
                continue;
            }

            match self.execute_step(step, network, &resolved).await {
                Ok(outcome) => {
                    let completed = CompletedStep {
                        name: step.name.clone(),
                        outcome,
                    };
                    if let Some(contract) = completed.contract() {
                        resolved.insert(step.name.clone(), contract.address);
                    }
                    result.completed_steps.push(completed);
                }
                Err(e) => {
                    error!(step = %step.name, error = %e, "step failed, halting plan");
                    result.failed_step = Some(step.name.clone());
                    result.error = Some(e);
                    break;
                }
            }
        }

        Ok(result)
    }

    /// Execute a single step
    async fn execute_step(
        &mut self,
        step: &PlanStep,
        network: NetworkId,
        resolved: &HashMap<String, Address>,
    ) -> Result<StepOutcome, ScriptError> {
        match &step.action {
            StepAction::Deploy { artifact, args } => {
                self.deploy(&step.name, network, artifact, args, resolved)
                    .await
            }
            StepAction::GrantRoles { grants } => self.grant_roles(grants, resolved).await,
            StepAction::MintSupply { token, amount } => {
                let address = lookup(resolved, token)?;
                self.mint_supply(&step.name, network, (token.as_str(), address), *amount)
                    .await
            }
            StepAction::Transfer {
                token,
                recipient,
                amount,
            } => {
                let token = lookup(resolved, token)?;
                let recipient = lookup(resolved, recipient)?;
                self.transfer(&step.name, network, token, recipient, *amount)
                    .await
            }
        }
    }

    /// Deploy a contract unless the registry already records one for the step
    async fn deploy(
        &mut self,
        name: &str,
        network: NetworkId,
        artifact: &str,
        args: &[ConstructorArg],
        resolved: &HashMap<String, Address>,
    ) -> Result<StepOutcome, ScriptError> {
        if let Some(existing) = self.registry.get(network, name) {
            info!(step = name, address = %existing.address, "already deployed, reusing");
            return Ok(StepOutcome::AlreadyDeployed(existing.clone()));
        }

        let args = args
            .iter()
            .map(|arg| arg.resolve(resolved))
            .collect::<Result<Vec<_>, _>>()?;

        info!(step = name, artifact, "deploying contract");
        let tx = self.client.deploy_contract(artifact, &args).await?;
        let receipt = await_receipt(self.client, tx, self.options.confirmation_timeout).await?;
        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractDeployment(format!(
                "receipt of {:#x} has no contract address",
                receipt.tx_hash
            ))
        })?;

        let contract = DeployedContract {
            logical_name: name.to_string(),
            artifact: artifact.to_string(),
            address,
            network,
            transaction_hash: Some(receipt.tx_hash),
        };
        self.registry
            .put(network, name, contract.clone())
            .map_err(|e| match e {
                ScriptError::WriteDeployments(msg) => ScriptError::WriteDeployments(format!(
                    "{name} deployed at {address:#x} but not recorded: {msg}"
                )),
                e => e,
            })?;

        info!(step = name, address = %address, tx = %receipt.tx_hash, "contract deployed");
        Ok(StepOutcome::Deployed(contract))
    }

    /// Reconcile the step's role targets, failing if any does not hold afterwards
    async fn grant_roles(
        &self,
        targets: &[RoleTarget],
        resolved: &HashMap<String, Address>,
    ) -> Result<StepOutcome, ScriptError> {
        let grants = targets
            .iter()
            .map(|target| self.resolve_grant(target, resolved))
            .collect::<Result<Vec<_>, _>>()?;

        let results = self.provisioner().reconcile(&grants).await;
        if let Some(e) = first_failure(&results) {
            return Err(e);
        }

        Ok(StepOutcome::RolesReconciled(results))
    }

    /// Mint the initial supply to the deployer
    ///
    /// The deployer holds the minter role only while minting: whatever the
    /// supply was, and whether or not the mint succeeded, the role is revoked
    /// before the step returns.
    async fn mint_supply(
        &mut self,
        name: &str,
        network: NetworkId,
        (token_name, token): (&str, Address),
        amount: U256,
    ) -> Result<StepOutcome, ScriptError> {
        if self.registry.action(network, name).is_some() {
            info!(step = name, "initial supply already minted");
            return Ok(StepOutcome::AlreadyApplied);
        }

        let deployer_minter = |granted| RoleGrant {
            contract_name: token_name.to_string(),
            contract: token,
            role: Role::Minter,
            grantee: self.client.sender(),
            granted,
        };

        let supply: U256 =
            call_and_decode(self.client, token, totalSupplyCall {}.abi_encode()).await?;

        let mut transaction_hash = None;
        let minted = if supply.is_zero() {
            let mint = self.grant_and_mint(deployer_minter(true), amount).await;
            let revoke = self.reconcile_all(&[deployer_minter(false)]).await;

            let receipt = match (mint, revoke) {
                (Ok(receipt), Ok(())) => receipt,
                (Err(e), revoke) => {
                    if let Err(revoke_err) = revoke {
                        error!(step = name, error = %revoke_err, "failed to revoke deployer minter role");
                    }
                    return Err(e);
                }
                (Ok(_), Err(e)) => return Err(e),
            };
            info!(step = name, amount = %amount, tx = %receipt.tx_hash, "minted initial supply");

            transaction_hash = Some(receipt.tx_hash);
            amount
        } else {
            warn!(step = name, supply = %supply, "token already has supply, not minting");
            self.reconcile_all(&[deployer_minter(false)]).await?;
            U256::ZERO
        };

        self.registry
            .record_action(network, name, ActionRecord { transaction_hash })?;

        Ok(StepOutcome::Minted { amount: minted })
    }

    /// Grant the deployer the minter role and mint `amount` to it
    async fn grant_and_mint(
        &self,
        deployer_minter: RoleGrant,
        amount: U256,
    ) -> Result<Receipt, ScriptError> {
        let token = deployer_minter.contract;
        self.reconcile_all(&[deployer_minter]).await?;

        let tx = self
            .client
            .send_transaction(token, mintCall { amount }.abi_encode().into())
            .await?;
        await_receipt(self.client, tx, self.options.confirmation_timeout).await
    }

    /// Transfer `amount` of `token` from the deployer to `recipient`
    async fn transfer(
        &mut self,
        name: &str,
        network: NetworkId,
        token: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<StepOutcome, ScriptError> {
        if self.registry.action(network, name).is_some() {
            info!(step = name, "transfer already applied");
            return Ok(StepOutcome::AlreadyApplied);
        }

        // Covers a transfer that confirmed before the journal entry was written
        let balance: U256 = call_and_decode(
            self.client,
            token,
            balanceOfCall { account: recipient }.abi_encode(),
        )
        .await?;
        if balance >= amount {
            info!(step = name, balance = %balance, "recipient already funded");
            self.registry.record_action(
                network,
                name,
                ActionRecord {
                    transaction_hash: None,
                },
            )?;
            return Ok(StepOutcome::AlreadyApplied);
        }

        let calldata = transferCall {
            to: recipient,
            amount,
        }
        .abi_encode();
        let tx = self.client.send_transaction(token, calldata.into()).await?;
        let receipt = await_receipt(self.client, tx, self.options.confirmation_timeout).await?;
        self.registry.record_action(
            network,
            name,
            ActionRecord {
                transaction_hash: Some(receipt.tx_hash),
            },
        )?;

        info!(step = name, recipient = %recipient, amount = %amount, "transferred tokens");
        Ok(StepOutcome::Transferred { recipient, amount })
    }

    /// Reconcile `grants`, failing on the first one that does not hold
    async fn reconcile_all(&self, grants: &[RoleGrant]) -> Result<(), ScriptError> {
        let results = self.provisioner().reconcile(grants).await;
        match first_failure(&results) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Resolve a role target against the addresses deployed so far
    fn resolve_grant(
        &self,
        target: &RoleTarget,
        resolved: &HashMap<String, Address>,
    ) -> Result<RoleGrant, ScriptError> {
        let grantee = match &target.grantee {
            Grantee::Deployer => self.client.sender(),
            Grantee::Contract(name) => lookup(resolved, name)?,
            Grantee::Account(addr) => *addr,
        };

        Ok(RoleGrant {
            contract_name: target.contract.clone(),
            contract: lookup(resolved, &target.contract)?,
            role: target.role,
            grantee,
            granted: target.granted,
        })
    }

    /// A role provisioner sharing the orchestrator's client and timeout
    fn provisioner(&self) -> RoleProvisioner<'a> {
        RoleProvisioner::new(self.client, self.options.confirmation_timeout)
    }
}

/// Why a step must be skipped: it is unavailable, or one of its
/// dependencies was skipped
fn skip_reason(step: &PlanStep, skipped: &HashSet<&str>) -> Option<String> {
    if let Some(reason) = &step.unavailable {
        return Some(reason.clone());
    }

    step.depends_on
        .iter()
        .find(|dep| skipped.contains(dep.as_str()))
        .map(|dep| format!("dependency {dep} was skipped"))
}
