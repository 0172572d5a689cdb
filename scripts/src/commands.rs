//! Implementations of the provisioning commands

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::{info, warn};

use crate::{
    chain::ChainClient,
    cli::{DeployArgs, PlanArgs, RpcArgs},
    constants::{DEFAULT_ARTIFACTS_DIR, POSITION_MARKET_ARTIFACT, TOKEN_STEP},
    errors::ScriptError,
    orchestrator::{Orchestrator, OrchestratorOptions},
    registry::ContractRegistry,
    roles::RoleProvisioner,
    types::{NetworkId, Role, RoleGrant},
    utils::{load_plan, setup_client},
};

/// Run the deployment plan against `network`
///
/// Fails with the halting step's error if the run did not complete, so the
/// process exits non-zero exactly when a step failed.
pub async fn deploy(
    args: DeployArgs,
    network: NetworkId,
    deployments_path: PathBuf,
) -> Result<(), ScriptError> {
    // Plan errors surface before connecting to the node
    let plan = load_plan(&args.plan, network)?;
    plan.execution_order()?;

    let client = setup_client(&args.rpc, &args.artifacts_dir).await?;
    let mut registry = ContractRegistry::open(deployments_path)?;
    let options = OrchestratorOptions {
        confirmation_timeout: Duration::from_secs(args.confirmation_timeout_secs),
    };

    let result = Orchestrator::new(&client, &mut registry, options)
        .run(&plan)
        .await?;
    println!("{result}");

    match result.error {
        Some(e) => {
            if e.is_inconclusive() {
                warn!("outcome of the failed step is unknown, re-run to resume");
            }
            Err(e)
        }
        None => Ok(()),
    }
}

/// Print the plan for `network` as JSON, in execution order
pub fn print_plan(args: PlanArgs, network: NetworkId) -> Result<(), ScriptError> {
    let mut plan = load_plan(&args, network)?;
    let order = plan.execution_order()?;
    plan.steps = order.into_iter().map(|i| plan.steps[i].clone()).collect();

    let json = serde_json::to_string_pretty(&plan)
        .map_err(|e| ScriptError::Config(format!("error serializing plan: {e}")))?;
    println!("{json}");
    Ok(())
}

/// List the contracts recorded for `network`
pub fn list_deployments(network: NetworkId, deployments_path: PathBuf) -> Result<(), ScriptError> {
    let registry = ContractRegistry::open(deployments_path)?;
    let contracts = registry.all(network);
    if contracts.is_empty() {
        let path = registry.path().map(|p| p.display().to_string());
        println!(
            "No contracts recorded on {network} in {}",
            path.unwrap_or_default()
        );
        return Ok(());
    }

    for contract in contracts {
        println!(
            "{:<28} {:<18} {:#x}",
            contract.logical_name, contract.artifact, contract.address
        );
    }
    Ok(())
}

/// Check, without sending anything, that every recorded position market is
/// a minter of the token and the deployer is not
pub async fn check_roles(
    args: RpcArgs,
    network: NetworkId,
    deployments_path: PathBuf,
) -> Result<(), ScriptError> {
    let registry = ContractRegistry::open(deployments_path)?;
    let token = registry.get(network, TOKEN_STEP).ok_or_else(|| {
        ScriptError::Config(format!("no {TOKEN_STEP} recorded on {network}"))
    })?;

    let client = setup_client(&args, Path::new(DEFAULT_ARTIFACTS_DIR)).await?;
    let expectation = |grantee, granted| RoleGrant {
        contract_name: token.logical_name.clone(),
        contract: token.address,
        role: Role::Minter,
        grantee,
        granted,
    };

    let mut expected = vec![expectation(client.sender(), false)];
    expected.extend(
        registry
            .all(network)
            .into_iter()
            .filter(|c| c.artifact == POSITION_MARKET_ARTIFACT)
            .map(|market| expectation(market.address, true)),
    );

    // Timeout is unused, nothing is sent
    let provisioner = RoleProvisioner::new(&client, Duration::ZERO);
    let mut mismatches = Vec::new();
    for grant in &expected {
        let holds = provisioner.has_role(grant).await? == grant.granted;
        println!("[{}] {grant}", if holds { "ok" } else { "MISMATCH" });
        if !holds {
            mismatches.push(grant.to_string());
        }
    }

    if !mismatches.is_empty() {
        return Err(ScriptError::VerificationFailed(mismatches.join("; ")));
    }

    info!(checked = expected.len(), "minter roles match");
    Ok(())
}
