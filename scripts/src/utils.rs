//! Utilities for the provisioning scripts

use std::{fs, path::Path};

use tracing_subscriber::EnvFilter;

use crate::{
    artifacts::ArtifactStore,
    chain::rpc_client::RpcChainClient,
    cli::{PlanArgs, RpcArgs},
    config::{parse_token_amount, DeployParams, NetworkConfig},
    errors::ScriptError,
    overlay::overlay_plan,
    plan::DeploymentPlan,
    types::NetworkId,
};

/// Install the global tracing subscriber, honoring `RUST_LOG` and
/// defaulting to `info`
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
}

/// Sets up the client through which transactions are sent, reading
/// deployment bytecode from `artifacts_dir`
pub async fn setup_client(
    rpc: &RpcArgs,
    artifacts_dir: &Path,
) -> Result<RpcChainClient, ScriptError> {
    RpcChainClient::connect(
        &rpc.priv_key,
        &rpc.rpc_url,
        ArtifactStore::new(artifacts_dir),
    )
    .await
}

/// Build the plan selected by the CLI arguments
///
/// A plan file is used as-is and must target `network`. Otherwise the
/// built-in Overlay plan is built from the feed table and amount overrides.
pub fn load_plan(args: &PlanArgs, network: NetworkId) -> Result<DeploymentPlan, ScriptError> {
    if let Some(path) = &args.plan_file {
        let plan = read_plan_file(path)?;
        if plan.network != network {
            return Err(ScriptError::Config(format!(
                "{} targets {}, not {network}",
                path.display(),
                plan.network
            )));
        }
        return Ok(plan);
    }

    let config = match &args.feeds_config {
        Some(path) => NetworkConfig::from_file(path)?,
        None => NetworkConfig::builtin(),
    };

    let mut params = DeployParams::default();
    if let Some(amount) = &args.initial_supply {
        params.initial_supply = parse_token_amount(amount)?;
    }
    if let Some(amount) = &args.claim_amount {
        params.claim_amount = parse_token_amount(amount)?;
    }
    if let Some(amount) = &args.claim_funding {
        params.claim_funding = parse_token_amount(amount)?;
    }
    if params.claim_funding > params.initial_supply {
        return Err(ScriptError::Config(format!(
            "faucet funding {} exceeds the initial supply {}",
            params.claim_funding, params.initial_supply
        )));
    }

    overlay_plan(network, &config, &params)
}

/// Read a JSON deployment plan
pub fn read_plan_file(path: &Path) -> Result<DeploymentPlan, ScriptError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ScriptError::Config(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| ScriptError::Config(format!("{}: {}", path.display(), e)))
}
