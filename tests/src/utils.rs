//! Helpers shared by the integration tests

use std::{sync::Once, time::Duration};

use alloy_primitives::{address, Address};
use eyre::Result;
use overlay_scripts::{
    config::{DeployParams, NetworkConfig},
    orchestrator::{Orchestrator, OrchestratorOptions},
    overlay::overlay_plan,
    plan::DeploymentPlan,
    registry::ContractRegistry,
    types::{DeploymentResult, NetworkId},
};
use tracing_subscriber::{fmt, EnvFilter};

use crate::mock_chain::MockChain;

// ---------------------
// | META TEST HELPERS |
// ---------------------

/// The account the mock chain sends from
pub const DEPLOYER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// The confirmation timeout used in tests
pub const TEST_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(1);

static TRACING_INIT: Once = Once::new();

/// Set up logging and an empty chain
pub fn global_setup() -> MockChain {
    TRACING_INIT.call_once(|| {
        fmt().with_env_filter(EnvFilter::from_default_env()).init();
    });

    MockChain::new(DEPLOYER)
}

// ----------------
// | PLAN HELPERS |
// ----------------

/// The Overlay plan for `network` with the built-in feed table
pub fn builtin_plan(network: NetworkId) -> Result<DeploymentPlan> {
    Ok(overlay_plan(
        network,
        &NetworkConfig::builtin(),
        &DeployParams::default(),
    )?)
}

/// The Overlay plan for `network` with the given feed table
pub fn plan_with_feeds(network: NetworkId, feeds_json: &str) -> Result<DeploymentPlan> {
    let config: NetworkConfig = serde_json::from_str(feeds_json)?;
    Ok(overlay_plan(network, &config, &DeployParams::default())?)
}

/// Run `plan` against `chain`, recording into `registry`
pub async fn run_plan(
    chain: &MockChain,
    registry: &mut ContractRegistry,
    plan: &DeploymentPlan,
) -> Result<DeploymentResult> {
    let options = OrchestratorOptions {
        confirmation_timeout: TEST_CONFIRMATION_TIMEOUT,
    };
    Ok(Orchestrator::new(chain, registry, options).run(plan).await?)
}
