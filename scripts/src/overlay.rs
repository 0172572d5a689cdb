//! The plan provisioning the Overlay protocol on a network
//!
//! One OVL token backs every market. Each price feed gets a Chainlink feed
//! contract and a position market, and the market is made a minter of the
//! token. Feeds without an oracle source on the target network are kept in
//! the plan but marked unavailable, so their feed, market and grant steps
//! are reported as skipped rather than silently dropped.

use alloy_primitives::{Address, U256};

use crate::{
    config::{DeployParams, NetworkConfig},
    constants::{
        CHAINLINK_FEED_ARTIFACT, CLAIM_ARTIFACT, CLAIM_STEP, FUND_CLAIM_STEP, MINT_SUPPLY_STEP,
        POSITION_MARKET_ARTIFACT, TOKEN_ARTIFACT, TOKEN_STEP,
    },
    errors::ScriptError,
    plan::{ConstructorArg, DeploymentPlan, Grantee, PlanStep, RoleTarget, StepAction},
    types::{NetworkId, Role},
};

/// The name of the feed deploy step for `symbol`
pub fn feed_step(symbol: &str) -> String {
    format!("{CHAINLINK_FEED_ARTIFACT}_{symbol}")
}

/// The name of the market deploy step for `symbol`
pub fn market_step(symbol: &str) -> String {
    format!("{POSITION_MARKET_ARTIFACT}_{symbol}")
}

/// The name of the step granting the `symbol` market the minter role
pub fn grant_minter_step(symbol: &str) -> String {
    format!("GrantMinter_{symbol}")
}

/// Build the full Overlay plan for `network`
pub fn overlay_plan(
    network: NetworkId,
    config: &NetworkConfig,
    params: &DeployParams,
) -> Result<DeploymentPlan, ScriptError> {
    let mut plan = DeploymentPlan::new(network)
        .step(PlanStep::deploy(
            TOKEN_STEP,
            TOKEN_ARTIFACT,
            vec![
                ConstructorArg::String(params.token_name.clone()),
                ConstructorArg::String(params.token_symbol.clone()),
            ],
        ))
        .step(
            PlanStep::new(
                MINT_SUPPLY_STEP,
                StepAction::MintSupply {
                    token: TOKEN_STEP.to_string(),
                    amount: params.initial_supply,
                },
            )
            .depends_on([TOKEN_STEP]),
        );

    for feed in config.feeds(network)? {
        let symbol = feed.symbol.as_str();
        let feed_name = feed_step(symbol);
        let market_name = market_step(symbol);

        let source = feed.source.unwrap_or(Address::ZERO);
        let mut feed_deploy = PlanStep::deploy(
            feed_name.clone(),
            CHAINLINK_FEED_ARTIFACT,
            vec![
                ConstructorArg::Address(source),
                ConstructorArg::Uint(U256::from(feed.rounds)),
            ],
        );
        if feed.source.is_none() {
            feed_deploy = feed_deploy.unavailable(format!("no {symbol} feed source on {network}"));
        }

        let market_deploy = PlanStep::deploy(
            market_name.clone(),
            POSITION_MARKET_ARTIFACT,
            vec![
                ConstructorArg::String(params.market_uri(symbol)),
                ConstructorArg::Contract(TOKEN_STEP.to_string()),
                ConstructorArg::Contract(feed_name.clone()),
            ],
        )
        .depends_on([TOKEN_STEP.to_string(), feed_name]);

        let grant = PlanStep::new(
            grant_minter_step(symbol),
            StepAction::GrantRoles {
                grants: vec![RoleTarget {
                    contract: TOKEN_STEP.to_string(),
                    role: Role::Minter,
                    grantee: Grantee::Contract(market_name.clone()),
                    granted: true,
                }],
            },
        )
        .depends_on([TOKEN_STEP.to_string(), market_name]);

        plan = plan.step(feed_deploy).step(market_deploy).step(grant);
    }

    let plan = plan
        .step(
            PlanStep::deploy(
                CLAIM_STEP,
                CLAIM_ARTIFACT,
                vec![
                    ConstructorArg::Contract(TOKEN_STEP.to_string()),
                    ConstructorArg::Uint(params.claim_amount),
                ],
            )
            .depends_on([TOKEN_STEP]),
        )
        .step(
            PlanStep::new(
                FUND_CLAIM_STEP,
                StepAction::Transfer {
                    token: TOKEN_STEP.to_string(),
                    recipient: CLAIM_STEP.to_string(),
                    amount: params.claim_funding,
                },
            )
            // Funding spends the minted supply
            .depends_on([TOKEN_STEP, CLAIM_STEP, MINT_SUPPLY_STEP]),
        );

    Ok(plan)
}
