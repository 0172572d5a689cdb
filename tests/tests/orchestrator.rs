use alloy::dyn_abi::DynSolValue;
use alloy_sol_types::SolCall;
use eyre::Result;
use overlay_scripts::{
    config::whole_tokens,
    constants::{CLAIM_STEP, FUND_CLAIM_STEP, MINT_SUPPLY_STEP, TOKEN_STEP},
    errors::ScriptError,
    overlay::{feed_step, grant_minter_step, market_step},
    plan::{DeploymentPlan, PlanStep},
    registry::ContractRegistry,
    solidity::IOverlayToken::{mintCall, transferCall},
    types::{DeploymentResult, NetworkId, Role, StepOutcome},
};
use tests::{
    mock_chain::Failure,
    utils::{builtin_plan, global_setup, plan_with_feeds, run_plan, DEPLOYER},
};

const SYMBOLS: [&str; 4] = ["BTCUSD", "ETHUSD", "DAIUSD", "GAS"];

fn position(result: &DeploymentResult, name: &str) -> usize {
    result
        .completed_steps
        .iter()
        .position(|s| s.name == name)
        .unwrap_or_else(|| panic!("{name} did not complete"))
}

#[tokio::test]
async fn test_full_deploy() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = builtin_plan(NetworkId::MainnetFork)?;

    let result = run_plan(&chain, &mut registry, &plan).await?;

    assert!(result.is_success());
    assert!(result.skipped_steps.is_empty());
    assert_eq!(result.completed_steps.len(), plan.steps.len());

    // Token, 4 feeds, 4 markets and the faucet
    assert_eq!(registry.all(NetworkId::MainnetFork).len(), 10);
    assert_eq!(result.addresses().len(), 10);
    for (name, address) in result.addresses() {
        assert_eq!(registry.get(NetworkId::MainnetFork, &name).unwrap().address, address);
    }

    // Nothing is recorded for other networks
    assert!(registry.all(NetworkId::Mainnet).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_second_run_sends_nothing() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = builtin_plan(NetworkId::MainnetFork)?;

    let first = run_plan(&chain, &mut registry, &plan).await?;
    let sent = chain.transaction_count();
    assert!(sent > 0);

    let second = run_plan(&chain, &mut registry, &plan).await?;

    assert!(second.is_success());
    assert_eq!(chain.transaction_count(), sent);
    assert_eq!(first.addresses(), second.addresses());
    for step in &second.completed_steps {
        match &step.outcome {
            StepOutcome::AlreadyDeployed(_) | StepOutcome::AlreadyApplied => {}
            StepOutcome::RolesReconciled(results) => assert!(results.iter().all(|r| r.holds())),
            outcome => panic!("{} repeated work: {outcome:?}", step.name),
        }
    }

    Ok(())
}

#[tokio::test]
async fn test_dependencies_run_first() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = builtin_plan(NetworkId::Mainnet)?;

    let result = run_plan(&chain, &mut registry, &plan).await?;
    assert!(result.is_success());
    assert_eq!(result.completed_steps[0].name, TOKEN_STEP);

    let addresses = result.addresses();
    let token = addresses[TOKEN_STEP];
    for symbol in SYMBOLS {
        let feed = feed_step(symbol);
        let market = market_step(symbol);

        assert!(position(&result, &feed) < position(&result, &market));
        assert!(position(&result, &market) < position(&result, &grant_minter_step(symbol)));

        // Markets are constructed with the addresses their dependencies deployed to
        let args = chain.constructor_args(addresses[&market]).unwrap();
        assert_eq!(args[1], DynSolValue::Address(token));
        assert_eq!(args[2], DynSolValue::Address(addresses[&feed]));
    }
    assert!(position(&result, CLAIM_STEP) < position(&result, FUND_CLAIM_STEP));
    assert!(position(&result, MINT_SUPPLY_STEP) < position(&result, FUND_CLAIM_STEP));

    Ok(())
}

#[tokio::test]
async fn test_resume_after_revert() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = builtin_plan(NetworkId::MainnetFork)?;

    chain.fail_next_deploy("OVLFPosition", Failure::Revert);
    let first = run_plan(&chain, &mut registry, &plan).await?;

    let failed = market_step("BTCUSD");
    assert_eq!(first.failed_step.as_deref(), Some(failed.as_str()));
    assert!(matches!(first.error, Some(ScriptError::TransactionReverted(_))));
    let completed: Vec<_> = first.completed_steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        completed,
        vec![TOKEN_STEP, MINT_SUPPLY_STEP, feed_step("BTCUSD").as_str()]
    );

    // Only confirmed deployments are recorded
    assert_eq!(registry.all(NetworkId::MainnetFork).len(), 2);
    assert!(registry.get(NetworkId::MainnetFork, &failed).is_none());

    let second = run_plan(&chain, &mut registry, &plan).await?;
    assert!(second.is_success());
    assert_eq!(second.addresses()[TOKEN_STEP], first.addresses()[TOKEN_STEP]);
    assert_eq!(registry.all(NetworkId::MainnetFork).len(), 10);

    // Completed steps were not redone
    let deployed = chain.deployed_artifacts();
    assert_eq!(deployed.iter().filter(|a| *a == "OVLToken").count(), 1);
    assert_eq!(deployed.iter().filter(|a| *a == "OVLChainlinkFeed").count(), 4);

    Ok(())
}

#[tokio::test]
async fn test_timeout_halts_run() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = builtin_plan(NetworkId::MainnetFork)?;

    chain.fail_next_deploy("OVLClaim", Failure::Timeout);
    let result = run_plan(&chain, &mut registry, &plan).await?;

    assert_eq!(result.failed_step.as_deref(), Some(CLAIM_STEP));
    let error = result.error.clone().unwrap();
    assert!(matches!(error, ScriptError::Timeout(_)));
    assert!(error.is_inconclusive());
    assert!(!result.was_completed(FUND_CLAIM_STEP));
    assert!(registry.get(NetworkId::MainnetFork, CLAIM_STEP).is_none());

    let resumed = run_plan(&chain, &mut registry, &plan).await?;
    assert!(resumed.is_success());
    assert!(resumed.was_completed(FUND_CLAIM_STEP));

    Ok(())
}

#[tokio::test]
async fn test_rpc_failure_halts_run() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = builtin_plan(NetworkId::Mainnet)?;

    chain.fail_next_deploy("OVLToken", Failure::Rpc);
    let result = run_plan(&chain, &mut registry, &plan).await?;

    assert_eq!(result.failed_step.as_deref(), Some(TOKEN_STEP));
    assert!(matches!(
        result.error,
        Some(ScriptError::ChainCommunication(_))
    ));
    assert!(result.completed_steps.is_empty());
    assert_eq!(chain.transaction_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_kovan_without_btc_feed() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = plan_with_feeds(
        NetworkId::Kovan,
        r#"{"feeds": [
            {"symbol": "BTCUSD", "rounds": 8, "sources": {"kovan": ""}},
            {"symbol": "ETHUSD", "rounds": 8, "sources": {"kovan": "0x9326BFA02ADD2366b30bacB125260Af641031331"}}
        ]}"#,
    )?;

    let result = run_plan(&chain, &mut registry, &plan).await?;

    assert!(result.is_success());
    for step in [
        feed_step("BTCUSD"),
        market_step("BTCUSD"),
        grant_minter_step("BTCUSD"),
    ] {
        assert!(result.was_skipped(&step), "{step} was not skipped");
        assert!(registry.get(NetworkId::Kovan, &step).is_none());
    }
    assert_eq!(
        result.skipped_steps[0].reason,
        "no BTCUSD feed source on kovan"
    );
    assert_eq!(
        result.skipped_steps[1].reason,
        format!("dependency {} was skipped", feed_step("BTCUSD"))
    );

    // The rest of the plan is unaffected
    assert!(registry.get(NetworkId::Kovan, &market_step("ETHUSD")).is_some());
    assert!(result.was_completed(FUND_CLAIM_STEP));

    Ok(())
}

#[tokio::test]
async fn test_builtin_kovan_plan_skips_gas() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = builtin_plan(NetworkId::Kovan)?;

    let result = run_plan(&chain, &mut registry, &plan).await?;

    assert!(result.is_success());
    let skipped: Vec<_> = result.skipped_steps.iter().map(|s| s.name.clone()).collect();
    assert_eq!(
        skipped,
        vec![feed_step("GAS"), market_step("GAS"), grant_minter_step("GAS")]
    );
    assert_eq!(registry.all(NetworkId::Kovan).len(), 8);

    Ok(())
}

#[tokio::test]
async fn test_invalid_plan_sends_nothing() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = DeploymentPlan::new(NetworkId::Kovan)
        .step(PlanStep::deploy("a", "A", vec![]).depends_on(["c"]))
        .step(PlanStep::deploy("b", "B", vec![]))
        .step(PlanStep::deploy("c", "C", vec![]).depends_on(["a"]));

    let result = run_plan(&chain, &mut registry, &plan).await;

    let error = result.unwrap_err().downcast::<ScriptError>()?;
    assert!(matches!(error, ScriptError::Plan(_)));
    assert_eq!(chain.transaction_count(), 0);
    assert!(registry.all(NetworkId::Kovan).is_empty());

    Ok(())
}

#[tokio::test]
async fn test_supply_minted_and_faucet_funded_once() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = builtin_plan(NetworkId::Rinkeby)?;

    let result = run_plan(&chain, &mut registry, &plan).await?;
    let addresses = result.addresses();
    let (token, claim) = (addresses[TOKEN_STEP], addresses[CLAIM_STEP]);

    assert_eq!(chain.total_supply(token), whole_tokens(100_000));
    assert_eq!(chain.balance_of(token, claim), whole_tokens(10_000));
    assert_eq!(chain.balance_of(token, DEPLOYER), whole_tokens(90_000));

    // A fresh registry forgets the journal, but on-chain state still
    // prevents a second mint or transfer
    let mut fresh = ContractRegistry::in_memory();
    for contract in registry.all(NetworkId::Rinkeby) {
        fresh.put(NetworkId::Rinkeby, &contract.logical_name, contract.clone())?;
    }
    let rerun = run_plan(&chain, &mut fresh, &plan).await?;

    assert!(rerun.is_success());
    assert_eq!(chain.total_supply(token), whole_tokens(100_000));
    assert_eq!(chain.balance_of(token, claim), whole_tokens(10_000));

    Ok(())
}

#[tokio::test]
async fn test_failed_mint_revokes_deployer_minter() -> Result<()> {
    for failure in [Failure::Rpc, Failure::Revert, Failure::Timeout] {
        let chain = global_setup();
        let mut registry = ContractRegistry::in_memory();
        let plan = builtin_plan(NetworkId::Rinkeby)?;

        chain.fail_next_send(mintCall::SELECTOR, failure);
        let halted = run_plan(&chain, &mut registry, &plan).await?;

        assert_eq!(halted.failed_step.as_deref(), Some(MINT_SUPPLY_STEP), "{failure:?}");
        let token = halted.addresses()[TOKEN_STEP];
        assert!(!chain.has_role(token, Role::Minter, DEPLOYER), "{failure:?}");
        assert!(chain.total_supply(token).is_zero());
        assert!(registry.action(NetworkId::Rinkeby, MINT_SUPPLY_STEP).is_none());

        let resumed = run_plan(&chain, &mut registry, &plan).await?;
        assert!(resumed.is_success(), "{failure:?}");
        assert_eq!(chain.total_supply(token), whole_tokens(100_000));
        assert!(!chain.has_role(token, Role::Minter, DEPLOYER));
        assert!(registry.action(NetworkId::Rinkeby, MINT_SUPPLY_STEP).is_some());
    }

    Ok(())
}

#[tokio::test]
async fn test_reverted_transfer_is_not_journaled() -> Result<()> {
    let chain = global_setup();
    let mut registry = ContractRegistry::in_memory();
    let plan = builtin_plan(NetworkId::Rinkeby)?;

    chain.fail_next_send(transferCall::SELECTOR, Failure::Revert);
    let halted = run_plan(&chain, &mut registry, &plan).await?;

    assert_eq!(halted.failed_step.as_deref(), Some(FUND_CLAIM_STEP));
    assert!(matches!(halted.error, Some(ScriptError::TransactionReverted(_))));
    assert!(registry.action(NetworkId::Rinkeby, FUND_CLAIM_STEP).is_none());

    let addresses = halted.addresses();
    let (token, claim) = (addresses[TOKEN_STEP], addresses[CLAIM_STEP]);
    assert!(chain.balance_of(token, claim).is_zero());

    let resumed = run_plan(&chain, &mut registry, &plan).await?;
    assert!(resumed.is_success());
    assert!(resumed.was_completed(FUND_CLAIM_STEP));
    assert_eq!(chain.balance_of(token, claim), whole_tokens(10_000));
    assert_eq!(chain.balance_of(token, DEPLOYER), whole_tokens(90_000));

    Ok(())
}
