use alloy_primitives::Address;
use eyre::Result;
use overlay_scripts::{
    constants::TOKEN_STEP,
    errors::ScriptError,
    overlay::market_step,
    registry::ContractRegistry,
    types::{DeployedContract, NetworkId},
};
use tempfile::tempdir;
use tests::{
    mock_chain::Failure,
    utils::{builtin_plan, global_setup, run_plan},
};

#[tokio::test]
async fn test_rerun_from_deployments_file_sends_nothing() -> Result<()> {
    let chain = global_setup();
    let dir = tempdir()?;
    let path = dir.path().join("deployments.json");
    let plan = builtin_plan(NetworkId::Mainnet)?;

    let first = {
        let mut registry = ContractRegistry::open(&path)?;
        run_plan(&chain, &mut registry, &plan).await?
    };
    assert!(first.is_success());
    let sent = chain.transaction_count();

    let mut reopened = ContractRegistry::open(&path)?;
    assert_eq!(reopened.all(NetworkId::Mainnet).len(), 10);

    let second = run_plan(&chain, &mut reopened, &plan).await?;
    assert!(second.is_success());
    assert_eq!(chain.transaction_count(), sent);
    assert_eq!(first.addresses(), second.addresses());

    Ok(())
}

#[tokio::test]
async fn test_resume_from_deployments_file() -> Result<()> {
    let chain = global_setup();
    let dir = tempdir()?;
    let path = dir.path().join("deployments.json");
    let plan = builtin_plan(NetworkId::MainnetFork)?;

    chain.fail_next_deploy("OVLFPosition", Failure::Revert);
    let halted = {
        let mut registry = ContractRegistry::open(&path)?;
        run_plan(&chain, &mut registry, &plan).await?
    };
    assert_eq!(
        halted.failed_step.as_deref(),
        Some(market_step("BTCUSD").as_str())
    );

    let mut registry = ContractRegistry::open(&path)?;
    let resumed = run_plan(&chain, &mut registry, &plan).await?;

    assert!(resumed.is_success());
    assert_eq!(
        resumed.addresses()[TOKEN_STEP],
        halted.addresses()[TOKEN_STEP]
    );
    assert_eq!(
        chain
            .deployed_artifacts()
            .iter()
            .filter(|a| *a == "OVLToken")
            .count(),
        1
    );

    Ok(())
}

#[test]
fn test_conflicting_record_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("deployments.json");
    let record = |address| DeployedContract {
        logical_name: TOKEN_STEP.to_string(),
        artifact: "OVLToken".to_string(),
        address,
        network: NetworkId::Kovan,
        transaction_hash: None,
    };

    let original = Address::repeat_byte(0x11);
    let mut registry = ContractRegistry::open(&path)?;
    registry.put(NetworkId::Kovan, TOKEN_STEP, record(original))?;

    let err = registry
        .put(NetworkId::Kovan, TOKEN_STEP, record(Address::repeat_byte(0x22)))
        .unwrap_err();
    assert!(matches!(err, ScriptError::DuplicateRecord(_)));

    // The file still holds the original record
    let reopened = ContractRegistry::open(&path)?;
    assert_eq!(
        reopened.get(NetworkId::Kovan, TOKEN_STEP).unwrap().address,
        original
    );

    Ok(())
}
