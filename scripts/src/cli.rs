//! Definitions of CLI arguments and commands for the provisioning scripts

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{check_roles, deploy, list_deployments, print_plan},
    constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_PATH},
    errors::ScriptError,
    types::NetworkId,
};

/// Deploy and provision the Overlay contracts
#[derive(Parser)]
pub struct Cli {
    /// The network to provision
    #[arg(short, long, env = "NETWORK", global = true, default_value = "kovan")]
    pub network: NetworkId,

    /// Path to the deployments file recording deployed contracts
    #[arg(short, long, global = true, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The provisioning commands
#[derive(Subcommand)]
pub enum Command {
    /// Run the deployment plan, resuming from the deployments file
    Deploy(DeployArgs),
    /// Print the deployment plan as JSON without touching the chain
    Plan(PlanArgs),
    /// List the contracts recorded for the network
    Deployments,
    /// Audit the minter role on the deployed token
    CheckRoles(RpcArgs),
}

impl Command {
    /// Run the command against `network`, recording into `deployments_path`
    pub async fn run(
        self,
        network: NetworkId,
        deployments_path: PathBuf,
    ) -> Result<(), ScriptError> {
        match self {
            Command::Deploy(args) => deploy(args, network, deployments_path).await,
            Command::Plan(args) => print_plan(args, network),
            Command::Deployments => list_deployments(network, deployments_path),
            Command::CheckRoles(args) => check_roles(args, network, deployments_path).await,
        }
    }
}

/// Connection to the network's RPC node
#[derive(Args)]
pub struct RpcArgs {
    /// Private key of the deployer
    #[arg(short, long, env = "PKEY", hide_env_values = true)]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL")]
    pub rpc_url: String,
}

/// Where the plan comes from, and the parameters of the built-in plan
#[derive(Args)]
pub struct PlanArgs {
    /// A JSON plan to run instead of the built-in Overlay plan
    #[arg(long)]
    pub plan_file: Option<PathBuf>,

    /// A JSON feed table replacing the built-in Chainlink feeds
    #[arg(long)]
    pub feeds_config: Option<PathBuf>,

    /// Initial token supply minted to the deployer, in tokens, decimals allowed
    #[arg(long)]
    pub initial_supply: Option<String>,

    /// Amount each account may claim from the faucet, in tokens, decimals allowed
    #[arg(long)]
    pub claim_amount: Option<String>,

    /// Amount transferred to the faucet, in tokens, decimals allowed
    #[arg(long)]
    pub claim_funding: Option<String>,
}

/// Run the deployment plan
#[derive(Args)]
pub struct DeployArgs {
    /// The RPC connection
    #[command(flatten)]
    pub rpc: RpcArgs,

    /// The plan to run
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Directory containing the compiled contract artifacts
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Seconds to wait for each transaction to confirm
    #[arg(long, default_value_t = 120)]
    pub confirmation_timeout_secs: u64,
}
