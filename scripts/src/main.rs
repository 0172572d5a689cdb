use clap::Parser;
use overlay_scripts::{cli::Cli, errors::ScriptError, utils::init_logging};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        network,
        deployments_path,
        command,
    } = Cli::parse();

    init_logging();

    command.run(network, deployments_path).await
}
