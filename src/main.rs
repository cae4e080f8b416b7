use clap::Parser;
use metaswap::cli::{Cli, Commands};
use metaswap::core::GatewayError;

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    match cli.command {
        Commands::Chains(args) => {
            metaswap::cli::commands::chains::execute(args).await?;
        }
        Commands::Gas(args) => {
            metaswap::cli::commands::gas::execute(args).await?;
        }
    }

    Ok(())
}
