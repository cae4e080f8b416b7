use clap::{Parser, Subcommand};

pub mod commands;

#[derive(Parser)]
#[command(name = "metaswap")]
#[command(about = "Meta-aggregation gateway over DEX aggregator APIs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured chains and the providers active on them
    Chains(ChainsArgs),

    /// Fetch the current gas price for a chain
    Gas(GasArgs),
}

#[derive(Parser)]
pub struct ChainsArgs {
    /// Show per-chain spender addresses
    #[arg(short, long)]
    pub detailed: bool,
}

#[derive(Parser)]
pub struct GasArgs {
    /// Chain id to query
    #[arg(short, long)]
    pub chain: u64,
}
