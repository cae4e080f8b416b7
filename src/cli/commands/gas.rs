use crate::chains::load_chain_list;
use crate::cli::GasArgs;
use crate::clients::NodePool;
use crate::core::{Config, GatewayResult};
use crate::utils::format_units;
use colored::*;
use log::info;
use num_bigint::BigUint;

pub async fn execute(args: GasArgs) -> GatewayResult<()> {
    let config = Config::from_env()?;
    config.validate()?;

    let chain_list = load_chain_list(&config.chains_path)?;
    let pool = NodePool::build(&chain_list, config.node_timeout_secs)?;
    let node = pool.for_chain(args.chain)?;

    info!("Querying gas price on chain {}", args.chain);
    let gas_price = node.gas_price().await?;
    let gwei = format_units(&BigUint::from(gas_price), 9);

    println!("{}", "⛽ Gas price".bold().cyan());
    println!(
        "   chain {}: {} gwei ({} wei)",
        args.chain,
        gwei.green().bold(),
        gas_price
    );

    Ok(())
}
