use crate::chains::{load_chain_list, ChainsService};
use crate::cli::ChainsArgs;
use crate::core::{Config, GatewayResult, OrderType};
use crate::providers::{load_descriptors, ProviderRegistry};
use colored::*;
use log::info;

pub async fn execute(args: ChainsArgs) -> GatewayResult<()> {
    let config = Config::from_env()?;
    config.validate()?;

    let chain_list = load_chain_list(&config.chains_path)?;
    let descriptors = load_descriptors(&config.providers_path)?;
    info!(
        "Loaded {} chain(s) and {} provider descriptor(s)",
        chain_list.len(),
        descriptors.len()
    );

    let registry = ProviderRegistry::new(descriptors)?;
    let service = ChainsService::build(chain_list, &registry);

    println!("{}", "🌐 Configured chains".bold().cyan());
    for chain in service.list_chains() {
        let providers = registry.active_providers(chain.chain_id, OrderType::Market);
        println!(
            "\n{} {} (chain {})",
            "•".bold(),
            chain.display_name.green().bold(),
            chain.chain_id
        );
        println!("   native token: {}", chain.native_token.symbol);
        if providers.is_empty() {
            println!("   providers: {}", "none".red());
        } else {
            println!("   providers: {}", providers.join(", ").yellow());
        }
        if args.detailed {
            for (name, provider_chain) in &chain.providers {
                if let Some(spender) = &provider_chain.market_order_spender {
                    println!("     {} market spender: {}", name, spender);
                }
                if let Some(spender) = &provider_chain.limit_order_spender {
                    println!("     {} limit spender:  {}", name, spender);
                }
            }
        }
    }

    Ok(())
}
