use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{Chain, ChainInfo};
use crate::providers::ProviderRegistry;
use log::info;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Load the externally supplied chain list from a config file.
pub fn load_chain_list(path: impl AsRef<Path>) -> GatewayResult<Vec<ChainInfo>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| {
        GatewayError::ConfigError(format!("cannot read {}: {}", path.display(), err))
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Per-chain metadata, built once at startup by merging the external chain
/// list with provider descriptors and shared read-only afterwards.
///
/// The external list is authoritative for which chains exist; each
/// provider's descriptor is authoritative for which of those it serves. A
/// provider/chain pairing shows up only when both agree.
pub struct ChainsService {
    chains: BTreeMap<u64, Chain>,
}

impl ChainsService {
    pub fn build(chain_list: Vec<ChainInfo>, registry: &ProviderRegistry) -> Self {
        let mut chains = BTreeMap::new();
        for info in chain_list {
            let mut providers = BTreeMap::new();
            for descriptor in registry.descriptors() {
                if let Some(config) = descriptor.chains.get(&info.chain_id) {
                    providers.insert(descriptor.name.clone(), config.clone());
                }
            }
            chains.insert(info.chain_id, Chain::from_info(info, providers));
        }
        info!("Chains service built with {} chain(s)", chains.len());
        Self { chains }
    }

    pub fn resolve(&self, chain_id: u64) -> GatewayResult<&Chain> {
        self.chains
            .get(&chain_id)
            .ok_or(GatewayError::ChainNotSupported(chain_id))
    }

    /// All supported chains, ordered by id.
    pub fn list_chains(&self) -> Vec<&Chain> {
        self.chains.values().collect()
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.chains.contains_key(&chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Address, TokenInfo};
    use crate::providers::mock::descriptor_on;

    fn chain_info(chain_id: u64, name: &str, symbol: &str) -> ChainInfo {
        ChainInfo {
            chain_id,
            name: name.to_string(),
            display_name: name.to_uppercase(),
            node_url: format!("https://rpc.{}.example", name),
            eip1559: chain_id == 1,
            native_token: TokenInfo {
                address: Address::new("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").unwrap(),
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals: 18,
            },
        }
    }

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new(vec![
            descriptor_on("zerox", &[1, 137]),
            descriptor_on("oneinch", &[1, 42161]),
        ])
        .unwrap()
    }

    #[test]
    fn test_merge_requires_both_sides() {
        let service = ChainsService::build(
            vec![chain_info(1, "eth", "ETH"), chain_info(137, "polygon", "MATIC")],
            &registry(),
        );

        let eth = service.resolve(1).unwrap();
        assert_eq!(eth.providers.len(), 2);
        assert!(eth.providers.contains_key("zerox"));
        assert!(eth.providers.contains_key("oneinch"));

        // oneinch does not list polygon, zerox does
        let polygon = service.resolve(137).unwrap();
        assert_eq!(polygon.providers.len(), 1);
        assert!(polygon.providers.contains_key("zerox"));

        // arbitrum is in oneinch's descriptor but not in the external
        // chain list, so it does not exist at all
        assert!(matches!(
            service.resolve(42161),
            Err(GatewayError::ChainNotSupported(42161))
        ));
    }

    #[test]
    fn test_chain_without_providers_still_exists() {
        let service = ChainsService::build(vec![chain_info(56, "bsc", "BNB")], &registry());
        let bsc = service.resolve(56).unwrap();
        assert!(bsc.providers.is_empty());
    }

    #[test]
    fn test_list_chains_ordered_by_id() {
        let service = ChainsService::build(
            vec![
                chain_info(137, "polygon", "MATIC"),
                chain_info(1, "eth", "ETH"),
                chain_info(56, "bsc", "BNB"),
            ],
            &registry(),
        );
        let ids: Vec<u64> = service.list_chains().iter().map(|c| c.chain_id).collect();
        assert_eq!(ids, vec![1, 56, 137]);
    }
}
