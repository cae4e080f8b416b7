use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{Address, ProviderChainConfig, ProviderDescriptor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Descriptor file entry as shipped in config: per-chain spenders are a
/// flat list instead of the map the registry works with.
#[derive(Debug, Deserialize)]
struct RawDescriptor {
    name: String,
    display_name: String,
    spenders: Vec<RawSpender>,
}

#[derive(Debug, Deserialize)]
struct RawSpender {
    chain_id: u64,
    market_order: Option<Address>,
    limit_order: Option<Address>,
}

impl From<RawDescriptor> for ProviderDescriptor {
    fn from(raw: RawDescriptor) -> Self {
        let mut chains = BTreeMap::new();
        for spender in raw.spenders {
            chains.insert(
                spender.chain_id,
                ProviderChainConfig {
                    market_order_spender: spender.market_order,
                    limit_order_spender: spender.limit_order,
                },
            );
        }
        ProviderDescriptor {
            name: raw.name,
            display_name: raw.display_name,
            chains,
        }
    }
}

/// Parse a JSON array of provider descriptors.
pub fn parse_descriptors(raw: &str) -> GatewayResult<Vec<ProviderDescriptor>> {
    let raw_descriptors: Vec<RawDescriptor> = serde_json::from_str(raw)?;
    Ok(raw_descriptors.into_iter().map(Into::into).collect())
}

/// Load provider descriptors from a config file.
pub fn load_descriptors(path: impl AsRef<Path>) -> GatewayResult<Vec<ProviderDescriptor>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|err| {
        GatewayError::ConfigError(format!("cannot read {}: {}", path.display(), err))
    })?;
    parse_descriptors(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::OrderType;

    const SAMPLE: &str = r#"[
        {
            "name": "zerox",
            "display_name": "0x",
            "spenders": [
                {
                    "chain_id": 1,
                    "market_order": "0xDEF1C0DED9BEC7F1A1670819833240F027B25EFF",
                    "limit_order": "0xdef1c0ded9bec7f1a1670819833240f027b25eff"
                },
                {
                    "chain_id": 137,
                    "market_order": "0xdef1c0ded9bec7f1a1670819833240f027b25eff",
                    "limit_order": null
                }
            ]
        },
        {
            "name": "oneinch",
            "display_name": "1inch",
            "spenders": [
                {
                    "chain_id": 1,
                    "market_order": "0x1111111254eeb25477b68fb85ed929f73a960582",
                    "limit_order": null
                }
            ]
        }
    ]"#;

    #[test]
    fn test_parse_descriptors() {
        let descriptors = parse_descriptors(SAMPLE).unwrap();
        assert_eq!(descriptors.len(), 2);

        let zerox = &descriptors[0];
        assert_eq!(zerox.name, "zerox");
        assert_eq!(zerox.display_name, "0x");
        assert!(zerox.supports(1, OrderType::Market));
        assert!(zerox.supports(1, OrderType::Limit));
        assert!(zerox.supports(137, OrderType::Market));
        // null spender means the order type is off on that chain
        assert!(!zerox.supports(137, OrderType::Limit));

        // addresses come out normalized
        let spender = zerox.chains[&1].market_order_spender.as_ref().unwrap();
        assert_eq!(spender.as_str(), "0xdef1c0ded9bec7f1a1670819833240f027b25eff");
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        let raw = r#"[{"name": "x", "display_name": "X", "spenders": [
            {"chain_id": 1, "market_order": "not-an-address", "limit_order": null}
        ]}]"#;
        assert!(parse_descriptors(raw).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_descriptors("does/not/exist.json").unwrap_err();
        assert!(matches!(err, GatewayError::ConfigError(_)));
    }
}
