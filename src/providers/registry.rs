use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{Address, OrderType, ProviderDescriptor};
use crate::providers::AggregationProvider;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable lookup of configured providers.
///
/// Descriptors keep their configuration order, which later doubles as the
/// tie-break rank during quote selection. Adapters attach to descriptors
/// during startup; after that the registry is shared behind an `Arc` and a
/// reconfiguration builds a whole new registry instead of mutating this one.
pub struct ProviderRegistry {
    descriptors: Vec<ProviderDescriptor>,
    index: HashMap<String, usize>,
    adapters: HashMap<String, Arc<dyn AggregationProvider>>,
}

impl ProviderRegistry {
    pub fn new(descriptors: Vec<ProviderDescriptor>) -> GatewayResult<Self> {
        let mut index = HashMap::new();
        for (position, descriptor) in descriptors.iter().enumerate() {
            if index.insert(descriptor.name.clone(), position).is_some() {
                return Err(GatewayError::ConfigError(format!(
                    "duplicate provider name: {}",
                    descriptor.name
                )));
            }
        }
        Ok(Self {
            descriptors,
            index,
            adapters: HashMap::new(),
        })
    }

    /// Attach an adapter to its descriptor. Startup-time only.
    pub fn register(&mut self, adapter: Arc<dyn AggregationProvider>) -> GatewayResult<()> {
        let name = adapter.name().to_string();
        if !self.index.contains_key(&name) {
            return Err(GatewayError::UnknownProvider(name));
        }
        debug!("Registered adapter for provider {}", name);
        self.adapters.insert(name, adapter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> GatewayResult<Arc<dyn AggregationProvider>> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownProvider(name.to_string()))
    }

    pub fn descriptor(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.index.get(name).map(|position| &self.descriptors[*position])
    }

    pub fn descriptors(&self) -> &[ProviderDescriptor] {
        &self.descriptors
    }

    /// Rank of a provider in configuration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Providers able to serve the chain and order type, in configuration
    /// order. A provider qualifies only with a non-null spender.
    pub fn active_providers(&self, chain_id: u64, order_type: OrderType) -> Vec<&str> {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.supports(chain_id, order_type))
            .map(|descriptor| descriptor.name.as_str())
            .collect()
    }

    pub fn spender(
        &self,
        name: &str,
        chain_id: u64,
        order_type: OrderType,
    ) -> GatewayResult<Address> {
        let descriptor = self
            .descriptor(name)
            .ok_or_else(|| GatewayError::UnknownProvider(name.to_string()))?;
        descriptor
            .chains
            .get(&chain_id)
            .and_then(|chain| chain.spender(order_type))
            .cloned()
            .ok_or_else(|| GatewayError::SpenderNotFound {
                provider: name.to_string(),
                chain_id,
                order_type,
            })
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
