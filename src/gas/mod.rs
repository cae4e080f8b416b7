use crate::cache::{cache_key, SwapCache};
use crate::chains::ChainsService;
use crate::clients::NodePool;
use crate::core::config::Config;
use crate::core::constants::NODE_GAS_SOURCE;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{GasEstimate, GasResult, GasTiers, OrderType, ProviderError};
use crate::providers::ProviderRegistry;
use crate::resilience::{self, CallPolicy};
use chrono::Utc;
use futures::future::join_all;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Gas price aggregation across provider oracles and the chain's own node.
pub struct GasService {
    chains: Arc<ChainsService>,
    registry: Arc<ProviderRegistry>,
    nodes: Arc<NodePool>,
    cache: Arc<SwapCache>,
    policy: CallPolicy,
    deadline: Duration,
    ttl: Duration,
}

impl GasService {
    pub fn new(
        config: &Config,
        chains: Arc<ChainsService>,
        registry: Arc<ProviderRegistry>,
        nodes: Arc<NodePool>,
        cache: Arc<SwapCache>,
    ) -> Self {
        Self {
            chains,
            registry,
            nodes,
            cache,
            policy: CallPolicy::from_config(config),
            deadline: Duration::from_millis(config.aggregation_deadline_ms),
            ttl: Duration::from_secs(config.gas_cache_ttl_secs),
        }
    }

    /// Plain node gas price in wei, cached. Used as the default gas price
    /// for provider price queries.
    pub async fn base_gas_price(&self, chain_id: u64) -> GatewayResult<u128> {
        self.chains.resolve(chain_id)?;
        let key = cache_key("base_gas_price", &[&chain_id.to_string()]);
        self.cache
            .get_or_fetch(&key, self.ttl, || async {
                self.nodes.for_chain(chain_id)?.gas_price().await
            })
            .await
    }

    /// Fan out to every gas source for the chain and pick the median
    /// estimate by standard tier. All successful estimates are returned,
    /// so callers can run their own consensus.
    pub async fn get_gas(&self, chain_id: u64) -> GatewayResult<GasResult> {
        self.chains.resolve(chain_id)?;

        let mut dispatched = Vec::new();
        let mut tasks = Vec::new();

        for name in self.registry.active_providers(chain_id, OrderType::Market) {
            let adapter = match self.registry.get(name) {
                Ok(adapter) => adapter,
                Err(_) => {
                    debug!("No adapter registered for {}, skipping gas source", name);
                    continue;
                }
            };
            let name = name.to_string();
            dispatched.push(name.clone());

            let cache = self.cache.clone();
            let policy = self.policy.clone();
            let deadline = self.deadline;
            let ttl = self.ttl;
            let key = cache_key("gas", &[&chain_id.to_string(), &name]);
            tasks.push(tokio::spawn(async move {
                let outcome = timeout(
                    deadline,
                    cache.get_or_fetch(&key, ttl, || {
                        resilience::execute(&policy, &name, || {
                            let adapter = adapter.clone();
                            async move { adapter.get_gas(chain_id).await }
                        })
                    }),
                )
                .await;
                match outcome {
                    Ok(result) => result.and_then(|estimate| check_tiers(&name, estimate)),
                    Err(_) => Err(ProviderError::timeout(&name, "aggregation deadline elapsed")),
                }
            }));
        }

        if let Ok(node) = self.nodes.for_chain(chain_id) {
            dispatched.push(NODE_GAS_SOURCE.to_string());

            let cache = self.cache.clone();
            let policy = self.policy.clone();
            let deadline = self.deadline;
            let ttl = self.ttl;
            let key = cache_key("gas", &[&chain_id.to_string(), NODE_GAS_SOURCE]);
            tasks.push(tokio::spawn(async move {
                let outcome = timeout(
                    deadline,
                    cache.get_or_fetch(&key, ttl, || {
                        resilience::execute(&policy, NODE_GAS_SOURCE, || {
                            let node = node.clone();
                            async move {
                                match node.gas_price().await {
                                    Ok(gas_price) => Ok(GasEstimate {
                                        chain_id,
                                        source: NODE_GAS_SOURCE.to_string(),
                                        tiers: GasTiers::flat(gas_price),
                                        fetched_at: Utc::now(),
                                    }),
                                    Err(err) => Err(node_error(err)),
                                }
                            }
                        })
                    }),
                )
                .await;
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::timeout(
                        NODE_GAS_SOURCE,
                        "aggregation deadline elapsed",
                    )),
                }
            }));
        }

        if tasks.is_empty() {
            return Err(GatewayError::NoProvidersAvailable(chain_id));
        }

        let mut estimates = Vec::new();
        let mut errors = Vec::new();
        for (name, joined) in dispatched.iter().zip(join_all(tasks).await) {
            match joined {
                Ok(Ok(estimate)) => estimates.push(estimate),
                Ok(Err(error)) => errors.push(error),
                Err(_) => errors.push(ProviderError::upstream(name, "gas task failed")),
            }
        }

        estimates.sort_by(|a, b| {
            a.tiers
                .standard
                .cmp(&b.tiers.standard)
                .then_with(|| self.source_rank(&a.source).cmp(&self.source_rank(&b.source)))
        });
        // Lower middle for an even number of sources
        let best = if estimates.is_empty() {
            None
        } else {
            Some(estimates[(estimates.len() - 1) / 2].clone())
        };

        info!(
            "Aggregated gas for chain {}: {} estimate(s), {} error(s)",
            chain_id,
            estimates.len(),
            errors.len()
        );
        Ok(GasResult {
            chain_id,
            estimates,
            errors,
            best,
        })
    }

    /// Providers rank by configuration order; the node comes after them.
    fn source_rank(&self, source: &str) -> usize {
        self.registry.position(source).unwrap_or(self.registry.len())
    }
}

fn check_tiers(name: &str, estimate: GasEstimate) -> Result<GasEstimate, ProviderError> {
    if estimate.tiers.is_ordered() {
        Ok(estimate)
    } else {
        Err(ProviderError::upstream(
            name,
            format!(
                "inverted gas tiers: slow={} standard={} fast={}",
                estimate.tiers.slow, estimate.tiers.standard, estimate.tiers.fast
            ),
        ))
    }
}

/// Node failures enter the aggregate as provider errors. Transport-level
/// failures may be transient and stay retryable; RPC-level failures do not.
fn node_error(err: GatewayError) -> ProviderError {
    match err {
        GatewayError::NetworkError(message) => ProviderError::timeout(NODE_GAS_SOURCE, message),
        other => ProviderError::upstream(NODE_GAS_SOURCE, other.to_string()),
    }
}
