use crate::cache::{cache_key, SwapCache};
use crate::chains::ChainsService;
use crate::clients::NodePool;
use crate::core::config::Config;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{
    MetaPriceResult, MetaQuoteResult, OrderType, PriceRequest, ProviderError, Quote, QuoteRequest,
};
use crate::gas::GasService;
use crate::providers::{PriceQuery, ProviderRegistry, QuoteQuery};
use crate::resilience::{self, CallPolicy};
use futures::future::join_all;
use log::{debug, info, warn};
use num_traits::Zero;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Fan-out orchestrator: one request in, every eligible provider queried
/// concurrently, one ranked result out.
///
/// Provider outcomes are pure data. A provider can time out, error or
/// return garbage without affecting its peers; the ranked result is a
/// function of the set of outcomes, not of their arrival order.
pub struct MetaAggregationService {
    chains: Arc<ChainsService>,
    registry: Arc<ProviderRegistry>,
    gas: Arc<GasService>,
    nodes: Arc<NodePool>,
    cache: Arc<SwapCache>,
    policy: CallPolicy,
    deadline: Duration,
    price_ttl: Duration,
    limiter: Arc<Semaphore>,
    default_slippage_bps: u16,
    max_slippage_bps: u16,
}

impl MetaAggregationService {
    pub fn new(
        config: &Config,
        chains: Arc<ChainsService>,
        registry: Arc<ProviderRegistry>,
        gas: Arc<GasService>,
        nodes: Arc<NodePool>,
        cache: Arc<SwapCache>,
    ) -> Self {
        Self {
            chains,
            registry,
            gas,
            nodes,
            cache,
            policy: CallPolicy::from_config(config),
            deadline: Duration::from_millis(config.aggregation_deadline_ms),
            price_ttl: Duration::from_secs(config.price_cache_ttl_secs),
            limiter: Arc::new(Semaphore::new(config.max_inflight_calls)),
            default_slippage_bps: config.default_slippage_bps,
            max_slippage_bps: config.max_slippage_bps,
        }
    }

    /// Effective slippage: the caller's if given, capped at the configured
    /// maximum, or the default.
    fn effective_slippage(&self, requested: Option<u16>) -> u16 {
        match requested {
            Some(bps) if bps > self.max_slippage_bps => {
                warn!(
                    "Requested slippage {}bps exceeds maximum, capping at {}bps",
                    bps, self.max_slippage_bps
                );
                self.max_slippage_bps
            }
            Some(bps) => bps,
            None => self.default_slippage_bps,
        }
    }

    /// Query every provider active for the chain (optionally narrowed by
    /// the request) and rank the quotes best-first.
    pub async fn get_prices(&self, request: PriceRequest) -> GatewayResult<MetaPriceResult> {
        self.chains.resolve(request.chain_id)?;

        let active = self
            .registry
            .active_providers(request.chain_id, OrderType::Market);
        let selected: Vec<String> = match &request.providers {
            Some(requested) => active
                .into_iter()
                .filter(|name| requested.iter().any(|r| r == name))
                .map(str::to_string)
                .collect(),
            None => active.into_iter().map(str::to_string).collect(),
        };
        if selected.is_empty() {
            return Err(GatewayError::NoProvidersAvailable(request.chain_id));
        }

        let gas_price = self
            .resolve_gas_price(request.chain_id, request.gas_price)
            .await;
        let query = Arc::new(PriceQuery {
            chain_id: request.chain_id,
            sell_token: request.sell_token.clone(),
            buy_token: request.buy_token.clone(),
            sell_amount: request.sell_amount.clone(),
            gas_price,
            slippage_bps: Some(self.effective_slippage(request.slippage_bps)),
            taker_address: request.taker_address.clone(),
            fee_recipient: request.fee_recipient.clone(),
            buy_token_fee_bps: request.buy_token_fee_bps,
        });

        let mut dispatched = Vec::new();
        let mut tasks = Vec::new();
        for name in selected {
            let adapter = match self.registry.get(&name) {
                Ok(adapter) => adapter,
                Err(_) => {
                    debug!("No adapter registered for {}, skipping", name);
                    continue;
                }
            };
            dispatched.push(name.clone());

            let cache = self.cache.clone();
            let policy = self.policy.clone();
            let limiter = self.limiter.clone();
            let deadline = self.deadline;
            let ttl = self.price_ttl;
            let key = price_cache_key(&request, &name);
            let query = query.clone();
            tasks.push(tokio::spawn(async move {
                let outcome = timeout(deadline, async {
                    let _permit = limiter
                        .acquire_owned()
                        .await
                        .map_err(|_| ProviderError::upstream(&name, "concurrency limiter closed"))?;
                    cache
                        .get_or_fetch(&key, ttl, || {
                            resilience::execute(&policy, &name, || {
                                let adapter = adapter.clone();
                                let query = query.clone();
                                async move { adapter.get_swap_price(&query).await }
                            })
                        })
                        .await
                })
                .await;
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::timeout(&name, "aggregation deadline elapsed")),
                }
            }));
        }

        if dispatched.is_empty() {
            return Err(GatewayError::NoProvidersAvailable(request.chain_id));
        }

        let mut quotes = Vec::new();
        let mut errors = Vec::new();
        for (name, joined) in dispatched.iter().zip(join_all(tasks).await) {
            match joined {
                Ok(Ok(quote)) => {
                    // Liquidity that buys nothing is no liquidity
                    if quote.buy_amount.is_zero() {
                        errors.push(ProviderError::unsupported_pair(name, "zero buy amount"));
                    } else {
                        quotes.push(quote);
                    }
                }
                Ok(Err(error)) => errors.push(error),
                Err(_) => errors.push(ProviderError::upstream(name, "provider task failed")),
            }
        }

        let registry = &self.registry;
        rank_quotes(&mut quotes, |name| {
            registry.position(name).unwrap_or(usize::MAX)
        });
        let best = quotes.first().cloned();

        info!(
            "Aggregated prices for chain {}: {} quote(s), {} error(s), best={}",
            request.chain_id,
            quotes.len(),
            errors.len(),
            best.as_ref().map(|q| q.provider.as_str()).unwrap_or("none"),
        );
        Ok(MetaPriceResult {
            request,
            quotes,
            errors,
            best,
        })
    }

    /// Firm quote from one caller-selected provider, with transaction data
    /// enriched from the chain: allowance against the spender and the
    /// taker's next nonce. No fan-out.
    pub async fn get_quote(&self, request: QuoteRequest) -> GatewayResult<MetaQuoteResult> {
        self.chains.resolve(request.chain_id)?;
        let adapter = self.registry.get(&request.provider)?;
        let spender =
            self.registry
                .spender(&request.provider, request.chain_id, OrderType::Market)?;
        let gas_price = self
            .resolve_gas_price(request.chain_id, request.gas_price)
            .await;

        let query = Arc::new(QuoteQuery {
            chain_id: request.chain_id,
            sell_token: request.sell_token.clone(),
            buy_token: request.buy_token.clone(),
            sell_amount: request.sell_amount.clone(),
            gas_price,
            slippage_bps: Some(self.effective_slippage(request.slippage_bps)),
            taker_address: request.taker_address.clone(),
            fee_recipient: request.fee_recipient.clone(),
            buy_token_fee_bps: request.buy_token_fee_bps,
        });
        let mut quote = resilience::execute(&self.policy, &request.provider, || {
            let adapter = adapter.clone();
            let query = query.clone();
            async move { adapter.get_swap_quote(&query).await }
        })
        .await
        .map_err(GatewayError::Provider)?;

        let node = self.nodes.for_chain(request.chain_id)?;
        let allowance = node
            .allowance(&request.sell_token, &request.taker_address, &spender)
            .await?;
        let is_allowed = allowance >= request.sell_amount;
        if let Some(tx) = quote.transaction_data.as_mut() {
            tx.nonce = Some(node.nonce(&request.taker_address).await?);
        }

        Ok(MetaQuoteResult {
            quote,
            spender,
            is_allowed,
        })
    }

    /// Providers price swaps against a concrete gas price. Take the
    /// caller's, or the chain's base price; a node outage only costs the
    /// gas-awareness of the quotes, not the request.
    async fn resolve_gas_price(&self, chain_id: u64, requested: Option<u128>) -> u128 {
        if let Some(gas_price) = requested {
            return gas_price;
        }
        match self.gas.base_gas_price(chain_id).await {
            Ok(gas_price) => gas_price,
            Err(err) => {
                warn!(
                    "Falling back to zero gas price for chain {}: {}",
                    chain_id, err
                );
                0
            }
        }
    }
}

/// Total order over quotes: highest buy amount first, then cheapest gas,
/// then earliest provider in configuration order. Total because provider
/// ranks are distinct, which is what makes selection arrival-order
/// independent.
fn rank_quotes<F: Fn(&str) -> usize>(quotes: &mut [Quote], position: F) {
    quotes.sort_by(|a, b| {
        b.buy_amount
            .cmp(&a.buy_amount)
            .then_with(|| a.estimated_gas.cmp(&b.estimated_gas))
            .then_with(|| position(&a.provider).cmp(&position(&b.provider)))
    });
}

fn price_cache_key(request: &PriceRequest, provider: &str) -> String {
    let mut parts = vec![
        request.chain_id.to_string(),
        request.sell_token.to_string(),
        request.buy_token.to_string(),
        request.sell_amount.to_string(),
    ];
    if let Some(taker) = &request.taker_address {
        parts.push(taker.to_string());
    }
    if let Some(recipient) = &request.fee_recipient {
        parts.push(recipient.to_string());
        parts.push(request.buy_token_fee_bps.unwrap_or(0).to_string());
    }
    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
    cache_key(&format!("price:{}", provider), &refs)
}
