pub mod descriptor;
pub mod registry;

use crate::core::types::{Address, GasEstimate, OrderType, ProviderDescriptor, ProviderError, Quote};
use num_bigint::BigUint;

pub use descriptor::{load_descriptors, parse_descriptors};
pub use registry::ProviderRegistry;

/// Parameters for an indicative price lookup across providers.
#[derive(Debug, Clone)]
pub struct PriceQuery {
    pub chain_id: u64,
    pub sell_token: Address,
    pub buy_token: Address,
    pub sell_amount: BigUint,
    pub gas_price: u128,
    pub slippage_bps: Option<u16>,
    pub taker_address: Option<Address>,
    pub fee_recipient: Option<Address>,
    pub buy_token_fee_bps: Option<u16>,
}

/// Parameters for a firm quote. The taker is required because the
/// returned transaction data is built for that account.
#[derive(Debug, Clone)]
pub struct QuoteQuery {
    pub chain_id: u64,
    pub sell_token: Address,
    pub buy_token: Address,
    pub sell_amount: BigUint,
    pub gas_price: u128,
    pub slippage_bps: Option<u16>,
    pub taker_address: Address,
    pub fee_recipient: Option<Address>,
    pub buy_token_fee_bps: Option<u16>,
}

/// Capability contract every aggregator adapter implements.
///
/// Adapters normalize their upstream's response into `Quote`/`GasEstimate`
/// and map every failure, including "no liquidity", into a `ProviderError`
/// value. They never panic across this boundary.
#[async_trait::async_trait]
pub trait AggregationProvider: Send + Sync {
    fn descriptor(&self) -> &ProviderDescriptor;

    fn name(&self) -> &str {
        self.descriptor().name.as_str()
    }

    fn supports(&self, chain_id: u64, order_type: OrderType) -> bool {
        self.descriptor().supports(chain_id, order_type)
    }

    /// Indicative price for the pair. No transaction data.
    async fn get_swap_price(&self, query: &PriceQuery) -> Result<Quote, ProviderError>;

    /// Firm quote including the transaction payload for the taker.
    async fn get_swap_quote(&self, query: &QuoteQuery) -> Result<Quote, ProviderError>;

    /// Gas price estimate from the provider's own oracle.
    async fn get_gas(&self, chain_id: u64) -> Result<GasEstimate, ProviderError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::core::types::{GasTiers, ProviderChainConfig, TransactionData};
    use crate::utils::decimal_price;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    pub const SELL_TOKEN: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
    pub const BUY_TOKEN: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    pub const TAKER: &str = "0x00000000000000000000000000000000000000a1";
    pub const SPENDER: &str = "0xdef1c0ded9bec7f1a1670819833240f027b25eff";

    pub fn descriptor_on(name: &str, chain_ids: &[u64]) -> ProviderDescriptor {
        let mut chains = BTreeMap::new();
        for chain_id in chain_ids {
            chains.insert(
                *chain_id,
                ProviderChainConfig {
                    market_order_spender: Some(Address::new(SPENDER).unwrap()),
                    limit_order_spender: None,
                },
            );
        }
        ProviderDescriptor {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            chains,
        }
    }

    pub fn quote(provider: &str, chain_id: u64, buy_amount: u64, estimated_gas: u64) -> Quote {
        let sell_amount = BigUint::from(10u32).pow(18);
        let buy_amount = BigUint::from(buy_amount);
        Quote {
            provider: provider.to_string(),
            chain_id,
            sell_token: Address::new(SELL_TOKEN).unwrap(),
            buy_token: Address::new(BUY_TOKEN).unwrap(),
            price: decimal_price(&sell_amount, 18, &buy_amount, 6),
            sell_amount,
            buy_amount,
            estimated_gas,
            gas_price: 30_000_000_000,
            sources: serde_json::Value::Null,
            transaction_data: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn transaction_data() -> TransactionData {
        TransactionData {
            to: Address::new(SPENDER).unwrap(),
            data: "0xd9627aa4".to_string(),
            value: BigUint::from(0u32),
            gas_price: 30_000_000_000,
            nonce: None,
        }
    }

    pub fn gas_estimate(source: &str, chain_id: u64, standard: u128) -> GasEstimate {
        GasEstimate {
            chain_id,
            source: source.to_string(),
            tiers: GasTiers {
                slow: standard.saturating_sub(5),
                standard,
                fast: standard + 5,
            },
            fetched_at: Utc::now(),
        }
    }

    /// Scriptable provider: fixed outcomes, optional artificial latency,
    /// and call counters for dispatch assertions.
    pub struct MockProvider {
        descriptor: ProviderDescriptor,
        price_result: Result<Quote, ProviderError>,
        gas_result: Result<GasEstimate, ProviderError>,
        delay: Option<Duration>,
        pub price_calls: AtomicUsize,
        pub gas_calls: AtomicUsize,
    }

    impl MockProvider {
        pub fn new(name: &str, chain_ids: &[u64]) -> Self {
            Self {
                descriptor: descriptor_on(name, chain_ids),
                price_result: Ok(quote(name, chain_ids.first().copied().unwrap_or(1), 1000, 100_000)),
                gas_result: Ok(gas_estimate(name, chain_ids.first().copied().unwrap_or(1), 30)),
                delay: None,
                price_calls: AtomicUsize::new(0),
                gas_calls: AtomicUsize::new(0),
            }
        }

        pub fn with_price(mut self, quote: Quote) -> Self {
            self.price_result = Ok(quote);
            self
        }

        pub fn with_price_error(mut self, error: ProviderError) -> Self {
            self.price_result = Err(error);
            self
        }

        pub fn with_gas(mut self, estimate: GasEstimate) -> Self {
            self.gas_result = Ok(estimate);
            self
        }

        pub fn with_gas_error(mut self, error: ProviderError) -> Self {
            self.gas_result = Err(error);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait::async_trait]
    impl AggregationProvider for MockProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn get_swap_price(&self, _query: &PriceQuery) -> Result<Quote, ProviderError> {
            self.price_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.price_result.clone()
        }

        async fn get_swap_quote(&self, _query: &QuoteQuery) -> Result<Quote, ProviderError> {
            self.price_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.price_result.clone().map(|mut quote| {
                quote.transaction_data = Some(transaction_data());
                quote
            })
        }

        async fn get_gas(&self, _chain_id: u64) -> Result<GasEstimate, ProviderError> {
            self.gas_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.gas_result.clone()
        }
    }
}
