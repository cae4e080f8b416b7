use crate::core::types::Address;

/// Pseudo-address aggregator APIs use for a chain's native token.
pub const NATIVE_TOKEN_ADDRESS: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

/// ERC-20 allowance(address,address) function selector.
pub const ERC20_ALLOWANCE_SELECTOR: &str = "0xdd62ed3e";

// Native token as Address
lazy_static! {
    pub static ref NATIVE_TOKEN: Address = Address::new(NATIVE_TOKEN_ADDRESS).unwrap();
}

// Cache TTL in seconds
pub const PRICE_CACHE_TTL: u64 = 5;
pub const GAS_CACHE_TTL: u64 = 5;

// Provider call configuration
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 7_000;
pub const MAX_CALL_ATTEMPTS: u32 = 3;
pub const BASE_RETRY_DELAY_MS: u64 = 250;
pub const MAX_RETRY_DELAY_MS: u64 = 2_000;
pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;

// Aggregation configuration
pub const AGGREGATION_DEADLINE_MS: u64 = 10_000;
pub const MAX_INFLIGHT_PROVIDER_CALLS: usize = 64;

// Slippage
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50; // 0.5%
pub const MAX_SLIPPAGE_BPS: u16 = 1000; // 10%

// Node client
pub const NODE_TIMEOUT_SECS: u64 = 10;

// Gas source name for estimates taken straight from a chain node
pub const NODE_GAS_SOURCE: &str = "node";
