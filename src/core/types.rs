use crate::core::error::{GatewayError, GatewayResult};
use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lowercase hex EVM address. Normalized on construction so addresses
/// compare and hash consistently regardless of input casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    pub fn new(raw: &str) -> GatewayResult<Self> {
        let lower = raw.to_ascii_lowercase();
        let hex = lower
            .strip_prefix("0x")
            .ok_or_else(|| GatewayError::InvalidAddress(raw.to_string()))?;
        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(GatewayError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(lower))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sentinel address used by aggregator APIs for the chain's native token.
    pub fn is_native(&self) -> bool {
        self == &*crate::core::constants::NATIVE_TOKEN
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::new(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Address::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "market_order"),
            OrderType::Limit => write!(f, "limit_order"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Per-chain spender contracts for one provider. A missing spender means
/// the provider does not support that order type on the chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderChainConfig {
    pub market_order_spender: Option<Address>,
    pub limit_order_spender: Option<Address>,
}

impl ProviderChainConfig {
    pub fn spender(&self, order_type: OrderType) -> Option<&Address> {
        match order_type {
            OrderType::Market => self.market_order_spender.as_ref(),
            OrderType::Limit => self.limit_order_spender.as_ref(),
        }
    }
}

/// Static descriptor of one aggregation provider: its identity and the
/// chains it can serve. Loaded once at startup, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub display_name: String,
    pub chains: BTreeMap<u64, ProviderChainConfig>,
}

impl ProviderDescriptor {
    pub fn supports(&self, chain_id: u64, order_type: OrderType) -> bool {
        self.chains
            .get(&chain_id)
            .map(|chain| chain.spender(order_type).is_some())
            .unwrap_or(false)
    }

    pub fn supported_chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.chains.keys().copied()
    }
}

/// Entry of the externally supplied chain list. Authoritative for chain
/// existence; provider availability is merged in by the chains service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: String,
    pub display_name: String,
    pub node_url: String,
    pub eip1559: bool,
    pub native_token: TokenInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub chain_id: u64,
    pub name: String,
    pub display_name: String,
    pub node_url: String,
    pub eip1559: bool,
    pub native_token: TokenInfo,
    pub providers: BTreeMap<String, ProviderChainConfig>,
}

impl Chain {
    pub fn from_info(info: ChainInfo, providers: BTreeMap<String, ProviderChainConfig>) -> Self {
        Self {
            chain_id: info.chain_id,
            name: info.name,
            display_name: info.display_name,
            node_url: info.node_url,
            eip1559: info.eip1559,
            native_token: info.native_token,
            providers,
        }
    }
}

/// Transaction payload returned with a firm quote. The nonce is filled in
/// by the gateway from the node, not by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionData {
    pub to: Address,
    pub data: String,
    #[serde(with = "crate::utils::serde_amount")]
    pub value: BigUint,
    pub gas_price: u128,
    pub nonce: Option<u64>,
}

/// Normalized quote from one provider. Amounts are in token base units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub provider: String,
    pub chain_id: u64,
    pub sell_token: Address,
    pub buy_token: Address,
    #[serde(with = "crate::utils::serde_amount")]
    pub sell_amount: BigUint,
    #[serde(with = "crate::utils::serde_amount")]
    pub buy_amount: BigUint,
    /// buy_amount / sell_amount, normalized by token decimals.
    pub price: Decimal,
    pub estimated_gas: u64,
    pub gas_price: u128,
    /// Provider-specific route breakdown, passed through untouched.
    #[serde(default)]
    pub sources: serde_json::Value,
    pub transaction_data: Option<TransactionData>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Timeout,
    UpstreamError,
    UnsupportedPair,
    RateLimited,
}

impl ProviderErrorKind {
    /// A malformed payload or an unsupported pair will not fix itself on
    /// retry; only transient outcomes are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderErrorKind::Timeout | ProviderErrorKind::RateLimited)
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Timeout => write!(f, "timeout"),
            ProviderErrorKind::UpstreamError => write!(f, "upstream_error"),
            ProviderErrorKind::UnsupportedPair => write!(f, "unsupported_pair"),
            ProviderErrorKind::RateLimited => write!(f, "rate_limited"),
        }
    }
}

/// Failure of a single provider call, carried as data in aggregation
/// results rather than raised through the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderError {
    pub provider: String,
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(provider: &str, kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider: provider.to_string(),
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(provider: &str, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::Timeout, message)
    }

    pub fn upstream(provider: &str, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::UpstreamError, message)
    }

    pub fn unsupported_pair(provider: &str, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::UnsupportedPair, message)
    }

    pub fn rate_limited(provider: &str, message: impl Into<String>) -> Self {
        Self::new(provider, ProviderErrorKind::RateLimited, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}: {}", self.kind, self.provider, self.message)
    }
}

/// Inbound price request as handed over by the routing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub chain_id: u64,
    pub sell_token: Address,
    pub buy_token: Address,
    #[serde(with = "crate::utils::serde_amount")]
    pub sell_amount: BigUint,
    pub taker_address: Option<Address>,
    pub slippage_bps: Option<u16>,
    pub gas_price: Option<u128>,
    /// Restrict the fan-out to these providers; unknown names are dropped.
    pub providers: Option<Vec<String>>,
    /// Affiliate fee taken from the buy amount, forwarded to providers
    /// that support it.
    pub fee_recipient: Option<Address>,
    pub buy_token_fee_bps: Option<u16>,
}

/// Inbound quote request: one provider, firm transaction data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub chain_id: u64,
    pub sell_token: Address,
    pub buy_token: Address,
    #[serde(with = "crate::utils::serde_amount")]
    pub sell_amount: BigUint,
    pub taker_address: Address,
    pub provider: String,
    pub slippage_bps: Option<u16>,
    pub gas_price: Option<u128>,
    pub fee_recipient: Option<Address>,
    pub buy_token_fee_bps: Option<u16>,
}

/// Aggregated price response: every provider outcome, ranked best-first.
#[derive(Debug, Clone, Serialize)]
pub struct MetaPriceResult {
    pub request: PriceRequest,
    pub quotes: Vec<Quote>,
    pub errors: Vec<ProviderError>,
    pub best: Option<Quote>,
}

/// Firm quote response with the allowance state against the spender.
#[derive(Debug, Clone, Serialize)]
pub struct MetaQuoteResult {
    pub quote: Quote,
    pub spender: Address,
    pub is_allowed: bool,
}

/// Gas price brackets in wei. Every source must keep them ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasTiers {
    pub slow: u128,
    pub standard: u128,
    pub fast: u128,
}

impl GasTiers {
    pub fn is_ordered(&self) -> bool {
        self.slow <= self.standard && self.standard <= self.fast
    }

    /// Single-value estimate, used for legacy gas pricing where the node
    /// reports one price for all speeds.
    pub fn flat(gas_price: u128) -> Self {
        Self {
            slow: gas_price,
            standard: gas_price,
            fast: gas_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasEstimate {
    pub chain_id: u64,
    pub source: String,
    pub tiers: GasTiers,
    pub fetched_at: DateTime<Utc>,
}

/// Aggregated gas response. All successful estimates are kept so callers
/// can run their own consensus; `best` is the median by standard tier.
#[derive(Debug, Clone, Serialize)]
pub struct GasResult {
    pub chain_id: u64,
    pub estimates: Vec<GasEstimate>,
    pub errors: Vec<ProviderError>,
    pub best: Option<GasEstimate>,
}
