use crate::core::{constants::*, error::GatewayResult, GatewayError};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub chains_path: String,
    pub providers_path: String,
    pub call_timeout_ms: u64,
    pub max_call_attempts: u32,
    pub aggregation_deadline_ms: u64,
    pub price_cache_ttl_secs: u64,
    pub gas_cache_ttl_secs: u64,
    pub default_slippage_bps: u16,
    pub max_slippage_bps: u16,
    pub max_inflight_calls: usize,
    pub node_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> GatewayResult<Self> {
        Ok(Self {
            chains_path: env::var("CHAINS_PATH").unwrap_or_else(|_| "config/chains.json".to_string()),
            providers_path: env::var("PROVIDERS_PATH")
                .unwrap_or_else(|_| "config/providers.json".to_string()),
            call_timeout_ms: env::var("CALL_TIMEOUT_MS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_CALL_TIMEOUT_MS),
            max_call_attempts: env::var("MAX_CALL_ATTEMPTS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(MAX_CALL_ATTEMPTS),
            aggregation_deadline_ms: env::var("AGGREGATION_DEADLINE_MS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(AGGREGATION_DEADLINE_MS),
            price_cache_ttl_secs: env::var("PRICE_CACHE_TTL_SECS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(PRICE_CACHE_TTL),
            gas_cache_ttl_secs: env::var("GAS_CACHE_TTL_SECS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(GAS_CACHE_TTL),
            default_slippage_bps: env::var("DEFAULT_SLIPPAGE_BPS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_SLIPPAGE_BPS),
            max_slippage_bps: env::var("MAX_SLIPPAGE_BPS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(MAX_SLIPPAGE_BPS),
            max_inflight_calls: env::var("MAX_INFLIGHT_CALLS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(MAX_INFLIGHT_PROVIDER_CALLS),
            node_timeout_secs: env::var("NODE_TIMEOUT_SECS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(NODE_TIMEOUT_SECS),
        })
    }

    pub fn validate(&self) -> GatewayResult<()> {
        if self.max_slippage_bps > 10000 {
            return Err(GatewayError::ConfigError(
                "Max slippage cannot exceed 100%".to_string(),
            ));
        }

        if self.default_slippage_bps > self.max_slippage_bps {
            return Err(GatewayError::ConfigError(
                "Default slippage cannot exceed max slippage".to_string(),
            ));
        }

        if self.call_timeout_ms == 0 {
            return Err(GatewayError::ConfigError(
                "Provider call timeout must be greater than 0".to_string(),
            ));
        }

        if self.aggregation_deadline_ms < self.call_timeout_ms {
            return Err(GatewayError::ConfigError(
                "Aggregation deadline cannot be shorter than a single call timeout".to_string(),
            ));
        }

        if self.max_inflight_calls == 0 {
            return Err(GatewayError::ConfigError(
                "Concurrency limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chains_path: "config/chains.json".to_string(),
            providers_path: "config/providers.json".to_string(),
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            max_call_attempts: MAX_CALL_ATTEMPTS,
            aggregation_deadline_ms: AGGREGATION_DEADLINE_MS,
            price_cache_ttl_secs: PRICE_CACHE_TTL,
            gas_cache_ttl_secs: GAS_CACHE_TTL,
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
            max_slippage_bps: MAX_SLIPPAGE_BPS,
            max_inflight_calls: MAX_INFLIGHT_PROVIDER_CALLS,
            node_timeout_secs: NODE_TIMEOUT_SECS,
        }
    }
}
