use crate::core::types::{OrderType, ProviderError};
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Chain {0} is not supported")]
    ChainNotSupported(u64),

    #[error("No providers available on chain {0}")]
    NoProvidersAvailable(u64),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("No {order_type} spender for provider {provider} on chain {chain_id}")]
    SpenderNotFound {
        provider: String,
        chain_id: u64,
        order_type: OrderType,
    },

    #[error("Provider call failed: {0}")]
    Provider(ProviderError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Node RPC error: {0}")]
    NodeError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for GatewayError {
    fn from(err: anyhow::Error) -> Self {
        GatewayError::Other(err.to_string())
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::Other(err.to_string())
    }
}
