use crate::core::constants::ERC20_ALLOWANCE_SELECTOR;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{Address, ChainInfo};
use log::debug;
use num_bigint::BigUint;
use num_traits::One;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Minimal JSON-RPC client against one chain's node. The gateway only
/// reads from the chain (gas price, allowances, nonces); it never signs
/// or broadcasts anything.
pub struct EvmNodeClient {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl EvmNodeClient {
    pub fn new(url: &str, timeout_secs: u64) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    /// Current gas price in wei (`eth_gasPrice`).
    pub async fn gas_price(&self) -> GatewayResult<u128> {
        let hex = self.call("eth_gasPrice", json!([])).await?;
        parse_hex_u128(&hex)
    }

    /// Next transaction nonce for an account (`eth_getTransactionCount`).
    pub async fn nonce(&self, address: &Address) -> GatewayResult<u64> {
        let hex = self
            .call("eth_getTransactionCount", json!([address.as_str(), "latest"]))
            .await?;
        Ok(parse_hex_u128(&hex)? as u64)
    }

    /// ERC-20 allowance granted by `owner` to `spender` on `token`.
    /// The native token needs no approval, so it short-circuits to the
    /// maximum value.
    pub async fn allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> GatewayResult<BigUint> {
        if token.is_native() {
            return Ok(max_u256());
        }
        let data = allowance_calldata(owner, spender);
        let hex = self
            .call(
                "eth_call",
                json!([{ "to": token.as_str(), "data": data }, "latest"]),
            )
            .await?;
        parse_hex_biguint(&hex)
    }

    async fn call(&self, method: &str, params: Value) -> GatewayResult<String> {
        debug!("JSON-RPC {} -> {}", method, self.url);
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self.http.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(GatewayError::NodeError(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }
        let payload: RpcResponse = response.json().await?;
        if let Some(error) = payload.error {
            return Err(GatewayError::NodeError(format!(
                "{} failed: {} (code {})",
                method, error.message, error.code
            )));
        }
        payload
            .result
            .ok_or_else(|| GatewayError::NodeError(format!("{} returned no result", method)))
    }
}

/// One node client per configured chain, built from the chain list.
/// Clients are shared as `Arc` so fan-out tasks can own a handle.
pub struct NodePool {
    clients: HashMap<u64, Arc<EvmNodeClient>>,
}

impl NodePool {
    pub fn build(chain_list: &[ChainInfo], timeout_secs: u64) -> GatewayResult<Self> {
        let mut clients = HashMap::new();
        for info in chain_list {
            clients.insert(
                info.chain_id,
                Arc::new(EvmNodeClient::new(&info.node_url, timeout_secs)?),
            );
        }
        Ok(Self { clients })
    }

    pub fn for_chain(&self, chain_id: u64) -> GatewayResult<Arc<EvmNodeClient>> {
        self.clients
            .get(&chain_id)
            .cloned()
            .ok_or(GatewayError::ChainNotSupported(chain_id))
    }
}

fn allowance_calldata(owner: &Address, spender: &Address) -> String {
    let owner_word = pad_address_word(owner);
    let spender_word = pad_address_word(spender);
    format!("{}{}{}", ERC20_ALLOWANCE_SELECTOR, owner_word, spender_word)
}

fn pad_address_word(address: &Address) -> String {
    let hex = address.as_str().trim_start_matches("0x");
    format!("{:0>64}", hex)
}

fn parse_hex_u128(hex: &str) -> GatewayResult<u128> {
    let digits = hex.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|_| GatewayError::NodeError(format!("unparseable hex quantity: {}", hex)))
}

fn parse_hex_biguint(hex: &str) -> GatewayResult<BigUint> {
    let digits = hex.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(BigUint::from(0u32));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| GatewayError::NodeError(format!("unparseable hex quantity: {}", hex)))
}

fn max_u256() -> BigUint {
    (BigUint::one() << 256u32) - BigUint::one()
}
