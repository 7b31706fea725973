use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::{
    errors::CustomError,
    models::{
        alkane::{AlkaneId, RawBalanceRecord},
        network_config::NetworkConfig,
    },
};

/// Protocol tag under which alkanes are indexed.
const ALKANES_PROTOCOL_TAG: &str = "1";

/// Contract opcode returning the token's image bytes.
const GET_DATA_OPCODE: &str = "1000";

/// Source of alkane balances and token images.
#[async_trait(?Send)]
pub trait AlkanesDataProvider: Send + Sync {
    /// All alkane balance records held by `address`, one per outpoint entry.
    async fn fetch_balances(
        &self,
        address: &str,
        network: &str,
    ) -> Result<Vec<RawBalanceRecord>, CustomError>;

    /// Image of a token as a URI the browser can display directly.
    async fn fetch_token_image(
        &self,
        token_id: &AlkaneId,
        network: &str,
    ) -> Result<String, CustomError>;
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Numbers come back as hex strings, decimal strings or plain JSON numbers
/// depending on the indexer version.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RpcNumber {
    Number(u64),
    Text(String),
}

impl RpcNumber {
    fn to_u128(&self) -> Option<u128> {
        match self {
            RpcNumber::Number(value) => Some(*value as u128),
            RpcNumber::Text(text) => parse_u128(text),
        }
    }
}

fn parse_u128(text: &str) -> Option<u128> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some("") => Some(0),
        Some(hex_digits) => u128::from_str_radix(hex_digits, 16).ok(),
        None => text.parse().ok(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct WalletResponse {
    #[serde(default)]
    outpoints: Vec<OutpointEntry>,
}

#[derive(Debug, Deserialize)]
struct OutpointEntry {
    #[serde(default)]
    runes: Vec<RuneEntry>,
}

#[derive(Debug, Deserialize)]
struct RuneEntry {
    rune: RuneInfo,
    balance: RpcNumber,
}

#[derive(Debug, Deserialize)]
struct RuneInfo {
    id: Option<RuneId>,
    #[serde(default)]
    name: String,
    symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RuneId {
    block: RpcNumber,
    tx: RpcNumber,
}

impl RuneId {
    /// Canonical decimal form so equal ids compare equal as strings.
    fn to_alkane_id(&self) -> Option<AlkaneId> {
        Some(AlkaneId::new(
            self.block.to_u128()?.to_string(),
            self.tx.to_u128()?.to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct SimulateResponse {
    execution: Option<SimulateExecution>,
}

#[derive(Debug, Deserialize)]
struct SimulateExecution {
    #[serde(default)]
    data: String,
    error: Option<String>,
}

fn records_from_wallet(response: WalletResponse) -> Vec<RawBalanceRecord> {
    response
        .outpoints
        .into_iter()
        .flat_map(|outpoint| outpoint.runes)
        .filter_map(|entry| {
            let Some(amount) = entry.balance.to_u128() else {
                log::warn!("Skipping rune entry {} with unreadable balance", entry.rune.name);
                return None;
            };
            Some(RawBalanceRecord {
                token_id: entry.rune.id.as_ref().and_then(RuneId::to_alkane_id),
                name: entry.rune.name,
                symbol: entry.rune.symbol.filter(|symbol| !symbol.is_empty()),
                amount,
            })
        })
        .collect()
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else if bytes.starts_with(b"<svg") || bytes.starts_with(b"<?xml") {
        "image/svg+xml"
    } else {
        "application/octet-stream"
    }
}

fn image_uri_from_data(data: &str) -> Result<String, CustomError> {
    let hex_digits = data.trim().trim_start_matches("0x");
    let bytes = hex::decode(hex_digits)
        .map_err(|e| CustomError::fetch(format!("Invalid image payload: {}", e)))?;

    if bytes.is_empty() {
        return Err(CustomError::fetch("Token has no image"));
    }

    Ok(format!(
        "data:{};base64,{}",
        sniff_mime(&bytes),
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    ))
}

/// JSON-RPC client for Sandshrew/Metashrew compatible endpoints.
#[derive(Clone, Debug)]
pub struct JsonRpcAlkanesClient {
    http_client: Client,
    networks: HashMap<String, NetworkConfig>,
}

impl JsonRpcAlkanesClient {
    pub fn new(
        networks: HashMap<String, NetworkConfig>,
        timeout: Duration,
    ) -> Result<Self, CustomError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CustomError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            networks,
        })
    }

    fn rpc_url(&self, network: &str) -> Result<&str, CustomError> {
        self.networks
            .get(network)
            .map(|config| config.rpc_url.as_str())
            .ok_or_else(|| CustomError::UnsupportedNetworkError(network.to_string()))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        network: &str,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, CustomError> {
        let url = self.rpc_url(network)?;
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        log::debug!("RPC -> {} {} {}", url, method, request.params);

        let response: RpcResponse<T> = self
            .http_client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CustomError::NetworkError(e.to_string()))?
            .error_for_status()
            .map_err(|e| CustomError::NetworkError(e.to_string()))?
            .json()
            .await
            .map_err(|e| CustomError::fetch(format!("Malformed {} response: {}", method, e)))?;

        if let Some(error) = response.error {
            log::debug!("RPC <- {} error {}: {}", method, error.code, error.message);
            return Err(CustomError::fetch(error.message));
        }

        response
            .result
            .ok_or_else(|| CustomError::fetch(format!("Empty {} response", method)))
    }
}

#[async_trait(?Send)]
impl AlkanesDataProvider for JsonRpcAlkanesClient {
    async fn fetch_balances(
        &self,
        address: &str,
        network: &str,
    ) -> Result<Vec<RawBalanceRecord>, CustomError> {
        let params = json!([{ "address": address, "protocolTag": ALKANES_PROTOCOL_TAG }]);
        let response: WalletResponse = self
            .call(network, "alkanes_protorunesbyaddress", params)
            .await?;

        Ok(records_from_wallet(response))
    }

    async fn fetch_token_image(
        &self,
        token_id: &AlkaneId,
        network: &str,
    ) -> Result<String, CustomError> {
        let params = json!([{
            "alkanes": [],
            "transaction": "0x",
            "block": "0x",
            "height": "20000",
            "txindex": 0,
            "target": { "block": token_id.block, "tx": token_id.tx },
            "inputs": [GET_DATA_OPCODE],
            "pointer": 0,
            "refundPointer": 0,
            "vout": 0,
        }]);
        let response: SimulateResponse = self.call(network, "alkanes_simulate", params).await?;

        let execution = response
            .execution
            .ok_or_else(|| CustomError::fetch("Simulation returned no execution"))?;
        if let Some(error) = execution.error.filter(|e| !e.is_empty()) {
            return Err(CustomError::fetch(error));
        }

        image_uri_from_data(&execution.data)
    }
}
