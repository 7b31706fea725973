use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::alkane::{AggregatedBalance, AlkaneId, RawBalanceRecord};

/// Wallet connection as reported by the browser's wallet provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConnection {
    pub connected: bool,
    pub address: Option<String>,
}

impl WalletConnection {
    /// Address of a connected wallet, if it has a non-empty one.
    pub fn usable_address(&self) -> Option<&str> {
        match self.address.as_deref() {
            Some(address) if self.connected && !address.is_empty() => Some(address),
            _ => None,
        }
    }
}

/// Image cache key. The network is part of the key so the same token on
/// two networks never shares an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageCacheKey {
    pub network: String,
    pub tx: String,
}

impl ImageCacheKey {
    pub fn new(network: &str, token_id: &AlkaneId) -> Self {
        Self {
            network: network.to_string(),
            tx: token_id.tx.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageEntry {
    Loading,
    Ready(String),
}

/// State of one balance lookup page view.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub id: Uuid,
    pub active_network: String,
    pub search_address: String,
    pub manual_address_input: String,
    pub connected_wallet_address: Option<String>,
    pub is_connected_wallet_usable: bool,
    pub balances: Vec<RawBalanceRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub token_image_cache: HashMap<ImageCacheKey, ImageEntry>,
    pub copied_at: Option<DateTime<Utc>>,
    /// Last time the browser touched this session.
    pub last_seen: DateTime<Utc>,
    /// Bumped whenever balances and the image cache are reset.
    pub(crate) reset_epoch: u64,
    /// Bumped on every accepted search submission.
    pub(crate) search_generation: u64,
}

impl SessionState {
    pub fn new(network: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            active_network: network.into(),
            search_address: String::new(),
            manual_address_input: String::new(),
            connected_wallet_address: None,
            is_connected_wallet_usable: false,
            balances: Vec::new(),
            loading: false,
            error: None,
            token_image_cache: HashMap::new(),
            copied_at: None,
            last_seen: Utc::now(),
            reset_epoch: 0,
            search_generation: 0,
        }
    }
}

/// Issued when a search starts; the result is applied only if the
/// ticket still matches the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchTicket {
    pub address: String,
    pub network: String,
    pub generation: u64,
    pub reset_epoch: u64,
}

/// One pending token image fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRequest {
    pub token_id: AlkaneId,
    pub key: ImageCacheKey,
    pub reset_epoch: u64,
}

/// Aggregated balance joined with its cached image.
#[derive(Clone, Debug, Serialize)]
pub struct BalanceRow {
    #[serde(flatten)]
    pub balance: AggregatedBalance,
    pub image: Option<String>,
    pub image_loading: bool,
}

/// Display state handed to the rendering layer.
#[derive(Clone, Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub active_network: String,
    pub search_address: String,
    pub manual_address_input: String,
    pub connected_wallet_address: Option<String>,
    pub wallet_usable: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub copied: bool,
    pub balances: Vec<BalanceRow>,
}
