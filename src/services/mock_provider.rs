use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    errors::CustomError,
    models::alkane::{AlkaneId, RawBalanceRecord},
};

use super::alkanes_client::AlkanesDataProvider;

/// In-memory provider keyed by `(address, network)` for balances and by
/// token tx for images. Unknown keys fail.
#[derive(Default)]
pub struct MockProvider {
    balances: HashMap<(String, String), Vec<RawBalanceRecord>>,
    images: HashMap<String, String>,
    balance_calls: Arc<AtomicUsize>,
    gate: Option<Arc<AtomicBool>>,
}

impl MockProvider {
    pub fn with_balances(
        mut self,
        address: &str,
        network: &str,
        records: Vec<RawBalanceRecord>,
    ) -> Self {
        self.balances
            .insert((address.to_string(), network.to_string()), records);
        self
    }

    pub fn with_image(mut self, tx: &str, uri: &str) -> Self {
        self.images.insert(tx.to_string(), uri.to_string());
        self
    }

    /// Hold balance fetches until the gate is opened.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(AtomicBool::new(false)));
        self
    }

    pub fn gate(&self) -> Arc<AtomicBool> {
        self.gate.clone().unwrap_or_else(|| Arc::new(AtomicBool::new(true)))
    }

    pub fn balance_calls(&self) -> Arc<AtomicUsize> {
        self.balance_calls.clone()
    }
}

#[async_trait(?Send)]
impl AlkanesDataProvider for MockProvider {
    async fn fetch_balances(
        &self,
        address: &str,
        network: &str,
    ) -> Result<Vec<RawBalanceRecord>, CustomError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            while !gate.load(Ordering::SeqCst) {
                actix_web::rt::time::sleep(Duration::from_millis(1)).await;
            }
        }

        self.balances
            .get(&(address.to_string(), network.to_string()))
            .cloned()
            .ok_or_else(|| CustomError::fetch(format!("No alkanes indexed for {}", address)))
    }

    async fn fetch_token_image(
        &self,
        token_id: &AlkaneId,
        _network: &str,
    ) -> Result<String, CustomError> {
        self.images
            .get(&token_id.tx)
            .cloned()
            .ok_or_else(|| CustomError::fetch("Token has no image"))
    }
}
