//! State transitions of a balance lookup session.
//!
//! Every external signal (network selected, wallet observed, address typed,
//! search started or finished, image loaded) is applied here as an explicit
//! transition on [`SessionState`]. Nothing in this module performs I/O.

use chrono::{DateTime, Duration, Utc};

use crate::{
    errors::CustomError,
    models::{
        alkane::{AggregatedBalance, RawBalanceRecord},
        session::{
            BalanceRow, ImageCacheKey, ImageEntry, ImageRequest, SearchTicket, SessionState,
            SessionView, WalletConnection,
        },
    },
};

use super::{address::validate_address, aggregation::aggregate};

/// How long the "copied" acknowledgment stays up.
pub const COPY_ACK_MILLIS: i64 = 2_000;

impl SessionState {
    /// Switch to another network. Balances, images and errors belong to the
    /// old network and are dropped; the addresses the user typed are kept.
    pub fn switch_network(&mut self, network: &str) {
        if self.active_network == network {
            return;
        }

        log::info!(
            "Session {} switching network {} -> {}",
            self.id,
            self.active_network,
            network
        );

        self.active_network = network.to_string();
        self.balances.clear();
        self.token_image_cache.clear();
        self.error = None;
        // Any in-flight search is now stale and will be discarded.
        self.loading = false;
        self.reset_epoch += 1;
    }

    /// Drop balances and images and invalidate every outstanding search
    /// and image fetch.
    fn reset_results(&mut self) {
        self.balances.clear();
        self.token_image_cache.clear();
        self.reset_epoch += 1;
        self.search_generation += 1;
    }

    /// Record the wallet state reported by the browser and re-run the
    /// wallet address rule.
    pub fn observe_wallet(&mut self, wallet: &WalletConnection) {
        self.connected_wallet_address = wallet.address.clone().filter(|_| wallet.connected);
        self.is_connected_wallet_usable = wallet.usable_address().is_some();
        self.apply_wallet_address();
    }

    /// The user edited the address field. Pasted addresses often carry
    /// stray whitespace, which would fail the prefix check; wallet
    /// addresses come from the provider already clean.
    pub fn set_manual_address(&mut self, input: &str) {
        self.manual_address_input = input.trim().to_string();
        self.apply_wallet_address();
    }

    /// Fill the search address from the wallet, but only when the user has
    /// not entered anything.
    pub fn apply_wallet_address(&mut self) {
        if !self.search_address.is_empty() || !self.manual_address_input.is_empty() {
            return;
        }

        if !self.is_connected_wallet_usable {
            return;
        }

        if let Some(address) = self.connected_wallet_address.as_deref() {
            self.search_address = address.to_string();
        }
    }

    /// Address a search would use right now.
    pub fn address_to_use(&self) -> &str {
        if self.manual_address_input.is_empty() {
            &self.search_address
        } else {
            &self.manual_address_input
        }
    }

    /// Start a search. On success the session is loading and the returned
    /// ticket must be handed back to [`SessionState::complete_search`].
    pub fn begin_search(&mut self) -> Result<SearchTicket, CustomError> {
        let address = self.address_to_use().to_string();

        let validation = if address.is_empty() {
            Some(CustomError::missing_address())
        } else if !validate_address(&address) {
            Some(CustomError::invalid_address())
        } else {
            None
        };

        // A rejected search still supersedes any search in flight.
        self.reset_results();

        if let Some(err) = validation {
            self.error = Some(err.to_string());
            self.loading = false;
            return Err(err);
        }

        self.loading = true;
        self.error = None;

        Ok(SearchTicket {
            address,
            network: self.active_network.clone(),
            generation: self.search_generation,
            reset_epoch: self.reset_epoch,
        })
    }

    fn accepts_search(&self, ticket: &SearchTicket) -> bool {
        ticket.network == self.active_network
            && ticket.generation == self.search_generation
            && ticket.reset_epoch == self.reset_epoch
    }

    /// Apply the provider's answer to a search. Returns `false` when the
    /// result is stale and was discarded.
    pub fn complete_search(
        &mut self,
        ticket: &SearchTicket,
        result: Result<Vec<RawBalanceRecord>, CustomError>,
    ) -> bool {
        if !self.accepts_search(ticket) {
            log::warn!(
                "Session {} discarding stale balances for {} on {}",
                self.id,
                ticket.address,
                ticket.network
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(records) => {
                log::info!(
                    "Session {} loaded {} balance records for {} on {}",
                    self.id,
                    records.len(),
                    ticket.address,
                    ticket.network
                );
                self.balances = records;
                self.search_address = ticket.address.clone();
                self.error = None;
            }
            Err(err) => {
                log::error!("Session {} balance fetch failed: {}", self.id, err);
                self.balances.clear();
                self.error = Some(err.to_string());
            }
        }
        true
    }

    pub fn aggregated_balances(&self) -> Vec<AggregatedBalance> {
        aggregate(&self.balances)
    }

    /// Mark every token without a cache entry as loading and return the
    /// fetches to issue. Keys already loading or loaded are skipped.
    pub fn pending_image_requests(&mut self) -> Vec<ImageRequest> {
        let mut requests = Vec::new();

        for balance in self.aggregated_balances() {
            let key = ImageCacheKey::new(&self.active_network, &balance.token_id);
            if self.token_image_cache.contains_key(&key) {
                continue;
            }

            self.token_image_cache.insert(key.clone(), ImageEntry::Loading);
            requests.push(ImageRequest {
                token_id: balance.token_id,
                key,
                reset_epoch: self.reset_epoch,
            });
        }

        requests
    }

    /// Store a finished image fetch. A failure clears the loading marker so
    /// a later view can retry. Returns `false` for stale results.
    pub fn complete_image(
        &mut self,
        request: &ImageRequest,
        result: Result<String, CustomError>,
    ) -> bool {
        if request.key.network != self.active_network || request.reset_epoch != self.reset_epoch {
            log::debug!(
                "Session {} discarding stale image for {} on {}",
                self.id,
                request.token_id,
                request.key.network
            );
            return false;
        }

        match result {
            Ok(uri) => {
                self.token_image_cache
                    .insert(request.key.clone(), ImageEntry::Ready(uri));
            }
            Err(err) => {
                log::debug!(
                    "Session {} image fetch for {} failed: {}",
                    self.id,
                    request.token_id,
                    err
                );
                self.token_image_cache.remove(&request.key);
            }
        }
        true
    }

    /// Copy the active address. Returns the text placed on the clipboard.
    pub fn mark_copied(&mut self, now: DateTime<Utc>) -> Result<String, CustomError> {
        let text = self.address_to_use().to_string();
        if text.is_empty() {
            return Err(CustomError::missing_address());
        }
        self.copied_at = Some(now);
        Ok(text)
    }

    pub fn is_copied(&self, now: DateTime<Utc>) -> bool {
        self.copied_at
            .map(|at| now - at < Duration::milliseconds(COPY_ACK_MILLIS))
            .unwrap_or(false)
    }

    pub fn view(&self, now: DateTime<Utc>) -> SessionView {
        let balances = self
            .aggregated_balances()
            .into_iter()
            .map(|balance| {
                let key = ImageCacheKey::new(&self.active_network, &balance.token_id);
                let entry = self.token_image_cache.get(&key);
                BalanceRow {
                    image: match entry {
                        Some(ImageEntry::Ready(uri)) => Some(uri.clone()),
                        _ => None,
                    },
                    image_loading: matches!(entry, Some(ImageEntry::Loading)),
                    balance,
                }
            })
            .collect();

        SessionView {
            session_id: self.id,
            active_network: self.active_network.clone(),
            search_address: self.search_address.clone(),
            manual_address_input: self.manual_address_input.clone(),
            connected_wallet_address: self.connected_wallet_address.clone(),
            wallet_usable: self.is_connected_wallet_usable,
            loading: self.loading,
            error: self.error.clone(),
            copied: self.is_copied(now),
            balances,
        }
    }
}
