use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    errors::CustomError,
    models::{
        network_config::NetworkConfig,
        requests::{CopyResponse, OpenSessionRequest},
        session::{ImageRequest, SearchTicket, SessionState, SessionView, WalletConnection},
    },
};

use super::{alkanes_client::AlkanesDataProvider, network_config::SUPPORTED_NETWORKS};

/// Owns every open balance lookup session and drives the data provider.
///
/// The session map lock is never held across an `.await`: a search takes a
/// ticket under the lock, fetches without it, and re-locks to apply the
/// result, which the session discards if it has moved on. Sessions idle
/// for longer than the TTL are evicted.
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<Mutex<HashMap<Uuid, SessionState>>>,
    provider: Arc<dyn AlkanesDataProvider>,
    networks: Arc<HashMap<String, NetworkConfig>>,
    default_network: String,
    session_ttl: Duration,
}

impl SessionService {
    pub fn new(
        provider: Arc<dyn AlkanesDataProvider>,
        networks: HashMap<String, NetworkConfig>,
        default_network: String,
        session_ttl: Duration,
    ) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            provider,
            networks: Arc::new(networks),
            default_network,
            session_ttl,
        }
    }

    fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, SessionState>>, CustomError> {
        self.sessions.lock().map_err(|_| {
            log::error!("Session map lock poisoned");
            CustomError::InternalServerError
        })
    }

    fn is_expired(&self, session: &SessionState, now: DateTime<Utc>) -> bool {
        now - session.last_seen > self.session_ttl
    }

    /// Run `f` on a session the browser is using. Refreshes its idle timer;
    /// a session already past its TTL is evicted and reported missing.
    fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Result<R, CustomError> {
        let now = Utc::now();
        let mut sessions = self.lock_sessions()?;
        let session = sessions
            .get_mut(&id)
            .ok_or(CustomError::SessionNotFoundError(id))?;

        if self.is_expired(session, now) {
            sessions.remove(&id);
            log::info!("Evicted idle session {}", id);
            return Err(CustomError::SessionNotFoundError(id));
        }

        session.last_seen = now;
        Ok(f(session))
    }

    /// Apply a background result without counting it as browser activity.
    fn apply_to_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Result<R, CustomError> {
        let mut sessions = self.lock_sessions()?;
        let session = sessions
            .get_mut(&id)
            .ok_or(CustomError::SessionNotFoundError(id))?;
        Ok(f(session))
    }

    /// Drop every session idle past the TTL. Returns how many were dropped.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> Result<usize, CustomError> {
        let mut sessions = self.lock_sessions()?;
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            log::info!("Evicted {} idle sessions", evicted);
        }
        Ok(evicted)
    }

    fn ensure_supported(&self, network: &str) -> Result<(), CustomError> {
        if self.networks.contains_key(network) {
            Ok(())
        } else {
            Err(CustomError::UnsupportedNetworkError(network.to_string()))
        }
    }

    /// Networks in their canonical order.
    pub fn networks(&self) -> Vec<NetworkConfig> {
        SUPPORTED_NETWORKS
            .iter()
            .filter_map(|name| self.networks.get(*name).cloned())
            .collect()
    }

    pub fn open_session(&self, request: OpenSessionRequest) -> Result<SessionView, CustomError> {
        let network = request
            .network
            .unwrap_or_else(|| self.default_network.clone());
        self.ensure_supported(&network)?;

        let mut state = SessionState::new(network);
        if let Some(wallet) = request.wallet.as_ref() {
            state.observe_wallet(wallet);
        }
        let view = state.view(Utc::now());

        self.evict_idle(Utc::now())?;
        let mut sessions = self.lock_sessions()?;
        log::info!("Opened session {} on {}", state.id, state.active_network);
        sessions.insert(state.id, state);

        Ok(view)
    }

    pub fn close_session(&self, id: Uuid) -> Result<(), CustomError> {
        let mut sessions = self.lock_sessions()?;
        sessions
            .remove(&id)
            .map(|_| log::info!("Closed session {}", id))
            .ok_or(CustomError::SessionNotFoundError(id))
    }

    /// Current display state. Tokens without an image are queued for one.
    pub fn view(&self, id: Uuid) -> Result<SessionView, CustomError> {
        let (requests, view) = self.with_session(id, |session| {
            let requests = session.pending_image_requests();
            (requests, session.view(Utc::now()))
        })?;
        self.spawn_image_fetches(id, requests);
        Ok(view)
    }

    pub fn switch_network(&self, id: Uuid, network: &str) -> Result<SessionView, CustomError> {
        self.ensure_supported(network)?;
        self.with_session(id, |session| {
            session.switch_network(network);
            session.view(Utc::now())
        })
    }

    pub fn update_wallet(
        &self,
        id: Uuid,
        wallet: &WalletConnection,
    ) -> Result<SessionView, CustomError> {
        self.with_session(id, |session| {
            session.observe_wallet(wallet);
            session.view(Utc::now())
        })
    }

    pub fn set_manual_address(&self, id: Uuid, address: &str) -> Result<SessionView, CustomError> {
        self.with_session(id, |session| {
            session.set_manual_address(address);
            session.view(Utc::now())
        })
    }

    /// Look up balances for the session's address on its active network.
    ///
    /// Validation and provider failures are recorded in the session and
    /// also returned. A result that arrives after the session moved on is
    /// dropped and the current state is returned instead. The fetch runs in
    /// its own task so the session leaves the loading state even if the
    /// caller goes away.
    pub async fn search(&self, id: Uuid) -> Result<SessionView, CustomError> {
        let ticket = self.with_session(id, |session| session.begin_search())??;
        log::info!(
            "Session {} searching {} on {}",
            id,
            ticket.address,
            ticket.network
        );

        let service = self.clone();
        actix_web::rt::spawn(async move { service.finish_search(id, ticket).await })
            .await
            .map_err(|e| {
                log::error!("Search task for session {} failed: {}", id, e);
                CustomError::InternalServerError
            })?
    }

    async fn finish_search(
        &self,
        id: Uuid,
        ticket: SearchTicket,
    ) -> Result<SessionView, CustomError> {
        let result = self
            .provider
            .fetch_balances(&ticket.address, &ticket.network)
            .await;
        let failure = result.as_ref().err().cloned();

        let (applied, requests, view) = self.apply_to_session(id, |session| {
            let applied = session.complete_search(&ticket, result);
            let requests = if applied {
                session.pending_image_requests()
            } else {
                Vec::new()
            };
            (applied, requests, session.view(Utc::now()))
        })?;

        match failure {
            Some(err) if applied => Err(err),
            _ => {
                self.spawn_image_fetches(id, requests);
                Ok(view)
            }
        }
    }

    pub fn copy_address(&self, id: Uuid) -> Result<CopyResponse, CustomError> {
        let text = self.with_session(id, |session| session.mark_copied(Utc::now()))??;
        Ok(CopyResponse { text, copied: true })
    }

    fn spawn_image_fetches(&self, id: Uuid, requests: Vec<ImageRequest>) {
        for request in requests {
            let service = self.clone();
            actix_web::rt::spawn(async move {
                let result = service
                    .provider
                    .fetch_token_image(&request.token_id, &request.key.network)
                    .await;
                let applied =
                    service.apply_to_session(id, |session| session.complete_image(&request, result));
                if let Err(e) = applied {
                    log::debug!("Dropping image for {}: {}", request.token_id, e);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::alkane::{AlkaneId, RawBalanceRecord};
    use crate::services::mock_provider::MockProvider;
    use crate::services::network_config::get_network_config;

    fn networks() -> HashMap<String, NetworkConfig> {
        SUPPORTED_NETWORKS
            .iter()
            .map(|name| (name.to_string(), get_network_config(name).unwrap()))
            .collect()
    }

    fn service(provider: MockProvider) -> SessionService {
        SessionService::new(
            Arc::new(provider),
            networks(),
            "mainnet".to_string(),
            Duration::minutes(30),
        )
    }

    fn record(block: &str, tx: &str, amount: u128) -> RawBalanceRecord {
        RawBalanceRecord {
            token_id: Some(AlkaneId::new(block, tx)),
            name: "DIESEL".to_string(),
            symbol: Some("DIESEL".to_string()),
            amount,
        }
    }

    async fn settle() {
        actix_web::rt::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    #[actix_web::test]
    async fn open_session_applies_wallet() {
        let service = service(MockProvider::default());
        let view = service
            .open_session(OpenSessionRequest {
                network: None,
                wallet: Some(WalletConnection {
                    connected: true,
                    address: Some("bc1qwallet".to_string()),
                }),
            })
            .unwrap();

        assert_eq!(view.active_network, "mainnet");
        assert_eq!(view.search_address, "bc1qwallet");
        assert!(view.wallet_usable);
    }

    #[actix_web::test]
    async fn open_session_rejects_unknown_network() {
        let service = service(MockProvider::default());
        let result = service.open_session(OpenSessionRequest {
            network: Some("dogecoin".to_string()),
            wallet: None,
        });
        assert_eq!(
            result.unwrap_err(),
            CustomError::UnsupportedNetworkError("dogecoin".to_string())
        );
    }

    #[actix_web::test]
    async fn search_aggregates_and_loads_images() {
        let provider = MockProvider::default()
            .with_balances(
                "bc1qaddr",
                "mainnet",
                vec![record("2", "0", 150_000_000), record("2", "0", 50_000_000)],
            )
            .with_image("0", "data:image/png;base64,AA==");
        let service = service(provider);
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        service.set_manual_address(id, "bc1qaddr").unwrap();

        let view = service.search(id).await.unwrap();
        assert_eq!(view.balances.len(), 1);
        assert_eq!(view.balances[0].balance.amount, 2.0);
        assert!(view.balances[0].image_loading);
        assert_eq!(view.search_address, "bc1qaddr");

        settle().await;
        let view = service.view(id).unwrap();
        assert_eq!(
            view.balances[0].image.as_deref(),
            Some("data:image/png;base64,AA==")
        );
    }

    #[actix_web::test]
    async fn image_failure_does_not_block_other_tokens() {
        let provider = MockProvider::default()
            .with_balances(
                "bc1qaddr",
                "mainnet",
                vec![record("2", "0", 1), record("2", "1", 1)],
            )
            .with_image("1", "data:image/gif;base64,R0lG");
        let service = service(provider);
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        service.set_manual_address(id, "bc1qaddr").unwrap();

        service.search(id).await.unwrap();
        settle().await;
        let view = service.view(id).unwrap();

        assert_eq!(view.error, None);
        assert_eq!(view.balances[0].image, None);
        assert_eq!(view.balances[1].image.as_deref(), Some("data:image/gif;base64,R0lG"));
    }

    #[actix_web::test]
    async fn provider_error_is_recorded_and_returned() {
        let service = service(MockProvider::default());
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        service.set_manual_address(id, "bc1qunknown").unwrap();

        let err = service.search(id).await.unwrap_err();
        assert!(matches!(err, CustomError::FetchError(_)));

        let view = service.view(id).unwrap();
        assert!(!view.loading);
        assert!(view.balances.is_empty());
        assert_eq!(view.error, Some(err.to_string()));
    }

    #[actix_web::test]
    async fn validation_error_skips_provider() {
        let provider = MockProvider::default();
        let calls = provider.balance_calls();
        let service = service(provider);
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;

        let err = service.search(id).await.unwrap_err();

        assert_eq!(err, CustomError::missing_address());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[actix_web::test]
    async fn network_switch_during_search_discards_result() {
        let provider = MockProvider::default()
            .with_balances("bc1qaddr", "mainnet", vec![record("2", "0", 1)])
            .gated();
        let gate = provider.gate();
        let service = service(provider);
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        service.set_manual_address(id, "bc1qaddr").unwrap();

        let searching = {
            let service = service.clone();
            actix_web::rt::spawn(async move { service.search(id).await })
        };
        settle().await;
        assert!(service.view(id).unwrap().loading);

        service.switch_network(id, "testnet").unwrap();
        gate.store(true, std::sync::atomic::Ordering::SeqCst);
        let view = searching.await.unwrap().unwrap();

        assert_eq!(view.active_network, "testnet");
        assert!(view.balances.is_empty());
        assert!(!view.loading);
        assert_eq!(view.manual_address_input, "bc1qaddr");
    }

    #[actix_web::test]
    async fn closed_session_is_gone() {
        let service = service(MockProvider::default());
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;

        service.close_session(id).unwrap();

        assert_eq!(
            service.view(id).unwrap_err(),
            CustomError::SessionNotFoundError(id)
        );
        assert!(service.close_session(id).is_err());
    }

    #[actix_web::test]
    async fn copy_returns_active_address() {
        let service = service(MockProvider::default());
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        service.set_manual_address(id, "bc1qcopy").unwrap();

        let copied = service.copy_address(id).unwrap();

        assert_eq!(copied.text, "bc1qcopy");
        assert!(service.view(id).unwrap().copied);
    }

    #[actix_web::test]
    async fn dropped_search_request_still_finishes() {
        let provider = MockProvider::default()
            .with_balances("bc1qaddr", "mainnet", vec![record("2", "0", 1)])
            .gated();
        let gate = provider.gate();
        let service = service(provider);
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        service.set_manual_address(id, "bc1qaddr").unwrap();

        let abandoned =
            actix_web::rt::time::timeout(std::time::Duration::from_millis(20), service.search(id))
                .await;
        assert!(abandoned.is_err());
        assert!(service.view(id).unwrap().loading);

        gate.store(true, std::sync::atomic::Ordering::SeqCst);
        settle().await;

        let view = service.view(id).unwrap();
        assert!(!view.loading);
        assert_eq!(view.balances.len(), 1);
        assert_eq!(view.search_address, "bc1qaddr");
    }

    #[actix_web::test]
    async fn idle_sessions_are_evicted() {
        let service = service(MockProvider::default());
        let idle = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        let active = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        service
            .sessions
            .lock()
            .unwrap()
            .get_mut(&idle)
            .unwrap()
            .last_seen -= Duration::hours(1);

        assert_eq!(service.evict_idle(Utc::now()).unwrap(), 1);
        assert_eq!(
            service.view(idle).unwrap_err(),
            CustomError::SessionNotFoundError(idle)
        );
        assert!(service.view(active).is_ok());
    }

    #[actix_web::test]
    async fn expired_session_is_gone_on_access() {
        let service = service(MockProvider::default());
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        service.sessions.lock().unwrap().get_mut(&id).unwrap().last_seen -= Duration::hours(1);

        assert_eq!(
            service.set_manual_address(id, "bc1qlate").unwrap_err(),
            CustomError::SessionNotFoundError(id)
        );
        assert!(service.sessions.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn access_refreshes_idle_timer() {
        let service = service(MockProvider::default());
        let id = service.open_session(OpenSessionRequest::default()).unwrap().session_id;
        service.sessions.lock().unwrap().get_mut(&id).unwrap().last_seen -= Duration::minutes(20);

        service.view(id).unwrap();

        assert_eq!(
            service.evict_idle(Utc::now() + Duration::minutes(15)).unwrap(),
            0
        );
    }

    #[test]
    fn networks_follow_canonical_order() {
        let service = service(MockProvider::default());
        let names: Vec<String> = service.networks().into_iter().map(|n| n.name).collect();
        assert_eq!(names, SUPPORTED_NETWORKS.to_vec());
    }
}
