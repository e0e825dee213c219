//! Connection session controller
//!
//! Owns the observable Wi-Fi state (discovered networks, pending selection,
//! tracked connection) and sequences the provider calls behind it. Each
//! operation runs the blocking provider method on a worker and hands the
//! result back over a channel; [`Session::poll`] is called from the event
//! loop to fold settled results into the state.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::mpsc::{self, Receiver, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::config;
use crate::error::WifiError;
use crate::provider::{ConnectRequest, NetworkRecord, PermissionStatus, WifiProvider};

/// Outcome of a settled connect/disconnect, for the notice line.
/// Scan and query failures are deliberately log-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Connected(String),
    ConnectFailed(String),
    Disconnected,
    DisconnectFailed,
}

struct PendingScan {
    rx: Receiver<Result<Vec<NetworkRecord>, WifiError>>,
}

struct PendingQuery {
    generation: u64,
    rx: Receiver<Result<Option<String>, WifiError>>,
}

enum LinkOp {
    Connect { ssid: String },
    Disconnect,
}

struct PendingLink {
    op: LinkOp,
    rx: Receiver<Result<(), WifiError>>,
}

pub struct Session {
    provider: Arc<dyn WifiProvider>,
    /// Last successful scan, in provider order, duplicates and all
    pub discovered: Vec<NetworkRecord>,
    /// Network the user is about to act on; set only while the credential
    /// popup is open
    pub selected: Option<NetworkRecord>,
    /// Best-effort cache of the current association
    pub connected_ssid: Option<String>,
    /// Bumped on every issued operation; pending queries that predate the
    /// latest connect/disconnect are discarded as stale
    generation: u64,
    link_generation: u64,
    scan_rx: Option<PendingScan>,
    query_rx: Option<PendingQuery>,
    link_rx: Option<PendingLink>,
}

impl Session {
    pub fn new(provider: Arc<dyn WifiProvider>) -> Self {
        Session {
            provider,
            discovered: Vec::new(),
            selected: None,
            connected_ssid: None,
            generation: 0,
            link_generation: 0,
            scan_rx: None,
            query_rx: None,
            link_rx: None,
        }
    }

    /// Startup sequence: ask for the scan permission once, then kick off a
    /// current-connection query. A denied permission is logged and tolerated;
    /// later scans will fail and be reported through the usual path.
    pub fn initialize(&mut self) {
        match self
            .provider
            .request_scan_permission(&config::PERMISSION_RATIONALE)
        {
            PermissionStatus::Granted => info!("scan permission granted"),
            PermissionStatus::Denied => {
                warn!("{}; scans may fail", WifiError::PermissionDenied);
            }
        }
        self.start_query();
    }

    pub fn scanning(&self) -> bool {
        self.scan_rx.is_some()
    }

    /// A connect or disconnect is outstanding
    pub fn link_busy(&self) -> bool {
        self.link_rx.is_some()
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Survey nearby networks. Ignored while a scan is already outstanding;
    /// otherwise each invocation is independent.
    pub fn start_scan(&mut self) {
        if self.scan_rx.is_some() {
            debug!("scan request ignored: scan already in flight");
            return;
        }
        self.next_generation();
        let provider = Arc::clone(&self.provider);
        let (tx, rx) = mpsc::channel(1);
        self.scan_rx = Some(PendingScan { rx });
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || provider.scan())
                .await
                .unwrap_or_else(|e| Err(WifiError::Internal(e.to_string())));
            let _ = tx.send(result).await;
        });
    }

    /// Mark a network as the connect target. Pure state transition; the
    /// caller opens the credential popup.
    pub fn select(&mut self, record: NetworkRecord) {
        self.selected = Some(record);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Join the selected network with the supplied password. Without a
    /// selection this is a no-op that never reaches the provider. The
    /// selection is consumed either way: the popup has closed.
    pub fn start_connect(&mut self, password: SecretString) {
        let Some(record) = self.selected.take() else {
            return;
        };
        if self.link_rx.is_some() {
            warn!(
                ssid = %record.ssid,
                "connect ignored: a connect/disconnect is already in flight"
            );
            return;
        }
        self.link_generation = self.next_generation();
        let ssid = record.ssid;
        let request = ConnectRequest {
            ssid: ssid.clone(),
            password,
            hidden: false,
            legacy_auth: false,
        };
        let provider = Arc::clone(&self.provider);
        let (tx, rx) = mpsc::channel(1);
        self.link_rx = Some(PendingLink {
            op: LinkOp::Connect { ssid },
            rx,
        });
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || provider.connect(&request))
                .await
                .unwrap_or_else(|e| Err(WifiError::Internal(e.to_string())));
            let _ = tx.send(result).await;
        });
    }

    /// Refresh the tracked connection from the provider. Best-effort: a
    /// failure is logged, never surfaced.
    pub fn start_query(&mut self) {
        let generation = self.next_generation();
        let provider = Arc::clone(&self.provider);
        let (tx, rx) = mpsc::channel(1);
        // Replacing a pending query drops its channel; the superseded
        // result has nowhere to land.
        self.query_rx = Some(PendingQuery { generation, rx });
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || provider.current_ssid())
                .await
                .unwrap_or_else(|e| Err(WifiError::Internal(e.to_string())));
            let _ = tx.send(result).await;
        });
    }

    /// Drop the current association. The UI disables the control when no
    /// connection is tracked; calling it anyway is permitted and the
    /// provider is expected to cope.
    pub fn start_disconnect(&mut self) {
        if self.link_rx.is_some() {
            warn!("disconnect ignored: a connect/disconnect is already in flight");
            return;
        }
        self.link_generation = self.next_generation();
        let provider = Arc::clone(&self.provider);
        let (tx, rx) = mpsc::channel(1);
        self.link_rx = Some(PendingLink {
            op: LinkOp::Disconnect,
            rx,
        });
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || provider.disconnect())
                .await
                .unwrap_or_else(|e| Err(WifiError::Internal(e.to_string())));
            let _ = tx.send(result).await;
        });
    }

    /// Fold settled operations into the state. Returns the notices the UI
    /// should surface. Every failure leaves prior state intact and the
    /// session back at idle, so the user can always retry.
    pub fn poll(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();

        if let Some(mut pending) = self.scan_rx.take() {
            match pending.rx.try_recv() {
                Ok(Ok(records)) => {
                    info!(count = records.len(), "scan finished");
                    self.discovered = records;
                }
                Ok(Err(e)) => warn!("{e}"),
                Err(TryRecvError::Empty) => self.scan_rx = Some(pending),
                Err(TryRecvError::Disconnected) => warn!("scan worker dropped"),
            }
        }

        if let Some(mut pending) = self.query_rx.take() {
            match pending.rx.try_recv() {
                Ok(result) => {
                    if pending.generation < self.link_generation {
                        debug!("stale connection query discarded");
                    } else {
                        match result {
                            Ok(ssid) => self.connected_ssid = ssid,
                            Err(e) => warn!("{e}"),
                        }
                    }
                }
                Err(TryRecvError::Empty) => self.query_rx = Some(pending),
                Err(TryRecvError::Disconnected) => warn!("query worker dropped"),
            }
        }

        if let Some(mut pending) = self.link_rx.take() {
            match pending.rx.try_recv() {
                Ok(result) => match (pending.op, result) {
                    (LinkOp::Connect { ssid }, Ok(())) => {
                        info!(ssid = %ssid, "connected");
                        self.connected_ssid = Some(ssid.clone());
                        notices.push(Notice::Connected(ssid));
                        // Follow up with an authoritative query so the
                        // optimistic update and the device agree.
                        self.start_query();
                    }
                    (LinkOp::Connect { ssid }, Err(e)) => {
                        warn!("{e}");
                        notices.push(Notice::ConnectFailed(ssid));
                    }
                    (LinkOp::Disconnect, Ok(())) => {
                        info!("disconnected");
                        self.connected_ssid = None;
                        notices.push(Notice::Disconnected);
                    }
                    (LinkOp::Disconnect, Err(e)) => {
                        warn!("{e}");
                        notices.push(Notice::DisconnectFailed);
                    }
                },
                Err(TryRecvError::Empty) => self.link_rx = Some(pending),
                Err(TryRecvError::Disconnected) => warn!("link worker dropped"),
            }
        }

        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn cafe_net() -> NetworkRecord {
        NetworkRecord {
            ssid: "CafeNet".to_string(),
            bssid: "aa:bb:cc".to_string(),
            capabilities: "WPA2".to_string(),
            frequency: 2412,
            level: -40,
            timestamp: 1000,
        }
    }

    fn session_with(provider: &Arc<MockProvider>) -> Session {
        Session::new(Arc::clone(provider) as Arc<dyn WifiProvider>)
    }

    /// Drive poll() until the session is idle again, collecting notices.
    async fn settle(session: &mut Session) -> Vec<Notice> {
        let mut notices = Vec::new();
        for _ in 0..200 {
            notices.extend(session.poll());
            if session.scan_rx.is_none() && session.query_rx.is_none() && session.link_rx.is_none()
            {
                return notices;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session did not settle");
    }

    #[tokio::test]
    async fn scan_replaces_discovered_in_provider_order() {
        let provider = Arc::new(MockProvider::new());
        provider.set_networks(vec![cafe_net(), cafe_net()]);
        let mut session = session_with(&provider);

        session.start_scan();
        settle(&mut session).await;

        assert_eq!(session.discovered.len(), 2);
        assert_eq!(session.discovered[0], cafe_net());
    }

    #[tokio::test]
    async fn failed_scan_leaves_discovered_unchanged() {
        let provider = Arc::new(MockProvider::new());
        provider.set_networks(vec![cafe_net()]);
        let mut session = session_with(&provider);

        session.start_scan();
        settle(&mut session).await;
        let before = session.discovered.clone();

        provider.fail_scans();
        session.start_scan();
        let notices = settle(&mut session).await;

        assert_eq!(session.discovered, before);
        assert!(notices.is_empty(), "scan failures are log-only");
    }

    #[tokio::test]
    async fn overlapping_scan_requests_are_ignored() {
        let provider = Arc::new(MockProvider::new());
        let mut session = session_with(&provider);

        session.start_scan();
        session.start_scan();
        settle(&mut session).await;

        assert_eq!(provider.scan_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn select_sets_selection_without_touching_discovered() {
        let provider = Arc::new(MockProvider::new());
        provider.set_networks(vec![cafe_net()]);
        let mut session = session_with(&provider);
        session.start_scan();
        settle(&mut session).await;
        let before = session.discovered.clone();

        session.select(cafe_net());

        assert_eq!(session.selected, Some(cafe_net()));
        assert_eq!(session.discovered, before);
    }

    #[tokio::test]
    async fn connect_without_selection_never_reaches_provider() {
        let provider = Arc::new(MockProvider::new());
        let mut session = session_with(&provider);

        session.start_connect(SecretString::from("hunter2"));
        settle(&mut session).await;

        assert_eq!(provider.connect_calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.connected_ssid, None);
    }

    #[tokio::test]
    async fn successful_connect_tracks_the_attempted_ssid() {
        let provider = Arc::new(MockProvider::new());
        provider.set_networks(vec![cafe_net()]);
        let mut session = session_with(&provider);
        session.start_scan();
        settle(&mut session).await;

        session.select(session.discovered[0].clone());
        session.start_connect(SecretString::from("hunter2"));
        let notices = settle(&mut session).await;

        assert_eq!(session.connected_ssid.as_deref(), Some("CafeNet"));
        assert_eq!(session.selected, None);
        assert_eq!(notices, vec![Notice::Connected("CafeNet".to_string())]);
    }

    #[tokio::test]
    async fn failed_connect_leaves_prior_connection_and_names_the_ssid() {
        let provider = Arc::new(MockProvider::new());
        provider.fail_connects();
        let mut session = session_with(&provider);

        session.select(cafe_net());
        session.start_connect(SecretString::from("wrong"));
        let notices = settle(&mut session).await;

        assert_eq!(session.connected_ssid, None);
        assert_eq!(notices, vec![Notice::ConnectFailed("CafeNet".to_string())]);
    }

    #[tokio::test]
    async fn query_after_connect_agrees_with_the_optimistic_update() {
        let provider = Arc::new(MockProvider::new());
        let mut session = session_with(&provider);

        session.select(cafe_net());
        session.start_connect(SecretString::from("hunter2"));
        settle(&mut session).await;

        // The follow-up query has already run against the provider's live
        // state; it must not disagree with the optimistic update.
        assert_eq!(session.connected_ssid.as_deref(), Some("CafeNet"));
        assert!(provider.query_calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn disconnect_clears_the_tracked_connection() {
        let provider = Arc::new(MockProvider::new());
        provider.set_connected(Some("CafeNet"));
        let mut session = session_with(&provider);
        session.start_query();
        settle(&mut session).await;
        assert_eq!(session.connected_ssid.as_deref(), Some("CafeNet"));

        session.start_disconnect();
        let notices = settle(&mut session).await;

        assert_eq!(session.connected_ssid, None);
        assert_eq!(notices, vec![Notice::Disconnected]);
    }

    #[tokio::test]
    async fn failed_disconnect_leaves_state_and_surfaces_a_notice() {
        let provider = Arc::new(MockProvider::new());
        provider.set_connected(Some("CafeNet"));
        provider.fail_disconnects();
        let mut session = session_with(&provider);
        session.start_query();
        settle(&mut session).await;

        session.start_disconnect();
        let notices = settle(&mut session).await;

        assert_eq!(session.connected_ssid.as_deref(), Some("CafeNet"));
        assert_eq!(notices, vec![Notice::DisconnectFailed]);
    }

    #[tokio::test]
    async fn query_failure_is_silent_and_leaves_state() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_query_result(Err(WifiError::QueryFailed {
            reason: "simulated".to_string(),
        }));
        let mut session = session_with(&provider);
        session.connected_ssid = Some("CafeNet".to_string());

        session.start_query();
        let notices = settle(&mut session).await;

        assert_eq!(session.connected_ssid.as_deref(), Some("CafeNet"));
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn stale_query_result_is_discarded_after_a_link_operation() {
        let provider = Arc::new(MockProvider::new());
        provider.set_connected(Some("Ghost"));
        provider.queue_query_result(Ok(Some("Ghost".to_string())));
        provider.set_query_delay(Duration::from_millis(80));
        let mut session = session_with(&provider);

        // Slow query in flight, then a disconnect supersedes it.
        session.start_query();
        session.start_disconnect();
        settle(&mut session).await;

        // The late "Ghost" answer must not resurrect the old association.
        assert_eq!(session.connected_ssid, None);
    }

    #[tokio::test]
    async fn initialize_queries_the_current_connection() {
        let provider = Arc::new(MockProvider::new());
        provider.set_connected(Some("Home_Fiber_5G"));
        let mut session = session_with(&provider);

        session.initialize();
        settle(&mut session).await;

        assert_eq!(session.connected_ssid.as_deref(), Some("Home_Fiber_5G"));
    }

    #[tokio::test]
    async fn denied_permission_does_not_block_startup_query() {
        let provider = Arc::new(MockProvider::new());
        provider.deny_permission();
        provider.set_connected(Some("CafeNet"));
        let mut session = session_with(&provider);

        session.initialize();
        settle(&mut session).await;

        assert_eq!(session.connected_ssid.as_deref(), Some("CafeNet"));
    }
}
