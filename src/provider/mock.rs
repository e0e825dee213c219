use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use secrecy::ExposeSecret;

use crate::error::{WifiError, WifiResult};
use crate::provider::{
    ConnectRequest, NetworkRecord, PermissionRationale, PermissionStatus, WifiProvider,
};

/// Simulated Wi-Fi provider.
///
/// Backs the `--mock` flag so the screen can be driven without a radio, and
/// backs the tests: scan results and call outcomes are scriptable, and every
/// call is counted so a test can assert an operation never reached the
/// provider.
#[derive(Debug, Default)]
pub struct MockProvider {
    inner: Mutex<MockState>,
    pub scan_calls: AtomicUsize,
    pub connect_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
}

#[derive(Debug)]
struct MockState {
    networks: Vec<NetworkRecord>,
    connected: Option<String>,
    permission: PermissionStatus,
    fail_scan: bool,
    fail_connect: bool,
    fail_disconnect: bool,
    queued_queries: VecDeque<WifiResult<Option<String>>>,
    query_delay: Duration,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            networks: Vec::new(),
            connected: None,
            permission: PermissionStatus::Granted,
            fail_scan: false,
            fail_connect: false,
            fail_disconnect: false,
            queued_queries: VecDeque::new(),
            query_delay: Duration::ZERO,
        }
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed neighborhood for demo mode. Includes a duplicate SSID from a
    /// second access point, which a real scan produces all the time.
    pub fn demo() -> Self {
        let provider = Self::new();
        provider.set_networks(vec![
            NetworkRecord {
                ssid: "Home_Fiber_5G".to_string(),
                bssid: "a4:91:b1:32:07:c0".to_string(),
                capabilities: "WPA2-PSK/AES".to_string(),
                frequency: 5180,
                level: -41,
                timestamp: 1000,
            },
            NetworkRecord {
                ssid: "Home_Fiber_5G".to_string(),
                bssid: "a4:91:b1:32:07:c1".to_string(),
                capabilities: "WPA2-PSK/AES".to_string(),
                frequency: 2437,
                level: -55,
                timestamp: 1002,
            },
            NetworkRecord {
                ssid: "CafeNet".to_string(),
                bssid: "0c:80:63:11:5e:2a".to_string(),
                capabilities: "WPA2-PSK/AES".to_string(),
                frequency: 2412,
                level: -48,
                timestamp: 1005,
            },
            NetworkRecord {
                ssid: "xfinitywifi".to_string(),
                bssid: "5e:a1:8d:90:44:12".to_string(),
                capabilities: "Open".to_string(),
                frequency: 2462,
                level: -70,
                timestamp: 1009,
            },
            NetworkRecord {
                ssid: "Guest_Network".to_string(),
                bssid: "f0:9f:c2:ab:00:9e".to_string(),
                capabilities: "WPA3-SAE/AES".to_string(),
                frequency: 5745,
                level: -62,
                timestamp: 1014,
            },
        ]);
        provider
    }

    pub fn set_networks(&self, networks: Vec<NetworkRecord>) {
        self.lock().networks = networks;
    }

    pub fn set_connected(&self, ssid: Option<&str>) {
        self.lock().connected = ssid.map(str::to_string);
    }

    pub fn deny_permission(&self) {
        self.lock().permission = PermissionStatus::Denied;
    }

    pub fn fail_scans(&self) {
        self.lock().fail_scan = true;
    }

    pub fn fail_connects(&self) {
        self.lock().fail_connect = true;
    }

    pub fn fail_disconnects(&self) {
        self.lock().fail_disconnect = true;
    }

    /// Queue a one-shot answer for the next `current_ssid` call, ahead of
    /// the live connection state. Lets tests simulate stale replies.
    pub fn queue_query_result(&self, result: WifiResult<Option<String>>) {
        self.lock().queued_queries.push_back(result);
    }

    pub fn set_query_delay(&self, delay: Duration) {
        self.lock().query_delay = delay;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WifiProvider for MockProvider {
    fn request_scan_permission(&self, _rationale: &PermissionRationale) -> PermissionStatus {
        self.lock().permission
    }

    fn scan(&self) -> WifiResult<Vec<NetworkRecord>> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if state.fail_scan {
            return Err(WifiError::ScanFailed {
                reason: "simulated scan failure".to_string(),
            });
        }
        Ok(state.networks.clone())
    }

    fn connect(&self, request: &ConnectRequest) -> WifiResult<()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.fail_connect {
            return Err(WifiError::ConnectFailed {
                ssid: request.ssid.clone(),
                reason: "simulated connect failure".to_string(),
            });
        }
        // The password is accepted as-is; exposing it here mirrors the
        // cleartext hand-off to a real platform.
        let _ = request.password.expose_secret();
        state.connected = Some(request.ssid.clone());
        Ok(())
    }

    fn current_ssid(&self) -> WifiResult<Option<String>> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        let (queued, delay) = {
            let mut state = self.lock();
            (state.queued_queries.pop_front(), state.query_delay)
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        match queued {
            Some(result) => result,
            None => Ok(self.lock().connected.clone()),
        }
    }

    fn disconnect(&self) -> WifiResult<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.fail_disconnect {
            return Err(WifiError::DisconnectFailed {
                reason: "simulated disconnect failure".to_string(),
            });
        }
        state.connected = None;
        Ok(())
    }
}
