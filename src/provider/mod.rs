//! Wi-Fi capability provider abstraction
//!
//! Everything that actually touches a radio lives behind [`WifiProvider`]:
//! scanning, joining a protected SSID, querying the current association and
//! disconnecting. The rest of the crate only sequences these calls and
//! renders their outcomes.

mod mock;
#[cfg(windows)]
mod platform;

pub use mock::MockProvider;
#[cfg(windows)]
pub use platform::PlatformProvider;

use secrecy::SecretString;

use crate::error::WifiResult;

/// A single access-point broadcast observed during a scan.
///
/// Records are immutable once produced. A scan replaces the whole discovered
/// set; duplicate SSIDs from different access points stay as distinct rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRecord {
    pub ssid: String,
    /// Hardware address of the access point that sent the broadcast
    pub bssid: String,
    /// Security/auth description, e.g. "WPA2-PSK/AES"
    pub capabilities: String,
    /// Channel center frequency in MHz
    pub frequency: u32,
    /// Received signal strength in dBm
    pub level: i32,
    /// Provider-supplied discovery timestamp
    pub timestamp: u64,
}

/// Parameters for joining a network
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub ssid: String,
    pub password: SecretString,
    /// The target does not broadcast its SSID
    pub hidden: bool,
    /// Pass-through toggle for older/non-standard access points
    pub legacy_auth: bool,
}

/// Text handed to the platform when asking for the scan permission.
/// Rendering the dialog (if any) is the platform's business.
#[derive(Debug, Clone, Copy)]
pub struct PermissionRationale {
    pub title: &'static str,
    pub message: &'static str,
    pub neutral: &'static str,
    pub negative: &'static str,
    pub positive: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Native Wi-Fi capability, one method per radio operation.
///
/// All methods block; callers are expected to move them off the UI thread
/// (the event loop runs them under `tokio::task::spawn_blocking`).
pub trait WifiProvider: Send + Sync {
    /// Ask the platform for whatever permission scanning requires.
    /// A denial is advisory; later scans simply fail.
    fn request_scan_permission(&self, rationale: &PermissionRationale) -> PermissionStatus;

    /// Survey nearby networks. Order and duplicates are the provider's.
    fn scan(&self) -> WifiResult<Vec<NetworkRecord>>;

    /// Join a network. The password crosses this boundary in cleartext;
    /// the OS on the other side is trusted with it.
    fn connect(&self, request: &ConnectRequest) -> WifiResult<()>;

    /// SSID of the current association, or `None` when not associated.
    fn current_ssid(&self) -> WifiResult<Option<String>>;

    /// Drop the current association.
    fn disconnect(&self) -> WifiResult<()>;
}
