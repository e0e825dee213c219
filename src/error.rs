/// Typed errors for Wi-Fi provider operations
use thiserror::Error;

/// Result type alias for provider operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Errors reported by a Wi-Fi capability provider.
///
/// The `reason` payloads are opaque provider-supplied diagnostics (an OS
/// error code rendered to text, a driver message). They go to the log, not
/// to a parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WifiError {
    #[error("Scan permission denied")]
    PermissionDenied,

    #[error("No Wi-Fi interface found")]
    NoInterface,

    #[error("Failed to scan networks: {reason}")]
    ScanFailed { reason: String },

    #[error("Failed to connect to \"{ssid}\": {reason}")]
    ConnectFailed { ssid: String, reason: String },

    #[error("Failed to query current connection: {reason}")]
    QueryFailed { reason: String },

    #[error("Failed to disconnect: {reason}")]
    DisconnectFailed { reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
