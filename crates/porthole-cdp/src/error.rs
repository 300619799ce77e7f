//! Error types for endpoint discovery and the screencast controller.

use thiserror::Error;

/// Errors surfaced by discovery and the controller driver.
#[derive(Debug, Error)]
pub enum CdpError {
    /// The `/json/version` endpoint could not be reached or decoded.
    #[error("discovery failed: {0}")]
    Discovery(#[from] reqwest::Error),

    /// The endpoint answered but reported no WebSocket debugger URL.
    #[error("no CDP endpoint found")]
    MissingDebuggerUrl,

    /// The reported debugger URL could not be parsed.
    #[error("invalid debugger URL: {0}")]
    InvalidDebuggerUrl(#[from] url::ParseError),

    /// WebSocket transport failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Outbound request could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The controller task is no longer running.
    #[error("controller is not running")]
    ControllerGone,
}
