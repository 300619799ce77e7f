//! Discovery of a container's CDP WebSocket endpoint.
//!
//! The browser's `/json/version` endpoint reports a debugger URL against the
//! browser's own address, which inside a container is unreachable from the
//! host. Callers therefore re-root the URL's path at the host/port they can
//! actually dial.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::CdpError;
use crate::protocol::VersionInfo;

/// Bound on the `/json/version` fetch.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_millis(3000);

/// Fetch the version descriptor from `http://{host}:{port}/json/version`.
pub async fn fetch_version(
    client: &reqwest::Client,
    host: &str,
    port: u16,
) -> Result<VersionInfo, CdpError> {
    let url = format!("http://{host}:{port}/json/version");
    debug!("Fetching CDP version descriptor from {}", url);
    let version = client
        .get(&url)
        .timeout(DISCOVERY_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .json::<VersionInfo>()
        .await?;
    Ok(version)
}

/// Resolve the WebSocket URL to dial: the reported debugger URL's path,
/// re-rooted at the reachable host and port.
pub fn websocket_url(version: &VersionInfo, host: &str, port: u16) -> Result<String, CdpError> {
    let reported = version
        .web_socket_debugger_url
        .as_deref()
        .ok_or(CdpError::MissingDebuggerUrl)?;
    let parsed = Url::parse(reported)?;
    Ok(format!("ws://{host}:{port}{}", parsed.path()))
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
