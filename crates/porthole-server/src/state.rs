//! Shared state for the HTTP handlers.

use std::time::Duration;

use porthole_containers::ContainerDirectory;

use crate::error::ServerError;

/// Upper bound on one CDP endpoint probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(3000);

/// State cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Container listing backend.
    pub directory: ContainerDirectory,
    /// Client for probing CDP HTTP endpoints on behalf of the frontend.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(directory: ContainerDirectory) -> Result<Self, ServerError> {
        let http = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;
        Ok(Self { directory, http })
    }
}
