//! HTTP surface of the browser container viewer.
//!
//! One axum router serves the viewer and everything it needs:
//! - `/api/containers`: the running browser containers
//! - `/api/cdp-targets`: host-side probe of a CDP HTTP endpoint
//! - `/api/rdp-file`: an `.rdp` download for a published RDP port
//! - `/ws-proxy`: WebSocket relay to container CDP endpoints
//! - everything else: the embedded single-page viewer
//!
//! ```ignore
//! let state = AppState::new(ContainerDirectory::new(DirectoryConfig::default()))?;
//! porthole_server::run(ServerConfig::default(), state).await?;
//! ```

mod error;
mod handlers;
mod relay;
mod routes;
mod server;
mod state;

pub use error::ServerError;
pub use routes::create_router;
pub use server::{run, ServerConfig};
pub use state::AppState;
