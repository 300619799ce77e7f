//! Screencast session controller.
//!
//! Split into a sans-I/O state machine and an async driver so the protocol
//! logic stays deterministic and testable without sockets:
//!
//! - [`machine`] decides what to send and what to surface for each input
//! - [`driver`] owns the WebSocket, the retry timers, and the command channel
//! - [`stats`] folds frame arrivals into a rate estimate
//!
//! ```rust,ignore
//! let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let handle = controller::spawn(ControllerConfig::default(), events_tx);
//! while let Some(event) = events_rx.recv().await {
//!     // render state, tabs, frames
//! }
//! handle.shutdown().await;
//! ```

mod driver;
mod machine;
mod stats;

pub use driver::{spawn, ControllerConfig, ControllerHandle};
pub use machine::{
    Action, ControllerEvent, ControllerState, FrameUpdate, PageTarget, ScreencastMachine,
};
pub use stats::FrameStats;
