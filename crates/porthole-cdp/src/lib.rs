//! Chrome DevTools Protocol plumbing for live page screencasts.
//!
//! This crate speaks the small slice of CDP needed to mirror a page out of a
//! headless browser: resolve the debugger endpoint over HTTP, attach to a
//! page target over WebSocket, and pump `Page.screencastFrame` events while
//! acking each one so the browser keeps producing.
//!
//! ```text
//! /json/version ──> websocket_url ──> connect ──> attach ──> frames
//!      (HTTP)         (re-rooted)       (WS)      (session)   (acked)
//! ```
//!
//! The [`controller`] module wraps the whole pipeline in a spawnable task
//! with reconnect handling; [`protocol`] items are re-exported at the crate
//! root for callers that drive the wire format directly.

pub mod controller;

mod discovery;
mod error;
mod protocol;

pub use discovery::{fetch_version, websocket_url, DISCOVERY_TIMEOUT};
pub use error::CdpError;
pub use protocol::*;
