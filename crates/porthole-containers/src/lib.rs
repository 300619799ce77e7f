//! Discovery of running browser containers.
//!
//! Wraps the host's `container` CLI: one `ls --format json` invocation per
//! lookup, parsed and filtered down to the containers running the browser
//! image, with their CDP and RDP coordinates resolved for callers on the
//! host side of the network boundary.

mod directory;
mod error;
mod listing;

pub use directory::{ContainerDirectory, DirectoryConfig};
pub use error::DirectoryError;
pub use listing::{parse_listing, ContainerRecord};
