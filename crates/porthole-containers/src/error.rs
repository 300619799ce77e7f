//! Errors raised while listing containers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to run container CLI: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("container CLI timed out")]
    Timeout,

    #[error("container CLI exited with status {status}: {stderr}")]
    CommandFailed { status: i32, stderr: String },

    #[error("failed to parse container listing: {0}")]
    Parse(#[from] serde_json::Error),
}
