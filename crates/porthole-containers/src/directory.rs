//! Shells out to the host container CLI for the live container set.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::DirectoryError;
use crate::listing::{parse_listing, ContainerRecord};

/// How the directory invokes the container runtime and what it looks for.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Binary to invoke.
    pub program: String,
    /// Image reference a container must run to be listed.
    pub image: String,
    /// Upper bound on one CLI invocation.
    pub command_timeout: Duration,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            program: "container".to_string(),
            image: "browser:latest".to_string(),
            command_timeout: Duration::from_secs(10),
        }
    }
}

/// Live view of the browser containers on this host.
///
/// Every [`list`](Self::list) call runs `<program> ls --format json` fresh;
/// the CLI is the source of truth and nothing is cached.
#[derive(Debug, Clone)]
pub struct ContainerDirectory {
    config: DirectoryConfig,
}

impl ContainerDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        Self { config }
    }

    pub fn image(&self) -> &str {
        &self.config.image
    }

    /// List running containers of the configured image.
    pub async fn list(&self) -> Result<Vec<ContainerRecord>, DirectoryError> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(["ls", "--format", "json"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = timeout(self.config.command_timeout, cmd.output())
            .await
            .map_err(|_| DirectoryError::Timeout)??;

        if !output.status.success() {
            return Err(DirectoryError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = parse_listing(&stdout, &self.config.image)?;
        debug!(
            "Container listing: {} running {}",
            records.len(),
            self.config.image
        );
        Ok(records)
    }
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
