//! Parsing and shaping of `container ls --format json` output.
//!
//! The CLI reports a nested document per container; the viewer only needs a
//! flat record with the CDP and RDP coordinates resolved. Containers that
//! publish port 9222 to the host are addressed through loopback, everything
//! else through the container's own network address.

use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;

const CDP_CONTAINER_PORT: u16 = 9222;
const RDP_CONTAINER_PORT: u16 = 3389;

/// One running browser container, flattened for the viewer API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    pub id: String,
    pub image: String,
    /// Container network address, CIDR suffix stripped.
    pub addr: String,
    /// Host to dial for CDP: loopback when 9222 is published, else `addr`.
    pub cdp_host: String,
    pub cdp_port: u16,
    /// Published RDP port, if any.
    pub rdp_port: Option<u16>,
    pub cpus: u32,
    #[serde(rename = "memoryMB")]
    pub memory_mb: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContainer {
    #[serde(default)]
    status: String,
    #[serde(default)]
    configuration: RawConfiguration,
    #[serde(default)]
    networks: Vec<RawNetwork>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfiguration {
    #[serde(default)]
    id: String,
    image: Option<RawImage>,
    resources: Option<RawResources>,
    #[serde(default)]
    published_ports: Vec<RawPortMapping>,
}

/// The image field is a plain reference string in older CLI builds and an
/// object in newer ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawImage {
    Text(String),
    Object {
        description: Option<String>,
        name: Option<String>,
    },
}

impl RawImage {
    fn reference(&self) -> &str {
        match self {
            RawImage::Text(reference) => reference,
            RawImage::Object { description, name } => description
                .as_deref()
                .or(name.as_deref())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResources {
    cpus: Option<u32>,
    memory_in_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNetwork {
    ipv4_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPortMapping {
    container_port: Option<u16>,
    host_port: Option<u16>,
}

/// Parse CLI output into viewer records, keeping only running containers of
/// the given image. The CLI emits a bare object when exactly one container
/// exists, an array otherwise; empty output means an empty fleet.
pub fn parse_listing(text: &str, image: &str) -> Result<Vec<ContainerRecord>, DirectoryError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let containers = match serde_json::from_str::<Vec<RawContainer>>(trimmed) {
        Ok(list) => list,
        Err(_) => vec![serde_json::from_str::<RawContainer>(trimmed)?],
    };

    Ok(containers
        .iter()
        .filter(|c| c.status.eq_ignore_ascii_case("running"))
        .filter(|c| {
            c.configuration
                .image
                .as_ref()
                .is_some_and(|i| i.reference() == image)
        })
        .map(flatten)
        .collect())
}

fn flatten(raw: &RawContainer) -> ContainerRecord {
    let config = &raw.configuration;
    let cdp = mapping_for(config, CDP_CONTAINER_PORT);
    let rdp = mapping_for(config, RDP_CONTAINER_PORT);

    let addr = raw
        .networks
        .first()
        .and_then(|n| n.ipv4_address.as_deref())
        .map(strip_cidr)
        .unwrap_or_default()
        .to_string();
    let cdp_host = if cdp.is_some() {
        "127.0.0.1".to_string()
    } else {
        addr.clone()
    };

    ContainerRecord {
        id: config.id.clone(),
        image: config
            .image
            .as_ref()
            .map(|i| i.reference().to_string())
            .unwrap_or_default(),
        addr,
        cdp_host,
        cdp_port: cdp.and_then(|p| p.host_port).unwrap_or(CDP_CONTAINER_PORT),
        rdp_port: rdp.and_then(|p| p.host_port),
        cpus: config.resources.as_ref().and_then(|r| r.cpus).unwrap_or(0),
        memory_mb: config
            .resources
            .as_ref()
            .and_then(|r| r.memory_in_bytes)
            .map(|bytes| (bytes as f64 / (1024.0 * 1024.0)).round() as u64)
            .unwrap_or(0),
    }
}

fn mapping_for(config: &RawConfiguration, container_port: u16) -> Option<&RawPortMapping> {
    config
        .published_ports
        .iter()
        .find(|p| p.container_port == Some(container_port))
}

/// Drop a trailing `/prefix-length` from an address like `192.168.64.3/24`.
fn strip_cidr(addr: &str) -> &str {
    match addr.rsplit_once('/') {
        Some((ip, suffix)) if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) => {
            ip
        }
        _ => addr,
    }
}

#[cfg(test)]
#[path = "listing_tests.rs"]
mod tests;
