//! Serde models for the slice of the CDP wire surface this crate speaks.
//!
//! Requests go out as `{id, method, params, sessionId?}`. The browser answers
//! with `{id, result}` replies or `{method, params, sessionId?}` events. Only
//! the `Target.*` / `Page.*` shapes the screencast pipeline touches are
//! modeled here; anything else is ignored by the consumer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound CDP request envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Inbound CDP envelope: either a reply to one of our requests (`id` +
/// `result`) or a protocol event (`method` + `params`), optionally scoped to
/// an attached session.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpEnvelope {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Description of a CDP target as reported by the `Target` domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub target_id: String,
    /// Target type: "page", "background_page", "service_worker", etc.
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub attached: bool,
}

/// Reply payload of `Target.getTargets`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTargetsResult {
    pub target_infos: Vec<TargetInfo>,
}

/// Reply payload of `Target.attachToTarget`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachToTargetResult {
    pub session_id: String,
}

/// Params of `Target.targetCreated` and `Target.targetInfoChanged`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfoEvent {
    pub target_info: TargetInfo,
}

/// Params of `Target.targetDestroyed`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDestroyedEvent {
    pub target_id: String,
}

/// Params of a `Page.screencastFrame` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreencastFrameEvent {
    /// Base64-encoded JPEG payload.
    pub data: String,
    #[serde(default)]
    pub metadata: ScreencastFrameMetadata,
    /// Frame token, echoed back in `Page.screencastFrameAck`.
    pub session_id: i64,
}

/// Viewport metadata attached to each screencast frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreencastFrameMetadata {
    pub offset_top: f64,
    pub page_scale_factor: f64,
    pub device_width: f64,
    pub device_height: f64,
    pub scroll_offset_x: f64,
    pub scroll_offset_y: f64,
    pub timestamp: Option<f64>,
}

/// Parameters of `Page.startScreencast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreencastOptions {
    /// Frame encoding, "jpeg" or "png".
    pub format: String,
    /// Compression quality, 0-100.
    pub quality: u8,
    /// Capture every n-th frame.
    pub every_nth_frame: u32,
}

impl Default for ScreencastOptions {
    fn default() -> Self {
        Self {
            format: "jpeg".to_string(),
            quality: 80,
            every_nth_frame: 1,
        }
    }
}

/// Reply shape of the browser's `/json/version` HTTP endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "Browser", default)]
    pub browser: Option<String>,
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: Option<String>,
    #[serde(rename = "User-Agent", default)]
    pub user_agent: Option<String>,
    /// Browser-level debugger endpoint. Reported against the browser's own
    /// address, which inside a container is not the one callers can reach.
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: Option<String>,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
