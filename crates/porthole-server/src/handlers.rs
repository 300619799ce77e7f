//! JSON API handlers backing the viewer frontend.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use porthole_containers::ContainerRecord;

use crate::state::AppState;

/// `GET /api/containers`: the running browser containers.
///
/// Listing failures degrade to an empty fleet so the frontend's poll loop
/// keeps running; the cause lands in the log instead.
pub async fn list_containers(State(state): State<AppState>) -> Response {
    match state.directory.list().await {
        Ok(records) => Json(records).into_response(),
        Err(err) => {
            warn!("Container listing failed: {}", err);
            Json(Vec::<ContainerRecord>::new()).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CdpTargetsQuery {
    #[serde(default = "default_probe_host")]
    pub host: String,
    #[serde(default = "default_probe_port")]
    pub port: u16,
    #[serde(default = "default_probe_path")]
    pub path: String,
}

fn default_probe_host() -> String {
    "127.0.0.1".to_string()
}

fn default_probe_port() -> u16 {
    9222
}

fn default_probe_path() -> String {
    "/json".to_string()
}

/// `GET /api/cdp-targets`: probe a CDP HTTP endpoint from the host side.
///
/// The browser page cannot reach container addresses itself, so this relays
/// the request and mirrors whatever the endpoint answers, status included.
pub async fn cdp_targets(
    State(state): State<AppState>,
    Query(query): Query<CdpTargetsQuery>,
) -> Response {
    let url = format!("http://{}:{}{}", query.host, query.port, query.path);
    let upstream = match state.http.get(&url).send().await {
        Ok(upstream) => upstream,
        Err(err) => return probe_error(&url, &err),
    };

    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    match upstream.text().await {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err) => probe_error(&url, &err),
    }
}

fn probe_error(url: &str, err: &reqwest::Error) -> Response {
    warn!("CDP probe {} failed: {}", url, err);
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({"error": err.to_string()})),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct RdpFileQuery {
    #[serde(default = "default_rdp_port")]
    pub port: u16,
}

fn default_rdp_port() -> u16 {
    3389
}

/// `GET /api/rdp-file`: an `.rdp` download pointing the host's RDP client at
/// a published container port.
pub async fn rdp_file(Query(query): Query<RdpFileQuery>) -> impl IntoResponse {
    let body = format!(
        "full address:s:localhost:{}\r\nusername:s:browser\r\n",
        query.port
    );
    (
        [
            (header::CONTENT_TYPE, "application/x-rdp"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"container.rdp\"",
            ),
        ],
        body,
    )
}
