//! Route table and embedded frontend.

use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use rust_embed::RustEmbed;
use tower_http::trace::TraceLayer;

use crate::handlers::{cdp_targets, list_containers, rdp_file};
use crate::relay::ws_proxy;
use crate::state::AppState;

/// Embedded static assets.
#[derive(RustEmbed)]
#[folder = "src/static/"]
struct StaticAssets;

/// Create the viewer router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // JSON API
        .route("/api/containers", get(list_containers))
        .route("/api/cdp-targets", get(cdp_targets))
        .route("/api/rdp-file", get(rdp_file))
        // WebSocket relay
        .route("/ws-proxy", get(ws_proxy))
        // The viewer is a single page; every other path serves it
        .fallback(serve_index)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the viewer page.
async fn serve_index() -> impl IntoResponse {
    match StaticAssets::get("index.html") {
        Some(content) => Html(String::from_utf8_lossy(content.data.as_ref()).to_string()),
        None => Html(default_index_html().to_string()),
    }
}

fn default_index_html() -> &'static str {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Porthole</title>
</head>
<body>
    <p>Viewer assets were not embedded in this build.</p>
</body>
</html>"#
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
