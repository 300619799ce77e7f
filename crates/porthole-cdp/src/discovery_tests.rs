use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_discovery_timeout_value() {
    assert_eq!(DISCOVERY_TIMEOUT, Duration::from_millis(3000));
}

#[tokio::test]
async fn test_fetch_version_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"Browser":"HeadlessChrome/120.0","webSocketDebuggerUrl":"ws://10.0.5.2:9222/devtools/browser/abc-123"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let addr = server.address();
    let client = reqwest::Client::new();
    let version = fetch_version(&client, &addr.ip().to_string(), addr.port())
        .await
        .unwrap();

    assert_eq!(version.browser.as_deref(), Some("HeadlessChrome/120.0"));
    assert_eq!(
        version.web_socket_debugger_url.as_deref(),
        Some("ws://10.0.5.2:9222/devtools/browser/abc-123")
    );
}

#[tokio::test]
async fn test_fetch_version_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let addr = server.address();
    let client = reqwest::Client::new();
    let result = fetch_version(&client, &addr.ip().to_string(), addr.port()).await;
    assert!(matches!(result, Err(CdpError::Discovery(_))));
}

#[tokio::test]
async fn test_fetch_version_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let addr = server.address();
    let client = reqwest::Client::new();
    let result = fetch_version(&client, &addr.ip().to_string(), addr.port()).await;
    assert!(matches!(result, Err(CdpError::Discovery(_))));
}

#[test]
fn test_websocket_url_reroots_path() {
    let version = VersionInfo {
        browser: None,
        protocol_version: None,
        user_agent: None,
        web_socket_debugger_url: Some("ws://10.0.5.2:9222/devtools/browser/abc-123".to_string()),
    };
    let url = websocket_url(&version, "127.0.0.1", 19222).unwrap();
    assert_eq!(url, "ws://127.0.0.1:19222/devtools/browser/abc-123");
}

#[test]
fn test_websocket_url_missing_debugger_url() {
    let version = VersionInfo {
        browser: Some("HeadlessChrome/120.0".to_string()),
        protocol_version: None,
        user_agent: None,
        web_socket_debugger_url: None,
    };
    let result = websocket_url(&version, "127.0.0.1", 9222);
    assert!(matches!(result, Err(CdpError::MissingDebuggerUrl)));
}

#[test]
fn test_websocket_url_unparseable_debugger_url() {
    let version = VersionInfo {
        browser: None,
        protocol_version: None,
        user_agent: None,
        web_socket_debugger_url: Some("not a url".to_string()),
    };
    let result = websocket_url(&version, "127.0.0.1", 9222);
    assert!(matches!(result, Err(CdpError::InvalidDebuggerUrl(_))));
}
