//! Relay tests over real sockets: an axum server on one ephemeral port, a
//! bare tokio-tungstenite upstream on another, and a client connecting
//! through `/ws-proxy` between them.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, connect_async};

use porthole_containers::{ContainerDirectory, DirectoryConfig};
use porthole_server::{create_router, AppState};

async fn start_relay() -> u16 {
    let directory = ContainerDirectory::new(DirectoryConfig {
        program: "true".to_string(),
        ..Default::default()
    });
    let state = AppState::new(directory).unwrap();
    let router = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    port
}

fn proxy_url(relay_port: u16, upstream_port: u16) -> String {
    format!("ws://127.0.0.1:{relay_port}/ws-proxy?target=ws://127.0.0.1:{upstream_port}/")
}

#[tokio::test]
async fn test_messages_sent_before_upstream_opens_flush_in_order() {
    let relay_port = start_relay().await;
    let upstream_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_port = upstream_listener.local_addr().unwrap().port();

    // Accept the TCP connection but sit on the WebSocket handshake, holding
    // the relay in its buffering phase while the client talks.
    let upstream_task = tokio::spawn(async move {
        let (stream, _) = upstream_listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let mut ws = accept_async(stream).await.unwrap();
        let mut received = Vec::new();
        while received.len() < 3 {
            match timeout(Duration::from_secs(5), ws.next()).await.unwrap() {
                Some(Ok(Message::Text(text))) => received.push(text.to_string()),
                Some(Ok(_)) => {}
                other => panic!("upstream stream ended early: {other:?}"),
            }
        }
        received
    });

    let (mut client, _) = connect_async(proxy_url(relay_port, upstream_port).as_str())
        .await
        .unwrap();
    for n in 1..=3 {
        let text = format!("{{\"id\":{n}}}");
        client.send(Message::Text(text.into())).await.unwrap();
    }

    let received = upstream_task.await.unwrap();
    assert_eq!(received, vec![r#"{"id":1}"#, r#"{"id":2}"#, r#"{"id":3}"#]);
}

#[tokio::test]
async fn test_upstream_replies_reach_the_client_verbatim() {
    let relay_port = start_relay().await;
    let upstream_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_port = upstream_listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (stream, _) = upstream_listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let reply = format!("{{\"echo\":{text}}}");
            ws.send(Message::Text(reply.into())).await.unwrap();
        }
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (mut client, _) = connect_async(proxy_url(relay_port, upstream_port).as_str())
        .await
        .unwrap();
    client
        .send(Message::Text(r#"{"id":1}"#.into()))
        .await
        .unwrap();

    match timeout(Duration::from_secs(5), client.next()).await.unwrap() {
        Some(Ok(Message::Text(text))) => assert_eq!(text.as_str(), r#"{"echo":{"id":1}}"#),
        other => panic!("expected echo, got {other:?}"),
    }
}

#[tokio::test]
async fn test_upstream_close_closes_the_client() {
    let relay_port = start_relay().await;
    let upstream_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_port = upstream_listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (stream, _) = upstream_listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(None).await.unwrap();
    });

    let (mut client, _) = connect_async(proxy_url(relay_port, upstream_port).as_str())
        .await
        .unwrap();
    match timeout(Duration::from_secs(5), client.next()).await.unwrap() {
        Some(Ok(Message::Close(_))) | None => {}
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_close_closes_the_upstream() {
    let relay_port = start_relay().await;
    let upstream_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_port = upstream_listener.local_addr().unwrap().port();

    let upstream_task = tokio::spawn(async move {
        let (stream, _) = upstream_listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        // Tell the client the bridge is live before it hangs up.
        ws.send(Message::Text("ready".into())).await.unwrap();
        matches!(
            timeout(Duration::from_secs(5), ws.next()).await.unwrap(),
            Some(Ok(Message::Close(_))) | None
        )
    });

    let (mut client, _) = connect_async(proxy_url(relay_port, upstream_port).as_str())
        .await
        .unwrap();
    match timeout(Duration::from_secs(5), client.next()).await.unwrap() {
        Some(Ok(Message::Text(text))) => assert_eq!(text.as_str(), "ready"),
        other => panic!("expected ready, got {other:?}"),
    }
    client.close(None).await.unwrap();

    assert!(upstream_task.await.unwrap());
}

#[tokio::test]
async fn test_failed_dial_closes_the_client() {
    let relay_port = start_relay().await;
    let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_port = reserved.local_addr().unwrap().port();
    drop(reserved);

    let (mut client, _) = connect_async(proxy_url(relay_port, dead_port).as_str())
        .await
        .unwrap();
    match timeout(Duration::from_secs(5), client.next()).await.unwrap() {
        Some(Ok(Message::Close(_))) | None => {}
        other => panic!("expected close, got {other:?}"),
    }
}
