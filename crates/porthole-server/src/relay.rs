//! WebSocket relay between a viewer page and a container CDP endpoint.
//!
//! The page cannot open sockets to container-internal addresses, so it
//! connects back to this server and names the real endpoint in the query
//! string. The relay dials that endpoint and shuttles frames both ways.
//! Anything the page sends while the upstream dial is still in flight is
//! buffered and flushed, in arrival order, the moment the dial completes.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type UpstreamStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    pub target: Option<String>,
}

/// `GET /ws-proxy?target=...`: upgrade and bridge to the named endpoint.
///
/// A missing target is answered before any upgrade happens, so plain HTTP
/// probes and broken callers get a readable 400 instead of a dead socket.
pub async fn ws_proxy(
    Query(query): Query<RelayQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(target) = query.target else {
        return (StatusCode::BAD_REQUEST, "Missing target param").into_response();
    };
    match ws {
        Ok(upgrade) => upgrade.on_upgrade(move |socket| relay_session(socket, target)),
        Err(_) => (StatusCode::UPGRADE_REQUIRED, "WebSocket upgrade required").into_response(),
    }
}

enum Dial {
    Upstream(UpstreamStream),
    ClientGone,
    Failed(String),
}

enum ClientFrame {
    Forward(UpstreamMessage),
    Ignore,
    Closed,
}

fn classify_client(message: Message) -> ClientFrame {
    match message {
        Message::Text(text) => ClientFrame::Forward(UpstreamMessage::Text(text.as_str().into())),
        Message::Binary(data) => ClientFrame::Forward(UpstreamMessage::Binary(data)),
        Message::Ping(_) | Message::Pong(_) => ClientFrame::Ignore,
        Message::Close(_) => ClientFrame::Closed,
    }
}

fn upstream_to_client(message: UpstreamMessage) -> Option<Message> {
    match message {
        UpstreamMessage::Text(text) => Some(Message::Text(text.as_str().into())),
        UpstreamMessage::Binary(data) => Some(Message::Binary(data)),
        _ => None,
    }
}

async fn relay_session(mut client: WebSocket, target: String) {
    let session = uuid::Uuid::new_v4();
    debug!("Relay {} dialing {}", session, target);

    // Phase 1: dial the upstream while buffering whatever the client sends.
    let mut buffered: Vec<UpstreamMessage> = Vec::new();
    let connect = connect_async(target.as_str());
    tokio::pin!(connect);

    let dial = loop {
        tokio::select! {
            connected = &mut connect => match connected {
                Ok((stream, _)) => break Dial::Upstream(stream),
                Err(err) => break Dial::Failed(err.to_string()),
            },
            incoming = client.recv() => match incoming {
                Some(Ok(message)) => match classify_client(message) {
                    ClientFrame::Forward(converted) => buffered.push(converted),
                    ClientFrame::Ignore => {}
                    ClientFrame::Closed => break Dial::ClientGone,
                },
                Some(Err(_)) | None => break Dial::ClientGone,
            },
        }
    };

    let upstream = match dial {
        Dial::Upstream(stream) => stream,
        Dial::ClientGone => {
            debug!("Relay {}: client left before upstream opened", session);
            return;
        }
        Dial::Failed(err) => {
            warn!("Relay {}: dial {} failed: {}", session, target, err);
            let _ = client.send(Message::Close(None)).await;
            return;
        }
    };

    let (mut upstream_tx, mut upstream_rx) = upstream.split();

    // Flush the backlog exactly once, in arrival order.
    if !buffered.is_empty() {
        debug!("Relay {}: flushing {} buffered messages", session, buffered.len());
        for message in buffered {
            if upstream_tx.send(message).await.is_err() {
                let _ = client.send(Message::Close(None)).await;
                return;
            }
        }
    }

    // Phase 2: straight passthrough until either side goes away.
    loop {
        tokio::select! {
            incoming = client.recv() => match incoming {
                Some(Ok(message)) => match classify_client(message) {
                    ClientFrame::Forward(converted) => {
                        if upstream_tx.send(converted).await.is_err() {
                            break;
                        }
                    }
                    ClientFrame::Ignore => {}
                    ClientFrame::Closed => break,
                },
                Some(Err(_)) | None => break,
            },
            outgoing = upstream_rx.next() => match outgoing {
                Some(Ok(UpstreamMessage::Close(_))) | None => break,
                Some(Ok(message)) => {
                    if let Some(converted) = upstream_to_client(message) {
                        // A stalled viewer must not tear down the CDP side
                        // from here; its recv arm will see the close.
                        let _ = client.send(converted).await;
                    }
                }
                Some(Err(err)) => {
                    warn!("Relay {}: upstream error: {}", session, err);
                    break;
                }
            },
        }
    }

    debug!("Relay {} closing", session);
    let _ = upstream_tx.close().await;
    let _ = client.send(Message::Close(None)).await;
}
