//! Async task that owns the socket, the retry timers, and the machine.
//!
//! [`spawn`] starts a background task that repeatedly discovers the endpoint,
//! dials it, and pumps the session until it drops, surfacing
//! [`ControllerEvent`]s on the channel the caller provided. Discovery and
//! transport failures retry after [`ControllerConfig::error_retry`]; clean
//! closes reconnect after [`ControllerConfig::reconnect_delay`].

use std::time::{Duration, Instant};

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::discovery::{fetch_version, websocket_url};
use crate::error::CdpError;
use crate::protocol::ScreencastOptions;

use super::machine::{Action, ControllerEvent, ScreencastMachine};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Where the controller dials and how it paces retries.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Host the CDP endpoint is reachable on.
    pub host: String,
    /// CDP debugging port.
    pub port: u16,
    /// Capture parameters passed to `Page.startScreencast`.
    pub screencast: ScreencastOptions,
    /// Pause before retrying after a discovery or transport failure.
    pub error_retry: Duration,
    /// Pause before redialing after a clean close.
    pub reconnect_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9222,
            screencast: ScreencastOptions::default(),
            error_retry: Duration::from_millis(3000),
            reconnect_delay: Duration::from_millis(2000),
        }
    }
}

/// Commands a consumer can issue against a running controller.
#[derive(Debug, Clone)]
enum ControllerCommand {
    SwitchTab(String),
}

/// Owner's side of a spawned controller task.
pub struct ControllerHandle {
    commands: mpsc::UnboundedSender<ControllerCommand>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    /// Ask the controller to move the screencast to another tab.
    ///
    /// Commands issued while no connection is live are dropped, matching a
    /// click on a tab strip that is no longer backed by a socket.
    pub fn switch_tab(&self, target_id: impl Into<String>) -> Result<(), CdpError> {
        self.commands
            .send(ControllerCommand::SwitchTab(target_id.into()))
            .map_err(|_| CdpError::ControllerGone)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the controller and wait for its task to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

/// Start a controller task for the given endpoint.
///
/// Events are delivered on `events` until the handle is shut down. Dropping
/// the receiver does not stop the task; only [`ControllerHandle::shutdown`]
/// does.
pub fn spawn(
    config: ControllerConfig,
    events: mpsc::UnboundedSender<ControllerEvent>,
) -> ControllerHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run(config, events, command_rx, cancel.clone()));
    ControllerHandle {
        commands: command_tx,
        cancel,
        task,
    }
}

enum SessionEnd {
    Cancelled,
    Closed,
    Failed(String),
}

async fn run(
    config: ControllerConfig,
    events: mpsc::UnboundedSender<ControllerEvent>,
    mut commands: mpsc::UnboundedReceiver<ControllerCommand>,
    cancel: CancellationToken,
) {
    let client = reqwest::Client::new();
    let mut machine = ScreencastMachine::new(config.screencast.clone());

    loop {
        if cancel.is_cancelled() {
            break;
        }

        emit_all(machine.begin_discovery(), &events);
        debug!("Resolving CDP endpoint at {}:{}", config.host, config.port);
        let resolved = tokio::select! {
            _ = cancel.cancelled() => break,
            version = fetch_version(&client, &config.host, config.port) => {
                version.and_then(|v| websocket_url(&v, &config.host, config.port))
            }
        };
        let url = match resolved {
            Ok(url) => url,
            Err(err) => {
                warn!("CDP discovery failed: {}", err);
                emit_all(machine.fail(err.to_string()), &events);
                if !wait(&cancel, config.error_retry).await {
                    break;
                }
                continue;
            }
        };

        emit_all(machine.begin_connect(), &events);
        debug!("Connecting to {}", url);
        let dialed = tokio::select! {
            _ = cancel.cancelled() => break,
            connected = connect_async(url.as_str()) => connected,
        };
        let stream = match dialed {
            Ok((stream, _)) => stream,
            Err(err) => {
                warn!("WebSocket connect failed: {}", err);
                emit_all(machine.fail(err.to_string()), &events);
                if !wait(&cancel, config.error_retry).await {
                    break;
                }
                continue;
            }
        };
        let (mut ws_tx, mut ws_rx) = stream.split();

        // Tab clicks queued while offline refer to a dead connection.
        while commands.try_recv().is_ok() {}

        let end = match perform(machine.socket_opened(), &mut ws_tx, &events).await {
            Ok(()) => {
                session_loop(
                    &mut machine,
                    &mut ws_tx,
                    &mut ws_rx,
                    &mut commands,
                    &cancel,
                    &events,
                )
                .await
            }
            Err(err) => SessionEnd::Failed(err.to_string()),
        };
        let _ = ws_tx.close().await;

        match end {
            SessionEnd::Cancelled => break,
            SessionEnd::Closed => {
                debug!("CDP socket closed");
                emit_all(machine.connection_lost(), &events);
                if !wait(&cancel, config.reconnect_delay).await {
                    break;
                }
            }
            SessionEnd::Failed(message) => {
                warn!("CDP session failed: {}", message);
                emit_all(machine.fail(message), &events);
                if !wait(&cancel, config.error_retry).await {
                    break;
                }
            }
        }
    }

    emit_all(machine.reset(), &events);
}

async fn session_loop(
    machine: &mut ScreencastMachine,
    ws_tx: &mut WsSink,
    ws_rx: &mut WsSource,
    commands: &mut mpsc::UnboundedReceiver<ControllerCommand>,
    cancel: &CancellationToken,
    events: &mpsc::UnboundedSender<ControllerEvent>,
) -> SessionEnd {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Cancelled,
            command = commands.recv() => match command {
                Some(ControllerCommand::SwitchTab(target_id)) => {
                    let actions = machine.switch_tab(&target_id);
                    if let Err(err) = perform(actions, ws_tx, events).await {
                        return SessionEnd::Failed(err.to_string());
                    }
                }
                None => return SessionEnd::Cancelled,
            },
            message = ws_rx.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    trace!("CDP recv: {}", text);
                    let actions = machine.handle_message(text.as_str(), Instant::now());
                    if let Err(err) = perform(actions, ws_tx, events).await {
                        return SessionEnd::Failed(err.to_string());
                    }
                }
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Closed,
                Some(Ok(_)) => {}
                Some(Err(err)) => return SessionEnd::Failed(err.to_string()),
            },
        }
    }
}

async fn perform(
    actions: Vec<Action>,
    ws_tx: &mut WsSink,
    events: &mpsc::UnboundedSender<ControllerEvent>,
) -> Result<(), CdpError> {
    for action in actions {
        match action {
            Action::Send(request) => {
                let text = serde_json::to_string(&request)?;
                trace!("CDP send: {}", text);
                ws_tx.send(Message::Text(text.into())).await?;
            }
            Action::Emit(event) => {
                let _ = events.send(event);
            }
        }
    }
    Ok(())
}

fn emit_all(actions: Vec<Action>, events: &mpsc::UnboundedSender<ControllerEvent>) {
    for action in actions {
        if let Action::Emit(event) = action {
            let _ = events.send(event);
        }
    }
}

/// Sleep unless cancelled first. Returns false when the controller should
/// stop instead of retrying.
async fn wait(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
