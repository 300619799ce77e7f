//! Sans-I/O core of the screencast session controller.
//!
//! The machine never touches a socket or a clock. Feed it connection
//! lifecycle inputs, raw CDP text, and tab commands; it answers with the
//! ordered list of requests to send and events to surface. The driver owns
//! the I/O and the retry timers.

use std::time::Instant;

use serde_json::json;

use crate::protocol::{
    AttachToTargetResult, CdpEnvelope, CdpRequest, GetTargetsResult, ScreencastFrameEvent,
    ScreencastOptions, TargetDestroyedEvent, TargetInfo, TargetInfoEvent,
};

use super::stats::FrameStats;

/// Lifecycle of one screencast pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerState {
    /// Nothing selected, no connection.
    Idle,
    /// Fetching the endpoint descriptor.
    Discovering,
    /// Socket opening or open, no frame seen yet.
    Connecting,
    /// Frames are flowing.
    Streaming,
    /// Connection lost, reconnect pending.
    Disconnected,
    /// Discovery or transport failure, retry pending.
    Error(String),
}

impl ControllerState {
    /// Short tag for logs and UIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Idle => "idle",
            ControllerState::Discovering => "discovering",
            ControllerState::Connecting => "connecting",
            ControllerState::Streaming => "streaming",
            ControllerState::Disconnected => "disconnected",
            ControllerState::Error(_) => "error",
        }
    }
}

/// A page-type target the controller is tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTarget {
    pub target_id: String,
    pub title: String,
    pub url: String,
}

impl From<&TargetInfo> for PageTarget {
    fn from(info: &TargetInfo) -> Self {
        Self {
            target_id: info.target_id.clone(),
            title: info.title.clone(),
            url: info.url.clone(),
        }
    }
}

/// One screencast frame plus the running statistics at its arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    /// Base64-encoded JPEG payload.
    pub data: String,
    pub frames: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
}

/// Consumer-visible outputs of the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The lifecycle state changed.
    State(ControllerState),
    /// The known tab set changed.
    Tabs(Vec<PageTarget>),
    /// A different tab (or none) is now active.
    ActiveTab(Option<String>),
    /// A screencast frame arrived.
    Frame(FrameUpdate),
}

/// What the owner must do after feeding the machine an input.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Serialize and send this request on the socket.
    Send(CdpRequest),
    /// Deliver this event to the consumer.
    Emit(ControllerEvent),
}

/// State machine for one controller instance.
///
/// Replies are recognized by payload shape rather than request id:
/// `result.targetInfos` answers the target enumeration and
/// `result.sessionId` answers an attach. Everything else without a known
/// event method is ignored, as is unparseable input.
#[derive(Debug)]
pub struct ScreencastMachine {
    state: ControllerState,
    next_id: u64,
    tabs: Vec<PageTarget>,
    active: Option<String>,
    session: Option<String>,
    stats: FrameStats,
    screencast: ScreencastOptions,
}

impl ScreencastMachine {
    pub fn new(screencast: ScreencastOptions) -> Self {
        Self {
            state: ControllerState::Idle,
            next_id: 0,
            tabs: Vec::new(),
            active: None,
            session: None,
            stats: FrameStats::default(),
            screencast,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn tabs(&self) -> &[PageTarget] {
        &self.tabs
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// The discovery step started.
    pub fn begin_discovery(&mut self) -> Vec<Action> {
        self.set_state(ControllerState::Discovering)
    }

    /// The descriptor resolved; the dial is starting.
    pub fn begin_connect(&mut self) -> Vec<Action> {
        self.set_state(ControllerState::Connecting)
    }

    /// The socket is open: subscribe to target lifecycle events and
    /// enumerate the existing targets.
    pub fn socket_opened(&mut self) -> Vec<Action> {
        let mut actions = self.set_state(ControllerState::Connecting);
        actions.push(self.request("Target.setDiscoverTargets", json!({"discover": true}), None));
        actions.push(self.request("Target.getTargets", json!({}), None));
        actions
    }

    /// Feed one raw text frame from the socket. Malformed JSON and unknown
    /// shapes produce no actions.
    pub fn handle_message(&mut self, text: &str, now: Instant) -> Vec<Action> {
        let Ok(envelope) = serde_json::from_str::<CdpEnvelope>(text) else {
            return Vec::new();
        };

        let mut actions = Vec::new();

        if let Some(result) = envelope.result {
            if let Ok(listing) = serde_json::from_value::<GetTargetsResult>(result.clone()) {
                actions.extend(self.on_targets_listed(listing.target_infos));
            } else if let Ok(attach) = serde_json::from_value::<AttachToTargetResult>(result) {
                actions.extend(self.on_attached(attach.session_id));
            }
            return actions;
        }

        let Some(method) = envelope.method.as_deref() else {
            return actions;
        };
        let Some(params) = envelope.params else {
            return actions;
        };

        match method {
            "Page.screencastFrame" => {
                if let Ok(frame) = serde_json::from_value::<ScreencastFrameEvent>(params) {
                    actions.extend(self.on_frame(frame, envelope.session_id, now));
                }
            }
            "Target.targetCreated" => {
                if let Ok(event) = serde_json::from_value::<TargetInfoEvent>(params) {
                    actions.extend(self.on_target_created(event.target_info));
                }
            }
            "Target.targetDestroyed" => {
                if let Ok(event) = serde_json::from_value::<TargetDestroyedEvent>(params) {
                    actions.extend(self.on_target_destroyed(&event.target_id));
                }
            }
            "Target.targetInfoChanged" => {
                if let Ok(event) = serde_json::from_value::<TargetInfoEvent>(params) {
                    actions.extend(self.on_target_changed(event.target_info));
                }
            }
            _ => {}
        }
        actions
    }

    /// User-initiated tab switch. Switching to the active tab, or without a
    /// live connection, is a no-op.
    pub fn switch_tab(&mut self, target_id: &str) -> Vec<Action> {
        if self.active.as_deref() == Some(target_id) {
            return Vec::new();
        }
        if !matches!(
            self.state,
            ControllerState::Connecting | ControllerState::Streaming
        ) {
            return Vec::new();
        }

        let mut actions = Vec::new();
        if let Some(session) = self.session.take() {
            actions.push(self.request("Page.stopScreencast", json!({}), Some(session.clone())));
            actions.push(self.request(
                "Target.detachFromTarget",
                json!({"sessionId": session}),
                None,
            ));
        }
        self.active = Some(target_id.to_string());
        actions.push(Action::Emit(ControllerEvent::ActiveTab(Some(
            target_id.to_string(),
        ))));
        actions.extend(self.set_state(ControllerState::Connecting));
        actions.push(self.attach_request(target_id));
        actions
    }

    /// The socket closed cleanly. Per-connection state is dropped; the
    /// driver schedules the reconnect.
    pub fn connection_lost(&mut self) -> Vec<Action> {
        let mut actions = self.clear_connection();
        actions.extend(self.set_state(ControllerState::Disconnected));
        actions
    }

    /// Discovery, dial, or transport failure.
    pub fn fail(&mut self, message: impl Into<String>) -> Vec<Action> {
        let mut actions = self.clear_connection();
        actions.extend(self.set_state(ControllerState::Error(message.into())));
        actions
    }

    /// Tear down to idle.
    pub fn reset(&mut self) -> Vec<Action> {
        let mut actions = self.clear_connection();
        actions.extend(self.set_state(ControllerState::Idle));
        actions
    }

    fn on_targets_listed(&mut self, infos: Vec<TargetInfo>) -> Vec<Action> {
        let pages: Vec<PageTarget> = infos
            .iter()
            .filter(|t| t.target_type == "page")
            .map(PageTarget::from)
            .collect();
        self.tabs = pages.clone();

        let mut actions = vec![Action::Emit(ControllerEvent::Tabs(pages))];
        if self.active.is_none() {
            if let Some(first) = self.tabs.first() {
                let id = first.target_id.clone();
                self.active = Some(id.clone());
                actions.push(Action::Emit(ControllerEvent::ActiveTab(Some(id.clone()))));
                actions.push(self.attach_request(&id));
            }
        }
        actions
    }

    fn on_attached(&mut self, session_id: String) -> Vec<Action> {
        self.session = Some(session_id.clone());
        let params = serde_json::to_value(&self.screencast).unwrap_or_else(|_| json!({}));
        vec![self.request("Page.startScreencast", params, Some(session_id))]
    }

    fn on_frame(
        &mut self,
        frame: ScreencastFrameEvent,
        envelope_session: Option<String>,
        now: Instant,
    ) -> Vec<Action> {
        self.stats.record(
            now,
            frame.metadata.device_width as u32,
            frame.metadata.device_height as u32,
        );

        // Ack carries the frame's own token; the envelope is scoped to the
        // session that produced the frame, falling back to the binding.
        let ack_session = envelope_session.or_else(|| self.session.clone());
        let mut actions = vec![self.request(
            "Page.screencastFrameAck",
            json!({"sessionId": frame.session_id}),
            ack_session,
        )];
        actions.extend(self.set_state(ControllerState::Streaming));
        actions.push(Action::Emit(ControllerEvent::Frame(FrameUpdate {
            data: frame.data,
            frames: self.stats.frames,
            fps: self.stats.fps,
            width: self.stats.width,
            height: self.stats.height,
        })));
        actions
    }

    fn on_target_created(&mut self, info: TargetInfo) -> Vec<Action> {
        if info.target_type != "page"
            || self.tabs.iter().any(|t| t.target_id == info.target_id)
        {
            return Vec::new();
        }
        self.tabs.push(PageTarget::from(&info));
        vec![Action::Emit(ControllerEvent::Tabs(self.tabs.clone()))]
    }

    fn on_target_destroyed(&mut self, target_id: &str) -> Vec<Action> {
        let before = self.tabs.len();
        self.tabs.retain(|t| t.target_id != target_id);

        let mut actions = Vec::new();
        if self.tabs.len() != before {
            actions.push(Action::Emit(ControllerEvent::Tabs(self.tabs.clone())));
        }
        if self.active.as_deref() != Some(target_id) {
            return actions;
        }

        // The active tab went away with its session.
        self.session = None;
        if let Some(first) = self.tabs.first() {
            let id = first.target_id.clone();
            self.active = Some(id.clone());
            actions.push(Action::Emit(ControllerEvent::ActiveTab(Some(id.clone()))));
            actions.extend(self.set_state(ControllerState::Connecting));
            actions.push(self.attach_request(&id));
        } else {
            self.active = None;
            actions.push(Action::Emit(ControllerEvent::ActiveTab(None)));
        }
        actions
    }

    fn on_target_changed(&mut self, info: TargetInfo) -> Vec<Action> {
        if info.target_type != "page" {
            return Vec::new();
        }
        let Some(tab) = self.tabs.iter_mut().find(|t| t.target_id == info.target_id) else {
            return Vec::new();
        };
        tab.title = info.title;
        tab.url = info.url;
        vec![Action::Emit(ControllerEvent::Tabs(self.tabs.clone()))]
    }

    fn attach_request(&mut self, target_id: &str) -> Action {
        self.request(
            "Target.attachToTarget",
            json!({"targetId": target_id, "flatten": true}),
            None,
        )
    }

    fn request(
        &mut self,
        method: &str,
        params: serde_json::Value,
        session_id: Option<String>,
    ) -> Action {
        self.next_id += 1;
        Action::Send(CdpRequest {
            id: self.next_id,
            method: method.to_string(),
            params: Some(params),
            session_id,
        })
    }

    fn set_state(&mut self, next: ControllerState) -> Vec<Action> {
        if self.state == next {
            return Vec::new();
        }
        self.state = next;
        vec![Action::Emit(ControllerEvent::State(self.state.clone()))]
    }

    fn clear_connection(&mut self) -> Vec<Action> {
        self.session = None;
        self.next_id = 0;
        self.stats.reset();

        let mut actions = Vec::new();
        if !self.tabs.is_empty() {
            self.tabs.clear();
            actions.push(Action::Emit(ControllerEvent::Tabs(Vec::new())));
        }
        if self.active.take().is_some() {
            actions.push(Action::Emit(ControllerEvent::ActiveTab(None)));
        }
        actions
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
