use std::time::Duration;

use crate::client::config::{ClientConfig, ReconnectPolicy};
use crate::client::input::{HoldControl, InputController};
use crate::client::models::event_log::EventLog;
use crate::client::services::control_socket::SocketEvent;
use crate::client::services::rest_api::{RestCall, RestOutcome};
use crate::client::utils::clock::format_ack_time;
use crate::common::error::{PanelError, PanelResult};
use crate::common::models::{ConnectReply, ConnectRequest, DeviceAction};
use crate::common::protocol::{ConnectionState, FrameError, InboundFrame, OutboundFrame};

/// Work the session asks its front end to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenSocket,
    Send(OutboundFrame),
    Rest(RestCall),
    Reconnect { after: Duration, mode: RecoveryMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// Discard the session and run startup again.
    Reload,
    /// Reopen the socket, keeping the session.
    Retry { attempt: u32 },
}

/// Classification of the device indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkIndicator {
    Online,
    Offline,
}

impl LinkIndicator {
    pub fn label(self) -> &'static str {
        match self {
            LinkIndicator::Online => "Connected",
            LinkIndicator::Offline => "Disconnected",
        }
    }
}

/// Values edited directly by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSettings {
    pub selected_port: String,
    pub baud_rate: u32,
    pub speed_percent: u8,
}

/// All client state for one run of the panel, from startup until the next reload.
#[derive(Debug, Clone)]
pub struct ControlSession {
    reconnect: ReconnectPolicy,
    pub settings: UiSettings,
    pub port_options: Vec<String>,
    pub log: EventLog,
    connection: ConnectionState,
    displayed_connected: bool,
    input: InputController,
    socket_open: bool,
    reconnect_attempts: u32,
    reconnect_pending: bool,
    defaults: UiSettings,
    generation: u64,
}

impl ControlSession {
    pub fn new(config: &ClientConfig) -> Self {
        let defaults = UiSettings {
            selected_port: String::new(),
            baud_rate: config.default_baud,
            speed_percent: config.default_speed,
        };
        Self::fresh(config.reconnect, defaults, 0)
    }

    fn fresh(reconnect: ReconnectPolicy, defaults: UiSettings, generation: u64) -> Self {
        Self {
            reconnect,
            settings: defaults.clone(),
            port_options: Vec::new(),
            log: EventLog::new(),
            connection: ConnectionState::default(),
            displayed_connected: false,
            input: InputController::new(),
            socket_open: false,
            reconnect_attempts: 0,
            reconnect_pending: false,
            defaults,
            generation,
        }
    }

    /// Opens the control channel and asks for the port list.
    pub fn startup(&mut self) -> Vec<Effect> {
        vec![Effect::OpenSocket, Effect::Rest(RestCall::ListPorts)]
    }

    /// Starts over as if the panel had just been opened: settings, ports, log and
    /// link state go back to their defaults and startup runs again.
    pub fn reload(&mut self) -> Vec<Effect> {
        *self = Self::fresh(self.reconnect, self.defaults.clone(), self.generation + 1);
        self.startup()
    }

    /// Bumped by every [`ControlSession::reload`]. REST completions are tagged with
    /// it so replies to requests made before a reload can be told apart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ---------- connection monitor ----------

    pub fn on_socket_opened(&mut self) {
        self.socket_open = true;
        self.reconnect_attempts = 0;
        self.reconnect_pending = false;
        self.log.success("WebSocket Connected");
    }

    /// Handles a failed connection attempt the same way as a dropped channel.
    pub fn on_socket_failed(&mut self, err: PanelError) -> Vec<Effect> {
        log::warn!("[SESSION] control channel unavailable: {}", err);
        self.on_socket_closed(Some(err.to_string()))
    }

    pub fn on_socket_event(&mut self, event: SocketEvent) -> Vec<Effect> {
        match event {
            SocketEvent::Opened(_) => {
                self.on_socket_opened();
                Vec::new()
            }
            SocketEvent::Frame(frame) => {
                self.on_frame(frame);
                Vec::new()
            }
            SocketEvent::Rejected(err) => {
                self.on_frame_rejected(err);
                Vec::new()
            }
            SocketEvent::Closed(reason) => self.on_socket_closed(reason),
        }
    }

    pub fn on_frame(&mut self, frame: InboundFrame) {
        match frame {
            InboundFrame::State(state) => {
                if state.connected != self.displayed_connected {
                    self.displayed_connected = state.connected;
                    if state.connected {
                        self.log.success("Driver Connected");
                    } else {
                        self.log.warning("Driver Disconnected");
                    }
                }
                self.connection = state;
            }
        }
    }

    pub fn on_frame_rejected(&mut self, err: FrameError) {
        self.log.warning(err.to_string());
    }

    pub fn on_socket_closed(&mut self, reason: Option<String>) -> Vec<Effect> {
        self.socket_open = false;
        self.input.reset();
        if let Some(reason) = reason {
            log::info!("[SESSION] control channel closed: {}", reason);
        }
        if self.reconnect_pending {
            return Vec::new();
        }
        self.log.warning("WebSocket Disconnected. Reconnecting...");

        match self.reconnect {
            ReconnectPolicy::Reload { delay } => {
                self.reconnect_pending = true;
                vec![Effect::Reconnect {
                    after: delay,
                    mode: RecoveryMode::Reload,
                }]
            }
            ReconnectPolicy::Backoff {
                base,
                max_delay,
                max_attempts,
            } => {
                if self.reconnect_attempts >= max_attempts {
                    self.log.error(format!(
                        "Giving up after {} reconnect attempts",
                        self.reconnect_attempts
                    ));
                    return Vec::new();
                }
                let attempt = self.reconnect_attempts;
                self.reconnect_attempts += 1;
                self.reconnect_pending = true;
                vec![Effect::Reconnect {
                    after: ReconnectPolicy::backoff_delay(base, max_delay, attempt),
                    mode: RecoveryMode::Retry {
                        attempt: attempt + 1,
                    },
                }]
            }
        }
    }

    /// A `Retry` timer fired; try the socket again.
    pub fn on_retry_due(&mut self) -> Vec<Effect> {
        self.reconnect_pending = false;
        vec![Effect::OpenSocket]
    }

    pub fn on_send_failed(&mut self, err: PanelError) {
        self.log.error(format!("Send failed: {}", err));
    }

    // ---------- port selector ----------

    pub fn on_ports_loaded(&mut self, result: PanelResult<Vec<String>>) {
        match result {
            Ok(ports) => {
                self.port_options = ports;
                if let Some(first) = self.port_options.first() {
                    self.settings.selected_port = first.clone();
                }
            }
            Err(e) => self.log.error(format!("Failed to load ports: {}", e)),
        }
    }

    // ---------- input controller ----------

    pub fn set_port(&mut self, port: String) {
        self.settings.selected_port = port;
    }

    pub fn set_baud(&mut self, baud: u32) {
        self.settings.baud_rate = baud;
    }

    pub fn set_speed(&mut self, speed: u8) {
        self.settings.speed_percent = speed;
    }

    pub fn press(&mut self, control: HoldControl) -> Vec<Effect> {
        let speed = self.settings.speed_percent;
        match self.input.press(control, speed) {
            Some(frame) => {
                match control.direction() {
                    Some((yaw, pitch)) => self.log.info(format!("UI: Move {}, {} @ {}%", yaw, pitch, speed)),
                    None => {
                        if let OutboundFrame::Zoom { action } = &frame {
                            self.log.info(format!("UI: Zoom {}", action));
                        }
                    }
                }
                vec![Effect::Send(frame)]
            }
            None => Vec::new(),
        }
    }

    pub fn release(&mut self, control: HoldControl) -> Vec<Effect> {
        self.input.release(control).map(Effect::Send).into_iter().collect()
    }

    pub fn release_all(&mut self) -> Vec<Effect> {
        self.input.release_all().into_iter().map(Effect::Send).collect()
    }

    pub fn is_held(&self, control: HoldControl) -> bool {
        self.input.is_active(control)
    }

    pub fn connect(&mut self) -> Vec<Effect> {
        if self.settings.selected_port.is_empty() {
            self.log.error("Error: Please select or enter a serial port.");
            return Vec::new();
        }
        vec![Effect::Rest(RestCall::Connect(ConnectRequest {
            port: self.settings.selected_port.clone(),
            baud: self.settings.baud_rate,
        }))]
    }

    pub fn disconnect(&mut self) -> Vec<Effect> {
        vec![Effect::Rest(RestCall::Disconnect)]
    }

    pub fn trigger(&mut self, action: DeviceAction) -> Vec<Effect> {
        vec![Effect::Rest(RestCall::Action(action))]
    }

    /// Applies a REST completion unless it belongs to a session that was reloaded since.
    pub fn on_rest_completed(&mut self, generation: u64, outcome: RestOutcome) {
        if generation != self.generation {
            log::debug!("[SESSION] dropping stale REST outcome {:?}", outcome);
            return;
        }
        self.on_rest_outcome(outcome);
    }

    pub fn on_rest_outcome(&mut self, outcome: RestOutcome) {
        match outcome {
            RestOutcome::Ports(result) => self.on_ports_loaded(result),
            RestOutcome::Connect(Ok(ConnectReply::Accepted { status })) => {
                self.log.success(format!("Connect req: {}", status));
            }
            RestOutcome::Connect(Ok(ConnectReply::Rejected { detail, .. })) => {
                let detail = detail.unwrap_or_else(|| "Connection failed".to_string());
                self.log.error(format!("Error: {}", detail));
            }
            RestOutcome::Connect(Err(e)) => self.log.error(format!("Error: {}", e)),
            RestOutcome::Disconnect(Ok(status)) => {
                self.log.info(format!("Disconnect req: {}", status));
            }
            RestOutcome::Disconnect(Err(e)) => self.log.error(format!("Error: {}", e)),
            RestOutcome::Action(_, Ok(())) => {}
            RestOutcome::Action(action, Err(e)) => {
                self.log.warning(format!("{} request failed: {}", action, e));
            }
        }
    }

    // ---------- display ----------

    pub fn indicator(&self) -> LinkIndicator {
        if self.displayed_connected {
            LinkIndicator::Online
        } else {
            LinkIndicator::Offline
        }
    }

    pub fn last_ack_label(&self) -> String {
        format_ack_time(self.connection.last_ack())
    }

    pub fn error_count(&self) -> u64 {
        self.connection.errors
    }

    /// Most recent state snapshot received from the backend.
    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn is_socket_open(&self) -> bool {
        self.socket_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::event_log::LogLevel;
    use crate::common::protocol::ZoomAction;

    fn session() -> ControlSession {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        ControlSession::new(&config)
    }

    fn backoff_session(max_attempts: u32) -> ControlSession {
        let config = ClientConfig::from_lookup(|key| match key {
            "PANEL_RECONNECT_POLICY" => Some("backoff".to_string()),
            "PANEL_RECONNECT_DELAY_MS" => Some("1000".to_string()),
            "PANEL_RECONNECT_MAX_DELAY_MS" => Some("3000".to_string()),
            "PANEL_RECONNECT_MAX_ATTEMPTS" => Some(max_attempts.to_string()),
            _ => None,
        })
        .unwrap();
        ControlSession::new(&config)
    }

    fn state(connected: bool, last_ack_ts: Option<f64>, errors: u64) -> InboundFrame {
        InboundFrame::State(ConnectionState {
            connected,
            last_ack_ts,
            errors,
            ..Default::default()
        })
    }

    fn messages(session: &ControlSession) -> Vec<String> {
        session.log.iter().map(|e| e.message.clone()).collect()
    }

    #[test]
    fn startup_opens_socket_and_lists_ports() {
        let mut s = session();
        assert_eq!(s.startup(), vec![Effect::OpenSocket, Effect::Rest(RestCall::ListPorts)]);
        assert!(s.log.is_empty());
        assert_eq!(s.settings.speed_percent, 50);
        assert_eq!(s.settings.baud_rate, 115_200);
    }

    #[test]
    fn indicator_changes_only_on_transition() {
        let mut s = session();
        s.on_frame(state(false, None, 0));
        assert!(s.log.is_empty());
        assert_eq!(s.indicator(), LinkIndicator::Offline);

        s.on_frame(state(true, Some(1_700_000_000.0), 1));
        s.on_frame(state(true, Some(1_700_000_001.0), 2));
        assert_eq!(messages(&s), vec!["Driver Connected"]);
        assert_eq!(s.indicator(), LinkIndicator::Online);
        assert_eq!(s.indicator().label(), "Connected");
        assert_eq!(s.error_count(), 2);

        s.on_frame(state(false, None, 7));
        assert_eq!(messages(&s), vec!["Driver Disconnected", "Driver Connected"]);
        assert_eq!(s.indicator(), LinkIndicator::Offline);
        assert_eq!(s.error_count(), 7);
    }

    #[test]
    fn last_ack_refreshes_every_frame() {
        let mut s = session();
        assert_eq!(s.last_ack_label(), "Never");
        s.on_frame(state(false, Some(1_700_000_000.0), 0));
        assert_eq!(s.last_ack_label(), format_ack_time(Some(1_700_000_000.0)));
        s.on_frame(state(false, None, 0));
        assert_eq!(s.last_ack_label(), "Never");
        assert!(s.log.is_empty());
    }

    #[test]
    fn unknown_frames_are_logged() {
        let mut s = session();
        s.on_socket_event(SocketEvent::Rejected(FrameError::UnknownType("telemetry".into())));
        assert_eq!(messages(&s), vec!["Unrecognized message type: telemetry"]);
        assert_eq!(s.log.latest().unwrap().level, LogLevel::Warning);
    }

    #[test]
    fn directional_press_and_release_send_two_frames() {
        let mut s = session();
        s.set_speed(65);
        let mut effects = s.press(HoldControl::Up);
        effects.extend(s.release(HoldControl::Up));
        assert_eq!(
            effects,
            vec![
                Effect::Send(OutboundFrame::GimbalRate { yaw: 0, pitch: 1, speed: 65 }),
                Effect::Send(OutboundFrame::GimbalRate { yaw: 0, pitch: 0, speed: 0 }),
            ]
        );
        assert_eq!(messages(&s), vec!["UI: Move 0, 1 @ 65%"]);
    }

    #[test]
    fn zoom_hold_and_global_release() {
        let mut s = session();
        assert_eq!(
            s.press(HoldControl::ZoomIn),
            vec![Effect::Send(OutboundFrame::Zoom { action: ZoomAction::In })]
        );
        assert!(s.is_held(HoldControl::ZoomIn));
        assert_eq!(
            s.release_all(),
            vec![Effect::Send(OutboundFrame::Zoom { action: ZoomAction::Stop })]
        );
        assert!(s.release(HoldControl::ZoomIn).is_empty());
        assert_eq!(messages(&s), vec!["UI: Zoom in"]);
    }

    #[test]
    fn connect_without_port_is_rejected_locally() {
        let mut s = session();
        assert!(s.connect().is_empty());
        assert_eq!(s.log.len(), 1);
        assert_eq!(messages(&s), vec!["Error: Please select or enter a serial port."]);
    }

    #[test]
    fn connect_sends_port_and_baud() {
        let mut s = session();
        s.set_port("/dev/ttyACM0".to_string());
        s.set_baud(57_600);
        assert_eq!(
            s.connect(),
            vec![Effect::Rest(RestCall::Connect(ConnectRequest {
                port: "/dev/ttyACM0".to_string(),
                baud: 57_600,
            }))]
        );
        assert!(s.log.is_empty());
    }

    #[test]
    fn connect_replies_are_logged() {
        let mut s = session();
        s.on_rest_outcome(RestOutcome::Connect(Ok(ConnectReply::Accepted { status: "ok".into() })));
        assert_eq!(s.log.latest().unwrap().message, "Connect req: ok");

        s.on_rest_outcome(RestOutcome::Connect(Ok(ConnectReply::Rejected {
            code: 400,
            detail: Some("busy".into()),
        })));
        assert_eq!(s.log.latest().unwrap().message, "Error: busy");

        s.on_rest_outcome(RestOutcome::Connect(Ok(ConnectReply::Rejected { code: 500, detail: None })));
        assert_eq!(s.log.latest().unwrap().message, "Error: Connection failed");
    }

    #[test]
    fn ports_prefill_first_entry() {
        let mut s = session();
        s.on_ports_loaded(Ok(vec!["/dev/ttyUSB0".into(), "/dev/ttyUSB1".into()]));
        assert_eq!(s.port_options.len(), 2);
        assert_eq!(s.settings.selected_port, "/dev/ttyUSB0");
    }

    #[test]
    fn empty_or_failed_port_list_leaves_field_alone() {
        let mut s = session();
        s.set_port("COM3".to_string());
        s.on_ports_loaded(Ok(Vec::new()));
        assert!(s.port_options.is_empty());
        assert_eq!(s.settings.selected_port, "COM3");

        s.on_ports_loaded(Err(PanelError::Transport("connection refused".into())));
        assert_eq!(s.settings.selected_port, "COM3");
        assert_eq!(messages(&s), vec!["Failed to load ports: connection refused"]);
    }

    #[test]
    fn action_failures_surface_but_success_is_silent() {
        let mut s = session();
        assert_eq!(s.trigger(DeviceAction::Photo), vec![Effect::Rest(RestCall::Action(DeviceAction::Photo))]);
        s.on_rest_outcome(RestOutcome::Action(DeviceAction::Photo, Ok(())));
        assert!(s.log.is_empty());
        s.on_rest_outcome(RestOutcome::Action(
            DeviceAction::Center,
            Err(PanelError::Status { code: 500, detail: "Failed to send command".into() }),
        ));
        assert_eq!(messages(&s), vec!["Center request failed: HTTP 500: Failed to send command"]);
    }

    #[test]
    fn close_schedules_single_reload() {
        let mut s = session();
        s.on_socket_opened();
        s.press(HoldControl::Left);
        let effects = s.on_socket_closed(None);
        assert_eq!(
            effects,
            vec![Effect::Reconnect { after: Duration::from_secs(3), mode: RecoveryMode::Reload }]
        );
        assert!(!s.is_socket_open());
        assert!(!s.is_held(HoldControl::Left));
        assert_eq!(s.log.latest().unwrap().message, "WebSocket Disconnected. Reconnecting...");
        assert!(s.on_socket_closed(Some("again".into())).is_empty());
    }

    #[test]
    fn backoff_retries_then_gives_up() {
        let mut s = backoff_session(2);
        assert_eq!(
            s.on_socket_failed(PanelError::Transport("refused".into())),
            vec![Effect::Reconnect { after: Duration::from_secs(1), mode: RecoveryMode::Retry { attempt: 1 } }]
        );
        assert_eq!(s.on_retry_due(), vec![Effect::OpenSocket]);
        assert_eq!(
            s.on_socket_failed(PanelError::Transport("refused".into())),
            vec![Effect::Reconnect { after: Duration::from_secs(2), mode: RecoveryMode::Retry { attempt: 2 } }]
        );
        s.on_retry_due();
        assert!(s.on_socket_failed(PanelError::Transport("refused".into())).is_empty());
        assert_eq!(s.log.latest().unwrap().message, "Giving up after 2 reconnect attempts");
    }

    #[test]
    fn successful_open_resets_backoff() {
        let mut s = backoff_session(3);
        s.on_socket_closed(None);
        s.on_retry_due();
        s.on_socket_opened();
        assert!(s.is_socket_open());
        assert_eq!(
            s.on_socket_closed(None),
            vec![Effect::Reconnect { after: Duration::from_secs(1), mode: RecoveryMode::Retry { attempt: 1 } }]
        );
    }

    #[test]
    fn connect_sends_port_exactly_as_entered() {
        let mut s = session();
        s.set_port(" /dev/ttyUSB0 ".to_string());
        assert_eq!(
            s.connect(),
            vec![Effect::Rest(RestCall::Connect(ConnectRequest {
                port: " /dev/ttyUSB0 ".to_string(),
                baud: 115_200,
            }))]
        );

        s.set_port("  ".to_string());
        assert_eq!(s.connect().len(), 1);
        assert!(s.log.is_empty());
    }

    #[test]
    fn leaving_a_held_button_stops_it_once() {
        let mut s = session();
        s.set_speed(40);
        assert_eq!(
            s.press(HoldControl::Down),
            vec![Effect::Send(OutboundFrame::GimbalRate { yaw: 0, pitch: -1, speed: 40 })]
        );
        // pointer dragged off the button, then released elsewhere
        assert_eq!(s.release(HoldControl::Down), vec![Effect::Send(OutboundFrame::halt())]);
        assert!(s.release(HoldControl::Down).is_empty());
        assert!(s.release_all().is_empty());
        assert!(!s.is_held(HoldControl::Down));
    }

    #[test]
    fn reload_restores_defaults_and_reruns_startup() {
        let mut s = session();
        s.on_socket_opened();
        s.on_ports_loaded(Ok(vec!["/dev/ttyUSB0".into()]));
        s.set_speed(90);
        s.on_frame(state(true, Some(1_700_000_000.0), 4));
        s.press(HoldControl::Up);
        assert_eq!(
            s.on_socket_closed(None),
            vec![Effect::Reconnect { after: Duration::from_secs(3), mode: RecoveryMode::Reload }]
        );
        let before = s.generation();

        assert_eq!(s.reload(), vec![Effect::OpenSocket, Effect::Rest(RestCall::ListPorts)]);
        assert_eq!(s.generation(), before + 1);
        assert!(s.log.is_empty());
        assert!(s.port_options.is_empty());
        assert_eq!(s.settings.selected_port, "");
        assert_eq!(s.settings.speed_percent, 50);
        assert_eq!(s.indicator(), LinkIndicator::Offline);
        assert_eq!(s.last_ack_label(), "Never");
        assert_eq!(s.error_count(), 0);
        assert!(!s.is_socket_open());
        assert!(!s.is_held(HoldControl::Up));

        // the next close schedules a fresh reload rather than being swallowed
        assert_eq!(s.on_socket_closed(None).len(), 1);
    }

    #[test]
    fn outcomes_from_before_a_reload_are_dropped() {
        let mut s = session();
        let stale = s.generation();
        s.reload();
        s.on_rest_completed(stale, RestOutcome::Ports(Ok(vec!["/dev/ttyUSB9".into()])));
        s.on_rest_completed(stale, RestOutcome::Connect(Ok(ConnectReply::Accepted { status: "ok".into() })));
        assert!(s.port_options.is_empty());
        assert!(s.log.is_empty());

        s.on_rest_completed(s.generation(), RestOutcome::Ports(Ok(vec!["/dev/ttyUSB1".into()])));
        assert_eq!(s.settings.selected_port, "/dev/ttyUSB1");
    }
}
