// Frames exchanged over the `/ws/control` WebSocket
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of the device link pushed by the backend in every `state` frame.
///
/// Only `connected`, `last_ack_ts` and `errors` are guaranteed; the attitude and
/// camera fields are filled in by backends that track them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub connected: bool,
    #[serde(default)]
    pub last_ack_ts: Option<f64>,
    #[serde(default)]
    pub errors: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_state: Option<String>,
}

impl ConnectionState {
    /// Last acknowledgement time, treating the backend's `0` placeholder as absent.
    pub fn last_ack(&self) -> Option<f64> {
        self.last_ack_ts.filter(|ts| *ts > 0.0)
    }
}

/// Server -> client frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundFrame {
    State(ConnectionState),
}

/// Why an inbound text frame could not be turned into an [`InboundFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    Malformed(String),
    UnknownType(String),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Malformed(msg) => write!(f, "Malformed frame: {}", msg),
            FrameError::UnknownType(tag) => write!(f, "Unrecognized message type: {}", tag),
        }
    }
}

impl std::error::Error for FrameError {}

/// Parses a text frame, telling unknown tags apart from broken JSON.
pub fn parse_inbound(text: &str) -> Result<InboundFrame, FrameError> {
    let generic: Value =
        serde_json::from_str(text).map_err(|e| FrameError::Malformed(e.to_string()))?;

    let message_type = generic
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| FrameError::Malformed("missing type field".to_string()))?;

    match message_type {
        "state" => {
            let payload = generic
                .get("payload")
                .cloned()
                .ok_or_else(|| FrameError::Malformed("state frame without payload".to_string()))?;
            let state: ConnectionState = serde_json::from_value(payload)
                .map_err(|e| FrameError::Malformed(format!("bad state payload: {}", e)))?;
            Ok(InboundFrame::State(state))
        }
        other => Err(FrameError::UnknownType(other.to_string())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomAction {
    In,
    Out,
    Stop,
}

impl std::fmt::Display for ZoomAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ZoomAction::In => "in",
            ZoomAction::Out => "out",
            ZoomAction::Stop => "stop",
        };
        write!(f, "{}", s)
    }
}

/// Client -> server command frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// Rate command; `yaw` and `pitch` are -1, 0 or 1 and `speed` is a percentage.
    GimbalRate { yaw: i8, pitch: i8, speed: u8 },
    Zoom { action: ZoomAction },
}

impl OutboundFrame {
    pub fn halt() -> Self {
        OutboundFrame::GimbalRate {
            yaw: 0,
            pitch: 0,
            speed: 0,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
