// REST request and response bodies
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortsResponse {
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub port: String,
    pub baud: u32,
}

/// `{status: ...}` body returned by connect/disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Error body of a rejected request. FastAPI sends a string for explicit
/// `HTTPException`s and a list of validation problems otherwise.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorDetail {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null => None,
            Value::String(_) => None,
            other => Some(other.to_string()),
        }
    }
}

/// Outcome of `POST /api/connect` once a response came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectReply {
    Accepted { status: String },
    Rejected { code: u16, detail: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordAction {
    /// The camera only exposes a toggle.
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    pub action: RecordAction,
}

/// One-shot device commands triggered by a single button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAction {
    Center,
    Stop,
    Photo,
    Record,
}

impl DeviceAction {
    pub const ALL: [DeviceAction; 4] = [
        DeviceAction::Center,
        DeviceAction::Stop,
        DeviceAction::Photo,
        DeviceAction::Record,
    ];

    pub fn path(self) -> &'static str {
        match self {
            DeviceAction::Center => "api/gimbal/center",
            DeviceAction::Stop => "api/gimbal/stop",
            DeviceAction::Photo => "api/camera/photo",
            DeviceAction::Record => "api/camera/record",
        }
    }

    /// JSON body sent with the request, if the endpoint takes one.
    pub fn body(self) -> Option<RecordRequest> {
        match self {
            DeviceAction::Record => Some(RecordRequest {
                action: RecordAction::Toggle,
            }),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeviceAction::Center => "Center",
            DeviceAction::Stop => "Stop",
            DeviceAction::Photo => "Photo",
            DeviceAction::Record => "Record",
        }
    }
}

impl std::fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_detail_variants() {
        let d: ErrorDetail = serde_json::from_value(json!({"detail": "busy"})).unwrap();
        assert_eq!(d.message().as_deref(), Some("busy"));

        let d: ErrorDetail = serde_json::from_value(json!({})).unwrap();
        assert_eq!(d.message(), None);

        let d: ErrorDetail = serde_json::from_value(json!({"detail": [{"msg": "field required"}]})).unwrap();
        assert!(d.message().unwrap().contains("field required"));
    }

    #[test]
    fn only_record_carries_a_body() {
        let body = serde_json::to_value(DeviceAction::Record.body().unwrap()).unwrap();
        assert_eq!(body, json!({"action": "toggle"}));
        for action in [DeviceAction::Center, DeviceAction::Stop, DeviceAction::Photo] {
            assert!(action.body().is_none());
        }
    }
}
