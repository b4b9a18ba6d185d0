use thiserror::Error;

/// Errors surfaced by the panel's network services and configuration.
///
/// Variants carry rendered strings rather than the underlying error values so
/// the type stays `Clone` and can travel inside GUI messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    #[error("{0}")]
    Transport(String),
    #[error("HTTP {code}: {detail}")]
    Status { code: u16, detail: String },
    #[error("Invalid payload: {0}")]
    Decode(String),
    #[error("{0}")]
    Validation(String),
    #[error("Control channel not connected")]
    NotConnected,
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type PanelResult<T> = Result<T, PanelError>;

impl From<reqwest::Error> for PanelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return PanelError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => PanelError::Status {
                code: status.as_u16(),
                detail: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            },
            None => PanelError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(err: serde_json::Error) -> Self {
        PanelError::Decode(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for PanelError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        PanelError::Transport(err.to_string())
    }
}

impl From<url::ParseError> for PanelError {
    fn from(err: url::ParseError) -> Self {
        PanelError::Config(err.to_string())
    }
}
