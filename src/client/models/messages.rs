use crate::client::input::HoldControl;
use crate::client::models::app_state::RecoveryMode;
use crate::client::services::control_socket::SocketEvent;
use crate::client::services::rest_api::RestOutcome;
use crate::common::error::PanelError;
use crate::common::models::DeviceAction;

#[derive(Debug, Clone)]
pub enum Message {
    // Connection form
    PortChanged(String),
    PortPicked(String),
    BaudSelected(u32),
    ConnectPressed,
    DisconnectPressed,
    // Gimbal and camera controls
    SpeedChanged(u8),
    HoldPressed(HoldControl),
    HoldReleased(HoldControl),
    ReleaseAll,
    ActionPressed(DeviceAction),
    ClearLog,
    // Network completions
    SocketLinked(Result<(), PanelError>),
    SocketEvent(Option<SocketEvent>),
    /// Tagged with the session generation that issued the request.
    RestCompleted(u64, RestOutcome),
    RecoveryDue(RecoveryMode),
}
