// Press-and-hold controls: one frame when a control engages, one when it lets go
use crate::common::protocol::{OutboundFrame, ZoomAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoldControl {
    Up,
    Down,
    Left,
    Right,
    ZoomIn,
    ZoomOut,
}

impl HoldControl {
    pub const ALL: [HoldControl; 6] = [
        HoldControl::Up,
        HoldControl::Down,
        HoldControl::Left,
        HoldControl::Right,
        HoldControl::ZoomIn,
        HoldControl::ZoomOut,
    ];

    /// `(yaw, pitch)` unit vector for directional controls.
    pub fn direction(self) -> Option<(i8, i8)> {
        match self {
            HoldControl::Up => Some((0, 1)),
            HoldControl::Down => Some((0, -1)),
            HoldControl::Left => Some((-1, 0)),
            HoldControl::Right => Some((1, 0)),
            HoldControl::ZoomIn | HoldControl::ZoomOut => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HoldControl::Up => "▲",
            HoldControl::Down => "▼",
            HoldControl::Left => "◀",
            HoldControl::Right => "▶",
            HoldControl::ZoomIn => "Zoom +",
            HoldControl::ZoomOut => "Zoom -",
        }
    }

    pub fn engage_frame(self, speed: u8) -> OutboundFrame {
        match self {
            HoldControl::ZoomIn => OutboundFrame::Zoom { action: ZoomAction::In },
            HoldControl::ZoomOut => OutboundFrame::Zoom { action: ZoomAction::Out },
            _ => {
                let (yaw, pitch) = self.direction().unwrap_or((0, 0));
                OutboundFrame::GimbalRate { yaw, pitch, speed }
            }
        }
    }

    pub fn release_frame(self) -> OutboundFrame {
        match self {
            HoldControl::ZoomIn | HoldControl::ZoomOut => OutboundFrame::Zoom {
                action: ZoomAction::Stop,
            },
            _ => OutboundFrame::halt(),
        }
    }

    fn index(self) -> usize {
        match self {
            HoldControl::Up => 0,
            HoldControl::Down => 1,
            HoldControl::Left => 2,
            HoldControl::Right => 3,
            HoldControl::ZoomIn => 4,
            HoldControl::ZoomOut => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldState {
    #[default]
    Idle,
    Active,
}

/// Tracks the Idle/Active state of every hold control.
#[derive(Debug, Clone, Default)]
pub struct InputController {
    states: [HoldState; 6],
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, control: HoldControl) -> HoldState {
        self.states[control.index()]
    }

    pub fn is_active(&self, control: HoldControl) -> bool {
        self.state(control) == HoldState::Active
    }

    /// Idle -> Active. Returns the frame to send, or `None` if already held.
    pub fn press(&mut self, control: HoldControl, speed: u8) -> Option<OutboundFrame> {
        let slot = &mut self.states[control.index()];
        if *slot == HoldState::Active {
            return None;
        }
        *slot = HoldState::Active;
        Some(control.engage_frame(speed))
    }

    /// Active -> Idle. Returns the stop frame, or `None` if the control was idle.
    pub fn release(&mut self, control: HoldControl) -> Option<OutboundFrame> {
        let slot = &mut self.states[control.index()];
        if *slot == HoldState::Idle {
            return None;
        }
        *slot = HoldState::Idle;
        Some(control.release_frame())
    }

    pub fn release_all(&mut self) -> Vec<OutboundFrame> {
        HoldControl::ALL
            .iter()
            .filter_map(|control| self.release(*control))
            .collect()
    }

    /// Forgets every hold without producing frames, used once the channel is gone.
    pub fn reset(&mut self) {
        self.states = [HoldState::Idle; 6];
    }
}
