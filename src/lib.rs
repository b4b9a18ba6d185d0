//! Desktop control panel for a remote gimbal/camera backend.
//!
//! The backend is reached through a handful of REST endpoints and one
//! WebSocket control channel (`/ws/control`). Everything that happens on the
//! panel funnels through [`client::models::app_state::ControlSession`], which
//! turns user gestures and network events into [`client::models::app_state::Effect`]s
//! that the GUI or CLI front ends execute.

pub mod client;
pub mod common;
pub mod utils;
