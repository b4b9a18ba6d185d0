pub mod app_state;
pub mod event_log;
pub mod messages;
