pub mod control_socket;
pub mod rest_api;
