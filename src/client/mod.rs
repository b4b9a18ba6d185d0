pub mod config;
pub mod gui;
pub mod input;
pub mod models;
pub mod services;
pub mod utils;
