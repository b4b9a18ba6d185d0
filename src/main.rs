use gimbal_panel::client::config::ClientConfig;
use gimbal_panel::client::gui::app::{GimbalPanelApp, PanelFlags};
use gimbal_panel::client::services::rest_api::RestClient;
use gimbal_panel::utils::logger::PanelLogger;
use iced::Application;

fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    PanelLogger::init(&config.log_level)?;
    log::info!("Backend at {}", config.backend_url);

    let flags = PanelFlags {
        rest: RestClient::new(&config)?,
        socket_url: config.control_socket_url()?,
        config,
    };
    GimbalPanelApp::run(iced::Settings::with_flags(flags))?;
    Ok(())
}
