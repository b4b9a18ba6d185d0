use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use gimbal_panel::client::config::ClientConfig;
use gimbal_panel::client::input::HoldControl;
use gimbal_panel::client::services::control_socket::{ControlSocket, SocketEvent};
use gimbal_panel::client::services::rest_api::RestClient;
use gimbal_panel::client::utils::clock::format_ack_time;
use gimbal_panel::common::models::{ConnectReply, ConnectRequest, DeviceAction};
use gimbal_panel::common::protocol::InboundFrame;
use gimbal_panel::utils::logger::PanelLogger;

#[derive(Parser, Debug)]
#[command(name = "gimbal-cli", about = "Headless client for the gimbal control backend")]
struct Cli {
    /// Backend base URL, overrides PANEL_BACKEND_URL
    #[arg(long)]
    backend: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports known to the backend
    Ports,
    /// Connect the backend to a serial port
    Connect {
        port: String,
        #[arg(long)]
        baud: Option<u32>,
    },
    /// Close the backend's serial connection
    Disconnect,
    Center,
    Stop,
    Photo,
    Record,
    /// Hold a direction for a while, then stop
    Move {
        direction: Direction,
        #[arg(long, default_value_t = 50)]
        speed: u8,
        #[arg(long, default_value_t = 500)]
        hold_ms: u64,
    },
    /// Zoom in or out for a while, then stop
    Zoom {
        direction: ZoomDirection,
        #[arg(long, default_value_t = 500)]
        hold_ms: u64,
    },
    /// Print state frames until the channel closes
    Watch,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ZoomDirection {
    In,
    Out,
}

impl From<Direction> for HoldControl {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => HoldControl::Up,
            Direction::Down => HoldControl::Down,
            Direction::Left => HoldControl::Left,
            Direction::Right => HoldControl::Right,
        }
    }
}

impl From<ZoomDirection> for HoldControl {
    fn from(d: ZoomDirection) -> Self {
        match d {
            ZoomDirection::In => HoldControl::ZoomIn,
            ZoomDirection::Out => HoldControl::ZoomOut,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = ClientConfig::from_lookup(|key| match (key, &cli.backend) {
        ("PANEL_BACKEND_URL", Some(backend)) => Some(backend.clone()),
        _ => std::env::var(key).ok(),
    })?;
    PanelLogger::init(&config.log_level)?;

    let rest = RestClient::new(&config)?;
    match cli.command {
        Command::Ports => {
            let ports = rest.list_ports().await?;
            if ports.is_empty() {
                println!("No serial ports reported");
            }
            for port in ports {
                println!("{}", port);
            }
        }
        Command::Connect { port, baud } => {
            let request = ConnectRequest {
                port,
                baud: baud.unwrap_or(config.default_baud),
            };
            match rest.connect(&request).await? {
                ConnectReply::Accepted { status } => println!("Connect req: {}", status),
                ConnectReply::Rejected { detail, .. } => {
                    anyhow::bail!("Error: {}", detail.unwrap_or_else(|| "Connection failed".to_string()))
                }
            }
        }
        Command::Disconnect => println!("Disconnect req: {}", rest.disconnect().await?),
        Command::Center => rest.trigger(DeviceAction::Center).await?,
        Command::Stop => rest.trigger(DeviceAction::Stop).await?,
        Command::Photo => rest.trigger(DeviceAction::Photo).await?,
        Command::Record => rest.trigger(DeviceAction::Record).await?,
        Command::Move { direction, speed, hold_ms } => {
            hold(&config, direction.into(), speed.min(100), Duration::from_millis(hold_ms)).await?
        }
        Command::Zoom { direction, hold_ms } => {
            hold(&config, direction.into(), 0, Duration::from_millis(hold_ms)).await?
        }
        Command::Watch => watch(&config).await?,
    }
    Ok(())
}

/// Sends the engage frame, waits, sends the release frame and lets the writer drain.
async fn hold(config: &ClientConfig, control: HoldControl, speed: u8, duration: Duration) -> anyhow::Result<()> {
    let mut socket = ControlSocket::new(config.control_socket_url()?);
    socket.open_attached().await?;

    socket.send(control.engage_frame(speed))?;
    tokio::time::sleep(duration).await;
    socket.send(control.release_frame())?;
    socket.detach();

    let events = socket.events();
    let drained = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(event) = ControlSocket::next_event(events.clone()).await {
            if matches!(event, SocketEvent::Closed(_)) {
                break;
            }
        }
    })
    .await;
    if drained.is_err() {
        log::warn!("Control channel did not close cleanly");
    }
    Ok(())
}

async fn watch(config: &ClientConfig) -> anyhow::Result<()> {
    let mut socket = ControlSocket::new(config.control_socket_url()?);
    socket.open_attached().await?;
    println!("Watching {} (Ctrl-C to quit)", socket.url());

    let events = socket.events();
    let mut last_connected = None;
    loop {
        let event = tokio::select! {
            event = ControlSocket::next_event(events.clone()) => event,
            _ = tokio::signal::ctrl_c() => break,
        };
        match event {
            Some(SocketEvent::Frame(InboundFrame::State(state))) => {
                if last_connected != Some(state.connected) {
                    last_connected = Some(state.connected);
                    println!("Driver {}", if state.connected { "Connected" } else { "Disconnected" });
                }
                println!(
                    "last ack {:>8}  errors {}",
                    format_ack_time(state.last_ack()),
                    state.errors
                );
            }
            Some(SocketEvent::Rejected(e)) => eprintln!("{}", e),
            Some(SocketEvent::Opened(_)) => {}
            Some(SocketEvent::Closed(reason)) => {
                println!("Channel closed{}", reason.map(|r| format!(": {}", r)).unwrap_or_default());
                break;
            }
            None => break,
        }
    }
    Ok(())
}
