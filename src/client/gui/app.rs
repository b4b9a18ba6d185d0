use iced::{event, mouse, touch, Application, Command, Element, Event, Subscription, Theme};
use log::{debug, info};
use url::Url;

use crate::client::config::ClientConfig;
use crate::client::models::app_state::{ControlSession, Effect, RecoveryMode};
use crate::client::models::messages::Message;
use crate::client::services::control_socket::{ControlSocket, SocketEvent};
use crate::client::services::rest_api::RestClient;

/// Everything the window needs, resolved before iced starts.
pub struct PanelFlags {
    pub config: ClientConfig,
    pub rest: RestClient,
    pub socket_url: Url,
}

pub struct GimbalPanelApp {
    pub session: ControlSession,
    rest: RestClient,
    socket_url: Url,
    socket: ControlSocket,
}

impl GimbalPanelApp {
    fn run_effects(&mut self, effects: Vec<Effect>) -> Command<Message> {
        let mut commands = Vec::new();
        for effect in effects {
            match effect {
                Effect::OpenSocket => {
                    commands.push(Command::perform(self.socket.open(), Message::SocketLinked));
                }
                // Pushed synchronously so frames leave in gesture order.
                Effect::Send(frame) => {
                    if let Err(e) = self.socket.send(frame) {
                        self.session.on_send_failed(e);
                    }
                }
                Effect::Rest(call) => {
                    let rest = self.rest.clone();
                    let generation = self.session.generation();
                    commands.push(Command::perform(
                        async move { rest.execute(call).await },
                        move |outcome| Message::RestCompleted(generation, outcome),
                    ));
                }
                Effect::Reconnect { after, mode } => {
                    info!("[APP] Recovery ({:?}) scheduled in {:?}", mode, after);
                    commands.push(Command::perform(
                        async move {
                            tokio::time::sleep(after).await;
                            mode
                        },
                        Message::RecoveryDue,
                    ));
                }
            }
        }
        Command::batch(commands)
    }

    fn poll_socket(&self) -> Command<Message> {
        Command::perform(
            ControlSocket::next_event(self.socket.events()),
            Message::SocketEvent,
        )
    }

    /// Starts over with a fresh session and socket, like reopening the panel.
    fn reload(&mut self) -> Command<Message> {
        info!("[APP] Reloading control session");
        self.socket.detach();
        self.socket = ControlSocket::new(self.socket_url.clone());
        let startup = self.session.reload();
        Command::batch([self.run_effects(startup), self.poll_socket()])
    }
}

impl Application for GimbalPanelApp {
    type Message = Message;
    type Theme = Theme;
    type Executor = iced::executor::Default;
    type Flags = PanelFlags;

    fn new(flags: PanelFlags) -> (Self, Command<Message>) {
        let socket = ControlSocket::new(flags.socket_url.clone());
        let mut app = GimbalPanelApp {
            session: ControlSession::new(&flags.config),
            rest: flags.rest,
            socket_url: flags.socket_url,
            socket,
        };
        let startup = app.session.startup();
        let cmd = Command::batch([app.run_effects(startup), app.poll_socket()]);
        (app, cmd)
    }

    fn title(&self) -> String {
        "Gimbal Control Panel".to_string()
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        let effects = match message {
            Message::PortChanged(port) | Message::PortPicked(port) => {
                self.session.set_port(port);
                Vec::new()
            }
            Message::BaudSelected(baud) => {
                self.session.set_baud(baud);
                Vec::new()
            }
            Message::SpeedChanged(speed) => {
                self.session.set_speed(speed);
                Vec::new()
            }
            Message::ConnectPressed => self.session.connect(),
            Message::DisconnectPressed => self.session.disconnect(),
            Message::HoldPressed(control) => self.session.press(control),
            Message::HoldReleased(control) => self.session.release(control),
            Message::ReleaseAll => self.session.release_all(),
            Message::ActionPressed(action) => self.session.trigger(action),
            Message::ClearLog => {
                self.session.log.clear();
                Vec::new()
            }
            Message::SocketLinked(Ok(())) => Vec::new(),
            Message::SocketLinked(Err(e)) => {
                self.socket.detach();
                self.session.on_socket_failed(e)
            }
            Message::SocketEvent(Some(event)) => {
                match &event {
                    SocketEvent::Opened(link) => self.socket.attach(link.clone()),
                    SocketEvent::Closed(_) => self.socket.detach(),
                    _ => {}
                }
                let effects = self.session.on_socket_event(event);
                return Command::batch([self.run_effects(effects), self.poll_socket()]);
            }
            Message::SocketEvent(None) => {
                debug!("[APP] Event queue of a replaced socket drained");
                Vec::new()
            }
            Message::RestCompleted(generation, outcome) => {
                self.session.on_rest_completed(generation, outcome);
                Vec::new()
            }
            Message::RecoveryDue(RecoveryMode::Reload) => return self.reload(),
            Message::RecoveryDue(RecoveryMode::Retry { attempt }) => {
                info!("[APP] Reconnect attempt {}", attempt);
                self.session.on_retry_due()
            }
        };
        self.run_effects(effects)
    }

    fn view(&self) -> Element<Message> {
        crate::client::gui::views::control_panel::view(&self.session)
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(release_events)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Pointer and touch events that end every hold, wherever they happen.
fn release_events(event: Event, _status: event::Status) -> Option<Message> {
    match event {
        Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
        | Event::Mouse(mouse::Event::CursorLeft)
        | Event::Touch(touch::Event::FingerLifted { .. })
        | Event::Touch(touch::Event::FingerLost { .. }) => Some(Message::ReleaseAll),
        _ => None,
    }
}
