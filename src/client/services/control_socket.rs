use std::future::Future;
use std::sync::Arc;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::common::error::{PanelError, PanelResult};
use crate::common::protocol::{parse_inbound, FrameError, InboundFrame, OutboundFrame};

type ControlStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Something that happened on the control channel.
///
/// `Opened` is queued before the reader starts, so it always precedes the
/// frames and the `Closed` of the same connection.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Opened(SocketLink),
    Frame(InboundFrame),
    Rejected(FrameError),
    Closed(Option<String>),
}

/// Writer half of an open channel, delivered in [`SocketEvent::Opened`].
#[derive(Debug, Clone)]
pub struct SocketLink {
    outgoing: mpsc::UnboundedSender<OutboundFrame>,
}

impl PartialEq for SocketLink {
    fn eq(&self, other: &Self) -> bool {
        self.outgoing.same_channel(&other.outgoing)
    }
}

/// Owner of the single `/ws/control` connection.
///
/// Incoming frames are pumped by a background task into an event channel that
/// the front end drains with [`ControlSocket::next_event`]. Outgoing frames are
/// queued synchronously with [`ControlSocket::send`] so they leave in call order.
#[derive(Debug)]
pub struct ControlSocket {
    url: Url,
    events_tx: mpsc::UnboundedSender<SocketEvent>,
    events_rx: Arc<Mutex<mpsc::UnboundedReceiver<SocketEvent>>>,
    outgoing: Option<mpsc::UnboundedSender<OutboundFrame>>,
}

impl ControlSocket {
    pub fn new(url: Url) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            url,
            events_tx,
            events_rx: Arc::new(Mutex::new(events_rx)),
            outgoing: None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Connects and spawns the reader/writer tasks. The writer is handed over
    /// through the event queue; the returned future only reports whether the
    /// handshake worked. It owns everything it needs so it can run on any executor.
    pub fn open(&self) -> impl Future<Output = PanelResult<()>> + Send + 'static {
        let url = self.url.clone();
        let events = self.events_tx.clone();
        async move { Self::establish(url, events).await }
    }

    async fn establish(
        url: Url,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) -> PanelResult<()> {
        info!("[WS:CLIENT] Connecting to {}", url);
        let (ws_stream, _) = connect_async(url.as_str()).await.map_err(|e| {
            warn!("[WS:CLIENT] Connection failed: {}", e);
            PanelError::Transport(format!("Failed to connect to {}: {}", url, e))
        })?;
        info!("[WS:CLIENT] Connected to {}", url);

        let (mut ws_sender, ws_receiver) = ws_stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<OutboundFrame>();

        let link = SocketLink {
            outgoing: outgoing_tx,
        };
        if events.send(SocketEvent::Opened(link)).is_err() {
            debug!("[WS:CLIENT] Event receiver dropped before the channel opened");
            return Ok(());
        }
        tokio::spawn(Self::handle_incoming(ws_receiver, events));

        tokio::spawn(async move {
            while let Some(frame) = outgoing_rx.recv().await {
                let json = match frame.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("[WS:CLIENT] Failed to serialize outgoing frame: {}", e);
                        continue;
                    }
                };
                debug!("[WS:CLIENT] Sending {}", json);
                if let Err(e) = ws_sender.send(Message::Text(json)).await {
                    warn!("[WS:CLIENT] Failed to send frame: {}", e);
                    break;
                }
            }
            let _ = ws_sender.close().await;
            debug!("[WS:CLIENT] Outgoing frame handler ended");
        });

        Ok(())
    }

    async fn handle_incoming(
        mut ws_receiver: SplitStream<ControlStream>,
        events: mpsc::UnboundedSender<SocketEvent>,
    ) {
        let reason = loop {
            match ws_receiver.next().await {
                Some(Ok(Message::Text(text))) => {
                    let event = match parse_inbound(&text) {
                        Ok(frame) => SocketEvent::Frame(frame),
                        Err(e) => {
                            debug!("[WS:CLIENT] Rejected frame: {} - Raw: {}", e, text);
                            SocketEvent::Rejected(e)
                        }
                    };
                    if events.send(event).is_err() {
                        debug!("[WS:CLIENT] Event receiver dropped");
                        return;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("[WS:CLIENT] Connection closed by server");
                    break frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty());
                }
                // Binary, ping and pong frames carry nothing for the panel.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("[WS:CLIENT] WebSocket error: {}", e);
                    break Some(e.to_string());
                }
                None => break None,
            }
        };
        let _ = events.send(SocketEvent::Closed(reason));
    }

    /// Opens the channel and attaches its writer straight away, for callers
    /// that drive the socket themselves instead of through the event queue.
    pub async fn open_attached(&mut self) -> PanelResult<()> {
        self.open().await?;
        match Self::next_event(self.events()).await {
            Some(SocketEvent::Opened(link)) => {
                self.attach(link);
                Ok(())
            }
            other => Err(PanelError::Transport(format!(
                "control channel did not open cleanly: {:?}",
                other
            ))),
        }
    }

    pub fn attach(&mut self, link: SocketLink) {
        self.outgoing = Some(link.outgoing);
    }

    /// Drops the writer; its task flushes what is queued and closes the sink.
    pub fn detach(&mut self) {
        self.outgoing = None;
    }

    pub fn is_attached(&self) -> bool {
        self.outgoing.is_some()
    }

    pub fn send(&self, frame: OutboundFrame) -> PanelResult<()> {
        let sender = self.outgoing.as_ref().ok_or(PanelError::NotConnected)?;
        sender.send(frame).map_err(|_| PanelError::NotConnected)
    }

    /// Shared handle on the event queue for [`ControlSocket::next_event`].
    pub fn events(&self) -> Arc<Mutex<mpsc::UnboundedReceiver<SocketEvent>>> {
        self.events_rx.clone()
    }

    pub async fn next_event(
        events: Arc<Mutex<mpsc::UnboundedReceiver<SocketEvent>>>,
    ) -> Option<SocketEvent> {
        events.lock().await.recv().await
    }
}
