//! Connection actor: owns the transport, the subscription registry, and
//! the reconnect policy.
//!
//! DESIGN
//! ======
//! All mutable state lives in one task; handles talk to it over a command
//! channel, so no locks are needed. The actor alternates between a parked
//! phase (no token, no subscribers, or a spent reconnect budget) and a
//! connected phase that selects over inbound frames, commands, and the
//! heartbeat interval. Every transport loss funnels through one
//! backoff-then-retry path; the server's room state is assumed gone after
//! a close, so locally tracked rooms are replayed as fresh subscribes on
//! the next successful open.

use std::collections::HashSet;

use events::{ClientMessage, Room, ServerEvent};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::config::RelayConfig;
use crate::registry::{RoomRegistry, SubscriberId};

/// Transport-level failure inside the actor. Logged and recovered through
/// the reconnect path; never surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The WebSocket connection or handshake failed.
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    /// A message could not be written to the transport.
    #[error("websocket send failed: {0}")]
    Send(Box<tokio_tungstenite::tungstenite::Error>),
}

/// Observable lifecycle state of the relay connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No transport and no reason to open one yet.
    Idle,
    Connecting,
    Connected,
    /// Transport lost; a reconnect is pending.
    Disconnected,
    /// Reconnect budget exhausted; a new token is required to re-arm.
    Failed,
}

/// Requests from [`RelayClient`](crate::RelayClient) handles and
/// subscriptions to the actor.
pub(crate) enum Command {
    Subscribe {
        room: Room,
        id: SubscriberId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    },
    Unsubscribe {
        room: Room,
        id: SubscriberId,
    },
    Send(ClientMessage),
    SetToken(Option<String>),
    Shutdown,
}

type Transport = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<Transport, Message>;
type WsRead = SplitStream<Transport>;

/// Why a connected session ended.
enum CloseReason {
    /// Transport error or server close; retry with backoff.
    Transport,
    /// Token cleared (logout); park without retrying.
    Logout,
    /// Shutdown requested; the actor exits.
    Shutdown,
}

/// One turn of the connected select loop.
enum Tick {
    Inbound(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
    Command(Option<Command>),
    Heartbeat,
}

pub(crate) struct Connection {
    config: RelayConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ConnectionStatus>,
    registry: RoomRegistry,
    /// Rooms the server currently believes are subscribed. Cleared on
    /// every transport loss.
    wire_subscribed: HashSet<Room>,
    backoff: Backoff,
    /// Set on the first subscribe; connecting before anyone listens would
    /// only hold an idle socket open.
    wants_connection: bool,
    /// Reconnect budget spent; only a new token re-arms.
    terminal: bool,
}

impl Connection {
    pub(crate) fn new(
        config: RelayConfig,
        commands: mpsc::UnboundedReceiver<Command>,
        status: watch::Sender<ConnectionStatus>,
    ) -> Self {
        let backoff = Backoff::new(config.reconnect_base, config.max_reconnect_attempts);
        Self {
            config,
            commands,
            status,
            registry: RoomRegistry::default(),
            wire_subscribed: HashSet::new(),
            backoff,
            wants_connection: false,
            terminal: false,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            let token = loop {
                if let Some(token) = self.connect_target() {
                    break token;
                }
                let Some(command) = self.commands.recv().await else {
                    return;
                };
                if !self.handle_parked_command(command) {
                    return;
                }
            };

            if !self.connect_once(token).await {
                return;
            }
        }
    }

    /// The token to connect with, when connecting is currently warranted.
    fn connect_target(&self) -> Option<String> {
        if !self.wants_connection || self.terminal {
            return None;
        }
        self.config.token.clone()
    }

    /// One connect attempt plus, on success, the whole connected session.
    /// Returns `false` when the actor should exit.
    async fn connect_once(&mut self, token: String) -> bool {
        self.set_status(ConnectionStatus::Connecting);
        info!(url = %self.config.url, "relay: connecting");

        let connected = connect_async(&self.config.url)
            .await
            .map_err(|error| RelayError::Connect(Box::new(error)));
        let transport = match connected {
            Ok((transport, _)) => transport,
            Err(error) => {
                warn!(error = %error, "relay: connect failed");
                return self.handle_disconnect().await;
            }
        };
        let (mut sink, mut read) = transport.split();

        if let Err(error) = self.open_session(&mut sink, token).await {
            warn!(error = %error, "relay: session setup failed");
            return self.handle_disconnect().await;
        }

        match self.drive(&mut sink, &mut read).await {
            CloseReason::Transport => self.handle_disconnect().await,
            CloseReason::Logout => {
                let _ = sink.close().await;
                self.wire_subscribed.clear();
                self.set_status(ConnectionStatus::Idle);
                info!("relay: logged out");
                true
            }
            CloseReason::Shutdown => {
                let _ = sink.close().await;
                false
            }
        }
    }

    /// Authenticate, reset the reconnect budget, and replay a subscribe
    /// for every room that has handlers.
    async fn open_session(&mut self, sink: &mut WsSink, token: String) -> Result<(), RelayError> {
        send_message(sink, &ClientMessage::Auth { token }).await?;
        self.backoff.reset();

        for room in self.registry.active_rooms() {
            send_message(sink, &ClientMessage::Subscribe(room)).await?;
            self.wire_subscribed.insert(room);
        }

        self.set_status(ConnectionStatus::Connected);
        info!(rooms = self.wire_subscribed.len(), "relay: connected");
        Ok(())
    }

    /// Connected session loop: inbound frames, commands, heartbeat.
    async fn drive(&mut self, sink: &mut WsSink, read: &mut WsRead) -> CloseReason {
        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval);
        // The first tick completes immediately; consume it so pings start
        // one full interval after connect.
        heartbeat.tick().await;

        loop {
            let tick = tokio::select! {
                message = read.next() => Tick::Inbound(message),
                command = self.commands.recv() => Tick::Command(command),
                _ = heartbeat.tick() => Tick::Heartbeat,
            };

            match tick {
                Tick::Inbound(Some(Ok(Message::Text(text)))) => self.handle_inbound(text.as_str()),
                Tick::Inbound(Some(Ok(Message::Close(_))) | None) => {
                    info!("relay: server closed connection");
                    return CloseReason::Transport;
                }
                Tick::Inbound(Some(Ok(_))) => {}
                Tick::Inbound(Some(Err(error))) => {
                    warn!(error = %error, "relay: transport error");
                    return CloseReason::Transport;
                }
                Tick::Command(None) => return CloseReason::Shutdown,
                Tick::Command(Some(command)) => {
                    if let Some(reason) = self.handle_open_command(command, sink).await {
                        return reason;
                    }
                }
                Tick::Heartbeat => {
                    if let Err(error) = send_message(sink, &ClientMessage::Ping).await {
                        warn!(error = %error, "relay: heartbeat send failed");
                        return CloseReason::Transport;
                    }
                }
            }
        }
    }

    /// Handle a command while the transport is open. Returns a close
    /// reason when the session must end.
    async fn handle_open_command(
        &mut self,
        command: Command,
        sink: &mut WsSink,
    ) -> Option<CloseReason> {
        match command {
            Command::Subscribe { room, id, sender } => {
                let first = self.registry.insert(room, id, sender);
                if first && !self.wire_subscribed.contains(&room) {
                    match send_message(sink, &ClientMessage::Subscribe(room)).await {
                        Ok(()) => {
                            self.wire_subscribed.insert(room);
                        }
                        Err(error) => {
                            warn!(error = %error, %room, "relay: subscribe send failed");
                        }
                    }
                }
                None
            }
            Command::Unsubscribe { room, id } => {
                if self.registry.remove(room, id) && self.wire_subscribed.remove(&room) {
                    if let Err(error) = send_message(sink, &ClientMessage::Unsubscribe(room)).await
                    {
                        warn!(error = %error, %room, "relay: unsubscribe send failed");
                    }
                }
                None
            }
            Command::Send(message) => {
                if let Err(error) = send_message(sink, &message).await {
                    warn!(error = %error, "relay: send failed");
                }
                None
            }
            Command::SetToken(token) => {
                let logged_out = token.is_none();
                self.config.token = token;
                self.terminal = false;
                self.backoff.reset();
                logged_out.then_some(CloseReason::Logout)
            }
            Command::Shutdown => Some(CloseReason::Shutdown),
        }
    }

    /// Handle a command while no transport is open. Returns `false` when
    /// the actor should exit.
    fn handle_parked_command(&mut self, command: Command) -> bool {
        match command {
            Command::Subscribe { room, id, sender } => {
                self.registry.insert(room, id, sender);
                self.wants_connection = true;
                true
            }
            Command::Unsubscribe { room, id } => {
                self.registry.remove(room, id);
                true
            }
            Command::Send(message) => {
                // At-most-once: no queue, no replay after reconnect.
                warn!(message = %message.to_text(), "relay: dropping send while disconnected");
                true
            }
            Command::SetToken(token) => {
                self.terminal = false;
                self.backoff.reset();
                self.config.token = token;
                if self.config.token.is_none() {
                    self.set_status(ConnectionStatus::Idle);
                }
                true
            }
            Command::Shutdown => false,
        }
    }

    /// Transport lost: clear wire state, wait out the next backoff delay
    /// (still servicing commands), or park terminally once the budget is
    /// spent. Returns `false` when the actor should exit.
    async fn handle_disconnect(&mut self) -> bool {
        self.wire_subscribed.clear();
        self.set_status(ConnectionStatus::Disconnected);

        let Some(delay) = self.backoff.next_delay() else {
            warn!(
                attempts = self.backoff.attempts(),
                "relay: reconnect attempts exhausted"
            );
            self.terminal = true;
            self.set_status(ConnectionStatus::Failed);
            return true;
        };

        info!(?delay, attempt = self.backoff.attempts(), "relay: reconnecting after backoff");

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            let command = tokio::select! {
                () = &mut sleep => return true,
                command = self.commands.recv() => command,
            };
            let Some(command) = command else {
                return false;
            };
            if !self.handle_parked_command(command) {
                return false;
            }
        }
    }

    /// Parse one inbound message and route it. Undecodable input is
    /// dropped; control events never reach room handlers.
    fn handle_inbound(&mut self, text: &str) {
        let event = match events::parse_event(text) {
            Ok(event) => event,
            Err(error) => {
                warn!(error = %error, "relay: dropping undecodable message");
                return;
            }
        };

        // Heartbeat replies are frequent and carry nothing; keep them out
        // of the diagnostic stream.
        if event != ServerEvent::Pong {
            debug!(event_type = event.event_type(), "relay: event received");
        }

        match event.room() {
            Some(room) => {
                let delivered = self.registry.dispatch(room, &event);
                if delivered == 0 {
                    debug!(%room, event_type = event.event_type(), "relay: no handlers for event");
                }
            }
            None => self.handle_control(&event),
        }
    }

    fn handle_control(&self, event: &ServerEvent) {
        match event {
            ServerEvent::AuthSuccess { user_id } => info!(%user_id, "relay: authenticated"),
            ServerEvent::AuthError { message } => {
                warn!(%message, "relay: authentication rejected");
            }
            ServerEvent::Error { message } => warn!(%message, "relay: server error"),
            ServerEvent::CheckStatus { check_id, status } => {
                debug!(%check_id, %status, "relay: check status");
            }
            _ => {}
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }
}

async fn send_message(sink: &mut WsSink, message: &ClientMessage) -> Result<(), RelayError> {
    sink.send(Message::Text(message.to_text().into()))
        .await
        .map_err(|error| RelayError::Send(Box::new(error)))
}
