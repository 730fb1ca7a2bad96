//! Public handle over the connection actor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use events::{ClientMessage, Room, ServerEvent};
use tokio::sync::{mpsc, watch};

use crate::config::RelayConfig;
use crate::connection::{Command, Connection, ConnectionStatus};

/// Handle to the relay connection actor.
///
/// Cheap to clone. The actor exits when [`RelayClient::shutdown`] is called
/// or every handle and subscription has been dropped.
#[derive(Clone)]
pub struct RelayClient {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
    next_id: Arc<AtomicU64>,
}

impl RelayClient {
    /// Spawn the connection actor.
    ///
    /// The actor opens at most one transport at a time, and only once a
    /// token is configured and at least one subscription exists.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn connect(config: RelayConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Idle);

        tokio::spawn(Connection::new(config, commands_rx, status_tx).run());

        Self {
            commands: commands_tx,
            status: status_rx,
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a handler for `room`.
    ///
    /// The room's first handler puts one `subscribe:<room>` on the wire
    /// (deferred until connected when necessary); dropping the returned
    /// subscription unregisters it again.
    #[must_use]
    pub fn subscribe(&self, room: Room) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, events) = mpsc::unbounded_channel();
        let _ = self.commands.send(Command::Subscribe { room, id, sender });

        Subscription {
            room,
            id,
            events,
            commands: self.commands.clone(),
        }
    }

    /// Fire-and-forget send. While disconnected the message is dropped
    /// with a warning; it never errors back to the caller.
    pub fn send(&self, message: ClientMessage) {
        let _ = self.commands.send(Command::Send(message));
    }

    /// Install or clear the session token. A new token re-arms a failed
    /// connection; clearing it closes any open transport (logout).
    pub fn set_token(&self, token: Option<String>) {
        let _ = self.commands.send(Command::SetToken(token));
    }

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Watch channel over status transitions.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Close the transport and stop the actor.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// A live room subscription; unsubscribes on drop.
pub struct Subscription {
    room: Room,
    id: u64,
    events: mpsc::UnboundedReceiver<ServerEvent>,
    commands: mpsc::UnboundedSender<Command>,
}

impl Subscription {
    /// The room this subscription listens on.
    #[must_use]
    pub fn room(&self) -> Room {
        self.room
    }

    /// Receive the next event routed to this room.
    ///
    /// Returns `None` once the connection actor has stopped.
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }

    /// Explicitly unregister; equivalent to dropping the subscription.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Unsubscribe {
            room: self.room,
            id: self.id,
        });
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
