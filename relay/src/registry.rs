//! Room subscription registry: handler bookkeeping and event fan-out.

use std::collections::HashMap;

use events::{Room, ServerEvent};
use tokio::sync::mpsc;

/// Identifier for one registered subscription.
pub(crate) type SubscriberId = u64;

/// Tracks which rooms have live subscribers and fans inbound events out to
/// them.
///
/// Purely local bookkeeping: the connection actor owns the wire-level
/// subscribe/unsubscribe traffic that the 0→1 and 1→0 handler transitions
/// reported here imply.
#[derive(Default)]
pub(crate) struct RoomRegistry {
    rooms: HashMap<Room, HashMap<SubscriberId, mpsc::UnboundedSender<ServerEvent>>>,
}

impl RoomRegistry {
    /// Register a subscriber under `room`. Returns `true` when this is the
    /// room's first handler (the transition that needs a wire subscribe).
    pub(crate) fn insert(
        &mut self,
        room: Room,
        id: SubscriberId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> bool {
        let handlers = self.rooms.entry(room).or_default();
        let first = handlers.is_empty();
        handlers.insert(id, sender);
        first
    }

    /// Remove a subscriber. Returns `true` when the room's handler set
    /// became empty (the transition that needs a wire unsubscribe).
    pub(crate) fn remove(&mut self, room: Room, id: SubscriberId) -> bool {
        let Some(handlers) = self.rooms.get_mut(&room) else {
            return false;
        };
        if handlers.remove(&id).is_none() {
            return false;
        }
        if handlers.is_empty() {
            self.rooms.remove(&room);
            return true;
        }
        false
    }

    /// Whether `room` has at least one handler.
    pub(crate) fn has_handlers(&self, room: Room) -> bool {
        self.rooms
            .get(&room)
            .is_some_and(|handlers| !handlers.is_empty())
    }

    /// Rooms with at least one handler, in wire order. Used to replay
    /// subscriptions after a reconnect.
    pub(crate) fn active_rooms(&self) -> Vec<Room> {
        Room::ALL
            .into_iter()
            .filter(|room| self.has_handlers(*room))
            .collect()
    }

    /// Deliver an event to every handler registered for `room`. Handlers
    /// for other rooms are never invoked. Returns the delivered count.
    pub(crate) fn dispatch(&self, room: Room, event: &ServerEvent) -> usize {
        let Some(handlers) = self.rooms.get(&room) else {
            return 0;
        };
        handlers
            .values()
            .filter(|sender| sender.send(event.clone()).is_ok())
            .count()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
