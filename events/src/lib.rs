//! Shared wire model for the portal realtime relay.
//!
//! This crate owns the JSON wire representation exchanged between portal
//! clients and the relay server: room names, client control messages, and
//! the tagged union of server-pushed events. The envelope is fully typed
//! while entity bodies (notification, server, ticket objects) intentionally
//! stay flexible `serde_json::Value` payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by [`parse_event`].
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The raw text is not valid JSON.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON object carries no string `type` discriminator.
    #[error("missing `type` discriminator")]
    MissingType,
    /// A recognized `type` carried a payload that does not match its shape.
    #[error("malformed payload for `{event_type}`: {source}")]
    Payload {
        event_type: String,
        source: serde_json::Error,
    },
}

/// Error returned when parsing an unrecognized room name.
#[derive(Debug, thiserror::Error)]
#[error("unknown room: {0}")]
pub struct UnknownRoom(pub String);

/// Logical event channel used to route server-pushed events to handlers.
///
/// A room is purely a client-side routing key; the server enforces its own
/// membership for the matching `subscribe:<room>` wire subscriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Room {
    Notifications,
    Servers,
    Tickets,
    Balance,
}

impl Room {
    /// Every routable room, in wire order.
    pub const ALL: [Self; 4] = [
        Self::Notifications,
        Self::Servers,
        Self::Tickets,
        Self::Balance,
    ];

    /// Wire name of this room.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notifications => "notifications",
            Self::Servers => "servers",
            Self::Tickets => "tickets",
            Self::Balance => "balance",
        }
    }

    /// Wire `type` used to subscribe to this room.
    #[must_use]
    pub fn subscribe_type(self) -> String {
        format!("subscribe:{}", self.as_str())
    }

    /// Wire `type` used to unsubscribe from this room.
    #[must_use]
    pub fn unsubscribe_type(self) -> String {
        format!("unsubscribe:{}", self.as_str())
    }

    /// Route a server event `type` string to a room by discriminator prefix.
    ///
    /// Control messages (`auth:*`, `pong`, `error`) and unrouted families
    /// (`check:*`) have no room.
    #[must_use]
    pub fn for_event_type(event_type: &str) -> Option<Self> {
        let (family, _) = event_type.split_once(':')?;
        match family {
            "notification" => Some(Self::Notifications),
            "server" => Some(Self::Servers),
            "ticket" => Some(Self::Tickets),
            "balance" => Some(Self::Balance),
            _ => None,
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Room {
    type Err = UnknownRoom;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notifications" => Ok(Self::Notifications),
            "servers" => Ok(Self::Servers),
            "tickets" => Ok(Self::Tickets),
            "balance" => Ok(Self::Balance),
            other => Err(UnknownRoom(other.to_owned())),
        }
    }
}

/// A client-to-server control message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientMessage {
    /// Authenticate the connection with a bearer token.
    Auth { token: String },
    /// Start receiving events for a room.
    Subscribe(Room),
    /// Stop receiving events for a room.
    Unsubscribe(Room),
    /// Heartbeat request; the server answers with `pong`.
    Ping,
}

impl ClientMessage {
    /// Wire JSON for this message.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Auth { token } => serde_json::json!({ "type": "auth", "token": token }),
            Self::Subscribe(room) => serde_json::json!({ "type": room.subscribe_type() }),
            Self::Unsubscribe(room) => serde_json::json!({ "type": room.unsubscribe_type() }),
            Self::Ping => serde_json::json!({ "type": "ping" }),
        }
    }

    /// Wire text for this message.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_json().to_string()
    }
}

/// A server-pushed event, discriminated by the wire `type` field.
///
/// Payload field names are camelCase on the wire. `type` values the client
/// does not recognize parse into [`ServerEvent::Unknown`] rather than
/// failing, so protocol additions never break older clients.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "auth:success", rename_all = "camelCase")]
    AuthSuccess { user_id: String },
    #[serde(rename = "auth:error")]
    AuthError { message: String },
    #[serde(rename = "notification:new")]
    NotificationNew { notification: Value },
    #[serde(rename = "notification:read", rename_all = "camelCase")]
    NotificationRead { notification_id: String },
    #[serde(rename = "notification:delete", rename_all = "camelCase")]
    NotificationDelete { notification_id: String },
    #[serde(rename = "server:created")]
    ServerCreated { server: Value },
    #[serde(rename = "server:status", rename_all = "camelCase")]
    ServerStatus {
        server_id: String,
        status: String,
        #[serde(default)]
        ip_address: Option<String>,
    },
    #[serde(rename = "server:stats", rename_all = "camelCase")]
    ServerStats { server_id: String, stats: Value },
    #[serde(rename = "server:deleted", rename_all = "camelCase")]
    ServerDeleted { server_id: String },
    #[serde(rename = "ticket:new")]
    TicketNew { ticket: Value },
    #[serde(rename = "ticket:response", rename_all = "camelCase")]
    TicketResponse { ticket_id: String, response: Value },
    #[serde(rename = "ticket:status", rename_all = "camelCase")]
    TicketStatus { ticket_id: String, status: String },
    #[serde(rename = "balance:updated", rename_all = "camelCase")]
    BalanceUpdated { new_balance: f64 },
    #[serde(rename = "check:status", rename_all = "camelCase")]
    CheckStatus { check_id: String, status: String },
    #[serde(rename = "pong")]
    Pong,
    #[serde(rename = "error")]
    Error { message: String },
    /// An event whose `type` this client does not recognize.
    #[serde(skip)]
    Unknown { event_type: String, payload: Value },
}

/// Wire `type` values with a typed variant. Anything else parses as
/// [`ServerEvent::Unknown`].
const KNOWN_TYPES: [&str; 16] = [
    "auth:success",
    "auth:error",
    "notification:new",
    "notification:read",
    "notification:delete",
    "server:created",
    "server:status",
    "server:stats",
    "server:deleted",
    "ticket:new",
    "ticket:response",
    "ticket:status",
    "balance:updated",
    "check:status",
    "pong",
    "error",
];

impl ServerEvent {
    /// The wire `type` discriminator for this event.
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::AuthSuccess { .. } => "auth:success",
            Self::AuthError { .. } => "auth:error",
            Self::NotificationNew { .. } => "notification:new",
            Self::NotificationRead { .. } => "notification:read",
            Self::NotificationDelete { .. } => "notification:delete",
            Self::ServerCreated { .. } => "server:created",
            Self::ServerStatus { .. } => "server:status",
            Self::ServerStats { .. } => "server:stats",
            Self::ServerDeleted { .. } => "server:deleted",
            Self::TicketNew { .. } => "ticket:new",
            Self::TicketResponse { .. } => "ticket:response",
            Self::TicketStatus { .. } => "ticket:status",
            Self::BalanceUpdated { .. } => "balance:updated",
            Self::CheckStatus { .. } => "check:status",
            Self::Pong => "pong",
            Self::Error { .. } => "error",
            Self::Unknown { event_type, .. } => event_type,
        }
    }

    /// The room this event routes to, if any.
    ///
    /// Unknown events route by prefix too, so an unrecognized subtype of a
    /// known family still reaches that room's handlers.
    #[must_use]
    pub fn room(&self) -> Option<Room> {
        Room::for_event_type(self.event_type())
    }
}

/// Parse one inbound wire message.
///
/// # Errors
///
/// Returns [`ParseError::Json`] for malformed text,
/// [`ParseError::MissingType`] when no string `type` field is present, and
/// [`ParseError::Payload`] when a recognized `type` carries a payload that
/// does not match its shape.
pub fn parse_event(text: &str) -> Result<ServerEvent, ParseError> {
    let value = serde_json::from_str::<Value>(text)?;

    let event_type = match value.get("type").and_then(Value::as_str) {
        Some(event_type) => event_type.to_owned(),
        None => return Err(ParseError::MissingType),
    };

    if !KNOWN_TYPES.contains(&event_type.as_str()) {
        return Ok(ServerEvent::Unknown {
            event_type,
            payload: value,
        });
    }

    serde_json::from_value::<ServerEvent>(value)
        .map_err(|source| ParseError::Payload { event_type, source })
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
