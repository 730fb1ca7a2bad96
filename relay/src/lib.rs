//! Realtime relay client for the hosting portal.
//!
//! Maintains at most one authenticated WebSocket connection to the relay
//! server, tracks room subscriptions, dispatches typed server events to
//! per-room handlers, and recovers from transport loss with exponential
//! backoff. Client-to-server control traffic is at-most-once: messages
//! sent while disconnected are dropped with a warning, and wire
//! subscriptions are replayed from local state after every reconnect.
//!
//! ERROR HANDLING
//! ==============
//! Transport and parse failures are logged and recovered through the
//! reconnect loop; nothing here panics on wire input, and `send` never
//! errors back to the caller.

mod backoff;
mod client;
mod config;
mod connection;
mod registry;

pub use backoff::Backoff;
pub use client::{RelayClient, Subscription};
pub use config::RelayConfig;
pub use connection::{ConnectionStatus, RelayError};
pub use events::{ClientMessage, ParseError, Room, ServerEvent};
