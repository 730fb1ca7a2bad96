//! Runtime configuration for the relay client, loaded from builders or
//! environment variables.

use std::time::Duration;

const DEFAULT_URL: &str = "ws://127.0.0.1:4000/ws";
const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
const DEFAULT_RECONNECT_BASE_MS: u64 = 1000;
const DEFAULT_HEARTBEAT_MS: u64 = 30_000;

/// Connection settings and reconnect/heartbeat policy for
/// [`RelayClient`](crate::RelayClient).
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// WebSocket URL of the relay endpoint (e.g. `"ws://host:4000/ws"`).
    pub url: String,
    /// Session bearer token. Without one the client stays idle.
    pub token: Option<String>,
    /// Reconnect attempts before the connection is declared failed.
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential reconnect backoff.
    pub reconnect_base: Duration,
    /// Interval between heartbeat pings while connected.
    pub heartbeat_interval: Duration,
}

impl RelayConfig {
    /// Config for `url` with the default policy (5 attempts, 1 s backoff
    /// base, 30 s heartbeat) and no token.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            token: None,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_base: Duration::from_millis(DEFAULT_RECONNECT_BASE_MS),
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_MS),
        }
    }

    /// Load config from environment with sane defaults: `RELAY_URL`,
    /// `RELAY_TOKEN`, `RELAY_MAX_RECONNECT_ATTEMPTS`,
    /// `RELAY_RECONNECT_BASE_MS`, `RELAY_HEARTBEAT_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        let url = std::env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_URL.to_owned());
        let token = std::env::var("RELAY_TOKEN").ok().filter(|s| !s.is_empty());

        Self {
            url,
            token,
            max_reconnect_attempts: env_u32(
                "RELAY_MAX_RECONNECT_ATTEMPTS",
                DEFAULT_MAX_RECONNECT_ATTEMPTS,
            ),
            reconnect_base: Duration::from_millis(env_u64(
                "RELAY_RECONNECT_BASE_MS",
                DEFAULT_RECONNECT_BASE_MS,
            )),
            heartbeat_interval: Duration::from_millis(env_u64(
                "RELAY_HEARTBEAT_MS",
                DEFAULT_HEARTBEAT_MS,
            )),
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_reconnect_base(mut self, base: Duration) -> Self {
        self.reconnect_base = base;
        self
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
