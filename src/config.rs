//! Configuration for the AniDB UDP client
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Main configuration for a client instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint Configuration
    // -------------------------------------------------------------------------
    /// Remote API host
    pub server_host: String,

    /// Remote API port
    pub server_port: u16,

    /// Local UDP port to bind. The API expects a stable client port;
    /// 0 lets the OS pick one.
    pub local_port: u16,

    // -------------------------------------------------------------------------
    // Client Identity
    // -------------------------------------------------------------------------
    /// Registered client name sent with AUTH
    pub client_name: String,

    /// Registered client version sent with AUTH
    pub client_version: String,

    /// API protocol version sent with AUTH
    pub protocol_version: String,

    // -------------------------------------------------------------------------
    // Timing Configuration
    // -------------------------------------------------------------------------
    /// Minimum gap between two datagrams (the API allows one per 2 seconds)
    pub send_interval: Duration,

    /// Outbound silence after which a keep-alive PING is sent
    pub keepalive_idle: Duration,

    /// How long a caller waits for a reply before it is timed out
    pub response_timeout: Duration,

    /// Consecutive timeouts that make the engine assume it is rate-limited
    pub throttle_threshold: u32,

    /// Writer sleep between checks while throttled
    pub throttle_backoff: Duration,

    /// Upper bound on how long the throttle stays set when nothing arrives
    pub throttle_hold: Duration,

    /// Socket read timeout; bounds how quickly the reader notices shutdown
    pub poll_interval: Duration,

    // -------------------------------------------------------------------------
    // Transport Limits
    // -------------------------------------------------------------------------
    /// Largest datagram accepted from the server (bytes)
    pub max_datagram_size: usize,

    /// Capacity of the side-channel event queue
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "api.anidb.net".to_string(),
            server_port: 9000,
            local_port: 9000,
            client_name: "anidbudp".to_string(),
            client_version: "1".to_string(),
            protocol_version: "3".to_string(),
            send_interval: Duration::from_millis(2100),
            keepalive_idle: Duration::from_secs(5 * 60),
            response_timeout: Duration::from_secs(20),
            throttle_threshold: 5,
            throttle_backoff: Duration::from_secs(2),
            throttle_hold: Duration::from_secs(30 * 60),
            poll_interval: Duration::from_millis(100),
            max_datagram_size: 1400,
            event_capacity: 256,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the remote host
    pub fn server_host(mut self, host: impl Into<String>) -> Self {
        self.config.server_host = host.into();
        self
    }

    /// Set the remote port
    pub fn server_port(mut self, port: u16) -> Self {
        self.config.server_port = port;
        self
    }

    /// Set the local port to bind (0 = OS-assigned)
    pub fn local_port(mut self, port: u16) -> Self {
        self.config.local_port = port;
        self
    }

    /// Set the client name and version reported on AUTH
    pub fn client(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self.config.client_version = version.into();
        self
    }

    /// Set the minimum interval between sends
    pub fn send_interval(mut self, interval: Duration) -> Self {
        self.config.send_interval = interval;
        self
    }

    /// Set the idle time before a keep-alive ping
    pub fn keepalive_idle(mut self, idle: Duration) -> Self {
        self.config.keepalive_idle = idle;
        self
    }

    /// Set the per-request reply ceiling
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    /// Set the consecutive-timeout count that triggers throttling
    pub fn throttle_threshold(mut self, count: u32) -> Self {
        self.config.throttle_threshold = count;
        self
    }

    /// Set the writer's sleep while throttled
    pub fn throttle_backoff(mut self, backoff: Duration) -> Self {
        self.config.throttle_backoff = backoff;
        self
    }

    /// Set the maximum time the throttle stays engaged
    pub fn throttle_hold(mut self, hold: Duration) -> Self {
        self.config.throttle_hold = hold;
        self
    }

    /// Set the socket poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the largest accepted datagram
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.config.max_datagram_size = size;
        self
    }

    /// Set the event queue capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
