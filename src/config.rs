/// Network configuration for Gemini API endpoints.
use std::time::Duration;

/// Supported Gemini environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Production,
    Sandbox,
}

/// Configuration holding REST and WebSocket base URLs for an environment.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub api_base: String,
    pub ws_base: String,
}

impl NetworkConfig {
    pub fn from_network(network: Network) -> Self {
        match network {
            Network::Production => Self {
                api_base: "https://api.gemini.com".into(),
                ws_base: "wss://api.gemini.com".into(),
            },
            Network::Sandbox => Self {
                api_base: "https://api.sandbox.gemini.com".into(),
                ws_base: "wss://api.sandbox.gemini.com".into(),
            },
        }
    }

    /// Point both bases at arbitrary hosts (local mocks, proxies).
    pub fn custom(api_base: impl Into<String>, ws_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ws_base: ws_base.into(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::from_network(Network::Sandbox)
    }
}

/// Configuration for WebSocket reconnection and heartbeat behavior.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Base delay between reconnect attempts (default: 1s).
    pub base_delay: Duration,
    /// Maximum delay between reconnect attempts (default: 60s).
    pub max_delay: Duration,
    /// Maximum number of reconnect attempts (default: 10, 0 = infinite).
    pub max_attempts: usize,
    /// Interval between ping frames (default: 30s).
    pub ping_interval: Duration,
    /// Timeout for pong response before triggering reconnect (default: 60s).
    pub pong_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_attempts: 10,
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(60),
        }
    }
}
