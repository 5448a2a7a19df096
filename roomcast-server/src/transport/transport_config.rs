use std::time::Duration;

/// Websocket keepalive and cross-origin settings. The relay itself never
/// reads these; they shape the connection layer only.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ping_interval: Duration,
    /// Extra grace after a missed ping before the connection is dropped.
    pub ping_timeout: Duration,
    /// Allowed browser origins. Empty or `*` allows any origin.
    pub allowed_origins: Vec<String>,
}

impl TransportConfig {
    /// Longest silence tolerated from a client before it is considered dead.
    pub fn idle_limit(&self) -> Duration {
        self.ping_interval + self.ping_timeout
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(5),
            ping_timeout: Duration::from_secs(5),
            allowed_origins: vec!["*".to_owned()],
        }
    }
}
