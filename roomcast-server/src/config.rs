use crate::error::RelayError;
use crate::transport::TransportConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime configuration of a relay server.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to listen on.
    pub listen: SocketAddr,
    /// Directory holding one `log-<room>.txt` file per room.
    pub log_dir: PathBuf,
    /// Pending log writes allowed before enqueuers wait for the writer.
    pub log_queue_capacity: usize,
    /// Pending client events allowed before sessions wait for the relay.
    pub relay_queue_capacity: usize,
    pub transport: TransportConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_dir: PathBuf::from("."),
            log_queue_capacity: 1024,
            relay_queue_capacity: 1024,
            transport: TransportConfig::default(),
        }
    }
}

impl RelayConfig {
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] for zero capacities or keepalive durations.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.log_queue_capacity == 0 {
            return Err(RelayError::InvalidConfig(
                "log queue capacity must be greater than zero".to_string(),
            ));
        }
        if self.relay_queue_capacity == 0 {
            return Err(RelayError::InvalidConfig(
                "relay queue capacity must be greater than zero".to_string(),
            ));
        }
        if self.transport.ping_interval.is_zero() {
            return Err(RelayError::InvalidConfig(
                "ping interval must be greater than zero".to_string(),
            ));
        }
        if self.transport.ping_timeout.is_zero() {
            return Err(RelayError::InvalidConfig(
                "ping timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
