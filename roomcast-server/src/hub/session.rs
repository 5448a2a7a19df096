use crate::error::RelayError;
use crate::relay::RelayHandle;
use roomcast_core::{ClientFrame, ConnectionId};
use serde_json::{Value, json};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Disconnecting,
    Disconnected,
}

/// Relay-facing side of one connection.
///
/// Client events are forwarded only while `Connected`. [`Session::close`]
/// sends `disconnecting` then `disconnect` exactly once.
pub struct Session {
    conn_id: ConnectionId,
    state: SessionState,
    relay: RelayHandle,
}

impl Session {
    /// Registers the connection with the relay.
    pub async fn open(
        conn_id: ConnectionId,
        addr: String,
        relay: RelayHandle,
    ) -> Result<Self, RelayError> {
        relay.connect(conn_id, addr).await?;
        Ok(Self {
            conn_id,
            state: SessionState::Connected,
            relay,
        })
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub async fn dispatch(&mut self, frame: impl Into<ClientFrame>) -> Result<(), RelayError> {
        let frame = frame.into();
        if self.state != SessionState::Connected {
            debug!("{} is {:?}; ignoring {:?}", self.conn_id, self.state, frame.event);
            return Ok(());
        }

        if frame.event.room().is_some_and(str::is_empty) {
            return self
                .report_error(json!({
                    "message": "invalid room name \"\"",
                    "event": frame.raw,
                }))
                .await;
        }

        self.relay.dispatch(self.conn_id, frame).await
    }

    pub async fn report_error(&self, error: Value) -> Result<(), RelayError> {
        self.relay.error(self.conn_id, error).await
    }

    /// Tears the session down. Calling it again is a no-op.
    pub async fn close(&mut self, reason: &str) -> Result<(), RelayError> {
        if self.state != SessionState::Connected {
            return Ok(());
        }

        self.state = SessionState::Disconnecting;
        self.relay
            .disconnecting(self.conn_id, reason.to_string())
            .await?;
        self.relay.disconnect(self.conn_id).await?;
        self.state = SessionState::Disconnected;
        Ok(())
    }
}
