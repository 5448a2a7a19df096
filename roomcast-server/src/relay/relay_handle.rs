use crate::error::RelayError;
use crate::eventlog::EventLog;
use crate::relay::relay::Relay;
use crate::relay::relay_command::RelayCommand;
use crate::transport::RelayOutput;
use roomcast_core::{ClientFrame, ConnectionId};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    pub connections: usize,
    pub rooms: usize,
    pub memberships: usize,
}

/// Cloneable sender side of the relay actor.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    /// Creates a handle and the receiver the relay will drain. Useful when
    /// the output needs the handle before the relay can be built.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RelayCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Starts a relay on the current runtime and returns its handle.
    pub fn spawn(output: Arc<dyn RelayOutput>, log: EventLog, capacity: usize) -> Self {
        let (handle, rx) = Self::channel(capacity);
        Self::start(rx, output, log);
        handle
    }

    pub fn start(rx: mpsc::Receiver<RelayCommand>, output: Arc<dyn RelayOutput>, log: EventLog) {
        info!("Starting relay");
        tokio::spawn(Relay::new(rx, output, log).run());
    }

    pub async fn send(&self, cmd: RelayCommand) -> Result<(), RelayError> {
        self.tx.send(cmd).await.map_err(|_| RelayError::Closed)
    }

    pub async fn connect(&self, conn_id: ConnectionId, addr: String) -> Result<(), RelayError> {
        self.send(RelayCommand::Connect { conn_id, addr }).await
    }

    /// Forwards a client event; a bare [`roomcast_core::ClientEvent`] is
    /// logged as its own serialization.
    pub async fn dispatch(
        &self,
        conn_id: ConnectionId,
        frame: impl Into<ClientFrame>,
    ) -> Result<(), RelayError> {
        self.send(RelayCommand::from_client(conn_id, frame.into()))
            .await
    }

    pub async fn disconnecting(&self, conn_id: ConnectionId, reason: String) -> Result<(), RelayError> {
        self.send(RelayCommand::Disconnecting { conn_id, reason })
            .await
    }

    pub async fn disconnect(&self, conn_id: ConnectionId) -> Result<(), RelayError> {
        self.send(RelayCommand::Disconnect { conn_id }).await
    }

    pub async fn error(&self, conn_id: ConnectionId, error: Value) -> Result<(), RelayError> {
        self.send(RelayCommand::Error { conn_id, error }).await
    }

    /// Counts as of every command queued before this call.
    pub async fn stats(&self) -> Result<RelayStats, RelayError> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Stats { reply }).await?;
        rx.await.map_err(|_| RelayError::Closed)
    }
}
