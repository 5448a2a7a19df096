use async_trait::async_trait;
use roomcast_core::{ConnectionId, ServerEvent};

/// Implemented by the connection layer so the relay can deliver events to
/// clients. Fan-out to a room is the relay calling [`RelayOutput::send`] once
/// per member, in membership order.
#[async_trait]
pub trait RelayOutput: Send + Sync {
    /// Deliver one event to one connection. Delivery is best-effort: a
    /// connection that is already gone is skipped.
    async fn send(&self, conn_id: ConnectionId, event: ServerEvent);
}
