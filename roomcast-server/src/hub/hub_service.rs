use crate::relay::RelayHandle;
use crate::transport::RelayOutput;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use roomcast_core::{ConnectionId, ServerEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

struct HubInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<Message>>,
}

/// Live websocket connections, addressed by [`ConnectionId`].
#[derive(Clone)]
pub struct HubService {
    inner: Arc<HubInner>,
    relay: RelayHandle,
}

impl HubService {
    pub fn new(relay: RelayHandle) -> Self {
        Self {
            inner: Arc::new(HubInner {
                connections: DashMap::new(),
            }),
            relay,
        }
    }

    pub fn relay(&self) -> &RelayHandle {
        &self.relay
    }

    pub fn add_connection(&self, conn_id: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.connections.insert(conn_id, tx);
    }

    pub fn remove_connection(&self, conn_id: &ConnectionId) {
        self.inner.connections.remove(conn_id);
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn send_event(&self, conn_id: ConnectionId, event: &ServerEvent) {
        let Some(conn) = self.inner.connections.get(&conn_id) else {
            debug!("Dropping event for closed connection {}", conn_id);
            return;
        };

        match serde_json::to_string(event) {
            Ok(json) => {
                if let Err(e) = conn.send(Message::Text(json.into())) {
                    error!("Failed to send WS message to {}: {:?}", conn_id, e);
                }
            }
            Err(e) => error!("Failed to serialize server event: {}", e),
        }
    }
}

#[async_trait]
impl RelayOutput for HubService {
    async fn send(&self, conn_id: ConnectionId, event: ServerEvent) {
        self.send_event(conn_id, &event);
    }
}
