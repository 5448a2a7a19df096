use roomcast_core::{ConnectionId, PeerDescriptor};
use std::collections::HashMap;

/// Last peer descriptor each connection announced.
///
/// Entries live until [`PresenceRegistry::remove`]; nothing expires on its own.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    peers: HashMap<ConnectionId, PeerDescriptor>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `peer` for `conn_id`, replacing any earlier announcement.
    pub fn set(&mut self, conn_id: ConnectionId, peer: PeerDescriptor) {
        self.peers.insert(conn_id, peer);
    }

    /// `None` means the connection never announced itself.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<&PeerDescriptor> {
        self.peers.get(conn_id)
    }

    pub fn remove(&mut self, conn_id: &ConnectionId) -> Option<PeerDescriptor> {
        self.peers.remove(conn_id)
    }
}
