use crate::relay::relay_handle::RelayStats;
use roomcast_core::{
    BroadcastRequest, ClientEvent, ClientFrame, ConnectionId, JoinRequest, PeerRequest,
    RoomMetadataRequest, RoomRequest,
};
use serde_json::Value;
use tokio::sync::oneshot;

/// Commands the relay actor processes one at a time, in arrival order.
///
/// Client-originated commands carry `raw`, the `data` object as the client
/// sent it, which is what their `on:*` record stores.
#[derive(Debug)]
pub enum RelayCommand {
    /// A transport connection was accepted.
    Connect { conn_id: ConnectionId, addr: String },

    Join {
        conn_id: ConnectionId,
        request: JoinRequest,
        raw: Value,
    },

    Broadcast {
        conn_id: ConnectionId,
        request: BroadcastRequest,
        raw: Value,
    },

    Leave {
        conn_id: ConnectionId,
        request: RoomRequest,
        raw: Value,
    },

    /// Private roster query; changes nothing and is not logged.
    Peers {
        conn_id: ConnectionId,
        request: RoomRequest,
    },

    SetPeer {
        conn_id: ConnectionId,
        request: PeerRequest,
        raw: Value,
    },

    SetRoomMetadata {
        conn_id: ConnectionId,
        request: RoomMetadataRequest,
        raw: Value,
    },

    /// The connection is closing; its memberships are still intact.
    Disconnecting {
        conn_id: ConnectionId,
        reason: String,
    },

    /// Final teardown after `Disconnecting`.
    Disconnect { conn_id: ConnectionId },

    /// Transport or decode failure on a connection. Logged, never fatal.
    Error { conn_id: ConnectionId, error: Value },

    Stats { reply: oneshot::Sender<RelayStats> },
}

impl RelayCommand {
    pub fn from_client(conn_id: ConnectionId, frame: ClientFrame) -> Self {
        let ClientFrame { event, raw } = frame;
        match event {
            ClientEvent::Join(request) => RelayCommand::Join {
                conn_id,
                request,
                raw,
            },
            ClientEvent::Broadcast(request) => RelayCommand::Broadcast {
                conn_id,
                request,
                raw,
            },
            ClientEvent::Leave(request) => RelayCommand::Leave {
                conn_id,
                request,
                raw,
            },
            ClientEvent::Peers(request) => RelayCommand::Peers { conn_id, request },
            ClientEvent::SetPeer(request) => RelayCommand::SetPeer {
                conn_id,
                request,
                raw,
            },
            ClientEvent::SetRoomMetadata(request) => RelayCommand::SetRoomMetadata {
                conn_id,
                request,
                raw,
            },
        }
    }
}
