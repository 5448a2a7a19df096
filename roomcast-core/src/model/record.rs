use crate::model::connection::ConnectionId;
use crate::model::event::PeerDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a log record describes. `on:*` tags record the inbound request,
/// `event:*` tags record the event the relay fanned out in response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogKind {
    #[serde(rename = "on:join")]
    OnJoin,
    #[serde(rename = "event:join")]
    EventJoin,
    #[serde(rename = "on:broadcast")]
    OnBroadcast,
    #[serde(rename = "event:broadcast")]
    EventBroadcast,
    #[serde(rename = "on:leave")]
    OnLeave,
    #[serde(rename = "event:leave")]
    EventLeave,
    #[serde(rename = "on:disconnecting")]
    OnDisconnecting,
    #[serde(rename = "event:disconnect")]
    EventDisconnect,
    #[serde(rename = "on:disconnect")]
    OnDisconnect,
    #[serde(rename = "on:error")]
    OnError,
    #[serde(rename = "on:set-peer")]
    OnSetPeer,
    #[serde(rename = "event:peer-update")]
    EventPeerUpdate,
    #[serde(rename = "on:set-room-metadata")]
    OnSetRoomMetadata,
    #[serde(rename = "event:room-metadata")]
    EventRoomMetadata,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::OnJoin => "on:join",
            LogKind::EventJoin => "event:join",
            LogKind::OnBroadcast => "on:broadcast",
            LogKind::EventBroadcast => "event:broadcast",
            LogKind::OnLeave => "on:leave",
            LogKind::EventLeave => "event:leave",
            LogKind::OnDisconnecting => "on:disconnecting",
            LogKind::EventDisconnect => "event:disconnect",
            LogKind::OnDisconnect => "on:disconnect",
            LogKind::OnError => "on:error",
            LogKind::OnSetPeer => "on:set-peer",
            LogKind::EventPeerUpdate => "event:peer-update",
            LogKind::OnSetRoomMetadata => "on:set-room-metadata",
            LogKind::EventRoomMetadata => "event:room-metadata",
        }
    }
}

/// One line of a room's event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Epoch milliseconds.
    pub date: i64,
    pub room: String,
    pub id: ConnectionId,
    pub peer: Option<PeerDescriptor>,
    pub addr: String,
    pub kind: LogKind,
    pub data: Value,
}

impl LogRecord {
    /// Single-line JSON encoding, without the trailing newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
