use crate::model::record::LogKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Client-announced identity. The relay stores and echoes it without looking inside.
pub type PeerDescriptor = Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub room: String,
    #[serde(default)]
    pub peer: PeerDescriptor,
    #[serde(default)]
    pub max_log_entries: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub room: String,
    #[serde(default)]
    pub msg: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRequest {
    pub room: String,
}

/// New descriptor for the sending connection, applied without a rejoin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerRequest {
    #[serde(default)]
    pub peer: PeerDescriptor,
}

/// Replaces a room's metadata. `null` clears it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMetadataRequest {
    pub room: String,
    #[serde(default)]
    pub metadata: Value,
}

/// Inbound frames, `{"event": "join", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Join(JoinRequest),
    Broadcast(BroadcastRequest),
    Leave(RoomRequest),
    Peers(RoomRequest),
    SetPeer(PeerRequest),
    SetRoomMetadata(RoomMetadataRequest),
}

impl ClientEvent {
    /// Target room, for events addressed to one.
    pub fn room(&self) -> Option<&str> {
        match self {
            ClientEvent::Join(req) => Some(&req.room),
            ClientEvent::Broadcast(req) => Some(&req.room),
            ClientEvent::Leave(req) | ClientEvent::Peers(req) => Some(&req.room),
            ClientEvent::SetRoomMetadata(req) => Some(&req.room),
            ClientEvent::SetPeer(_) => None,
        }
    }
}

/// A decoded client event together with the `data` object exactly as the
/// client sent it, unknown fields and all.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientFrame {
    pub event: ClientEvent,
    pub raw: Value,
}

impl ClientFrame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let event = ClientEvent::deserialize(&value)?;
        let raw = value.get("data").cloned().unwrap_or(Value::Null);
        Ok(Self { event, raw })
    }
}

impl From<ClientEvent> for ClientFrame {
    fn from(event: ClientEvent) -> Self {
        let raw = serde_json::to_value(&event)
            .ok()
            .and_then(|mut frame| frame.get_mut("data").map(Value::take))
            .unwrap_or(Value::Null);
        Self { event, raw }
    }
}

/// Presence change in a room: who triggered it and the room's roster afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub room: String,
    pub peer: Option<PeerDescriptor>,
    pub peers: Vec<Option<PeerDescriptor>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEvent {
    pub room: String,
    pub msg: Value,
    pub peer: Option<PeerDescriptor>,
    pub is_live: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEvent {
    pub room: String,
    pub peers: Vec<Option<PeerDescriptor>>,
}

/// A room's metadata changed; `peer` is whoever changed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMetadataEvent {
    pub room: String,
    pub metadata: Value,
    pub peer: Option<PeerDescriptor>,
}

/// Sent privately to a joiner of a room that carries metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomeEvent {
    pub room: String,
    pub metadata: Value,
}

/// Outbound frames, `{"event": "event:broadcast", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "event:join")]
    Join(PresenceEvent),
    #[serde(rename = "event:broadcast")]
    Broadcast(BroadcastEvent),
    #[serde(rename = "event:leave")]
    Leave(PresenceEvent),
    #[serde(rename = "event:disconnect")]
    Disconnect(PresenceEvent),
    #[serde(rename = "event:peers")]
    Peers(RosterEvent),
    #[serde(rename = "event:peer-update")]
    PeerUpdate(PresenceEvent),
    #[serde(rename = "event:room-metadata")]
    RoomMetadata(RoomMetadataEvent),
    #[serde(rename = "event:welcome")]
    Welcome(WelcomeEvent),
    /// A logged broadcast payload sent back verbatim, with `is_live` forced
    /// to false. Decodes as [`ServerEvent::Broadcast`] on the client side.
    #[serde(rename = "event:broadcast", skip_deserializing)]
    Replayed(Map<String, Value>),
}

impl ServerEvent {
    /// Log tag under which this event is recorded. Private replies
    /// (roster, welcome, replay) are never logged.
    pub fn kind(&self) -> Option<LogKind> {
        match self {
            ServerEvent::Join(_) => Some(LogKind::EventJoin),
            ServerEvent::Broadcast(_) => Some(LogKind::EventBroadcast),
            ServerEvent::Leave(_) => Some(LogKind::EventLeave),
            ServerEvent::Disconnect(_) => Some(LogKind::EventDisconnect),
            ServerEvent::PeerUpdate(_) => Some(LogKind::EventPeerUpdate),
            ServerEvent::RoomMetadata(_) => Some(LogKind::EventRoomMetadata),
            ServerEvent::Peers(_) | ServerEvent::Welcome(_) | ServerEvent::Replayed(_) => None,
        }
    }

    /// Payload without the event tag, as stored in a log record's `data`.
    pub fn data(&self) -> Result<Value, serde_json::Error> {
        match self {
            ServerEvent::Join(e)
            | ServerEvent::Leave(e)
            | ServerEvent::Disconnect(e)
            | ServerEvent::PeerUpdate(e) => serde_json::to_value(e),
            ServerEvent::Broadcast(e) => serde_json::to_value(e),
            ServerEvent::Peers(e) => serde_json::to_value(e),
            ServerEvent::RoomMetadata(e) => serde_json::to_value(e),
            ServerEvent::Welcome(e) => serde_json::to_value(e),
            ServerEvent::Replayed(data) => Ok(Value::Object(data.clone())),
        }
    }
}
