mod connection;
mod event;
mod record;
mod room;

pub use connection::ConnectionId;
pub use event::{
    BroadcastEvent, BroadcastRequest, ClientEvent, ClientFrame, JoinRequest, PeerDescriptor,
    PeerRequest, PresenceEvent, RoomMetadataEvent, RoomMetadataRequest, RoomRequest, RosterEvent,
    ServerEvent, WelcomeEvent,
};
pub use record::{LogKind, LogRecord};
pub use room::{DEFAULT_ROOM, MAX_REPLAY_ENTRIES, replay_limit};
