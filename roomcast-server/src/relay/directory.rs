use indexmap::IndexSet;
use roomcast_core::ConnectionId;
use serde_json::Value;
use std::collections::HashMap;

/// Room membership in both directions, plus per-room metadata.
///
/// Rooms appear on their first join and disappear when their last member
/// leaves. Members enumerate in join order. Metadata is kept by room name
/// and survives the room emptying, like its log.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<String, IndexSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, IndexSet<String>>,
    metadata: HashMap<String, Value>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `conn_id` to `room`. Returns `true` if this created the room.
    /// Joining a room twice leaves membership unchanged.
    pub fn join(&mut self, room: &str, conn_id: ConnectionId) -> bool {
        let created = !self.rooms.contains_key(room);
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn_id);
        self.memberships
            .entry(conn_id)
            .or_default()
            .insert(room.to_string());
        created
    }

    /// Removes `conn_id` from `room`. Returns `true` if it was a member.
    pub fn leave(&mut self, room: &str, conn_id: ConnectionId) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let was_member = members.shift_remove(&conn_id);
        if members.is_empty() {
            self.rooms.remove(room);
        }

        if let Some(rooms) = self.memberships.get_mut(&conn_id) {
            rooms.shift_remove(room);
            if rooms.is_empty() {
                self.memberships.remove(&conn_id);
            }
        }
        was_member
    }

    /// Drops every membership of `conn_id`, returning the rooms it was in.
    pub fn leave_all(&mut self, conn_id: ConnectionId) -> Vec<String> {
        let rooms = self.rooms_of(&conn_id);
        for room in &rooms {
            self.leave(room, conn_id);
        }
        rooms
    }

    /// Current members of `room`; empty for a room nobody is in.
    pub fn members_of(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, conn_id: &ConnectionId) -> Vec<String> {
        self.memberships
            .get(conn_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Replaces the metadata of `room`; `null` removes it.
    pub fn set_metadata(&mut self, room: &str, metadata: Value) {
        if metadata.is_null() {
            self.metadata.remove(room);
        } else {
            self.metadata.insert(room.to_string(), metadata);
        }
    }

    pub fn metadata_of(&self, room: &str) -> Option<&Value> {
        self.metadata.get(room)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn membership_count(&self) -> usize {
        self.rooms.values().map(IndexSet::len).sum()
    }
}
