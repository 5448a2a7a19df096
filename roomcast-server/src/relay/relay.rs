use crate::eventlog::{EventLog, replay_events};
use crate::relay::directory::RoomDirectory;
use crate::relay::presence::PresenceRegistry;
use crate::relay::relay_command::RelayCommand;
use crate::relay::relay_handle::RelayStats;
use crate::transport::RelayOutput;
use futures::StreamExt;
use futures::stream::FuturesOrdered;
use roomcast_core::{
    BroadcastEvent, BroadcastRequest, ConnectionId, DEFAULT_ROOM, JoinRequest, LogKind, LogRecord,
    PeerDescriptor, PeerRequest, PresenceEvent, RoomMetadataEvent, RoomMetadataRequest,
    RoomRequest, RosterEvent, ServerEvent, WelcomeEvent, replay_limit,
};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// A queued tail read: the joiner, the room, and the lines read.
type PendingReplay = Pin<Box<dyn Future<Output = (ConnectionId, String, Vec<String>)> + Send + Sync>>;

/// Something owed to a connection that has a replay in flight.
enum Outbound {
    Event(ServerEvent),
    /// Placeholder for the replay's broadcasts.
    Replay,
}

/// The relay actor. Owns presence and room membership; every command is
/// handled to completion before the next one starts, which gives each
/// room a single total order of log records and fan-outs.
///
/// Tail reads for replay run on the log worker while the actor keeps going.
/// Until a connection's replay arrives, anything else addressed to it is
/// held in its outbox, so it sees the replay before later live events.
pub struct Relay {
    presence: PresenceRegistry,
    directory: RoomDirectory,
    /// Remote address per live connection, for log records.
    sessions: HashMap<ConnectionId, String>,
    /// Held deliveries; the front of a queue is always a `Replay` slot.
    outbox: HashMap<ConnectionId, VecDeque<Outbound>>,
    replays: FuturesOrdered<PendingReplay>,
    command_rx: mpsc::Receiver<RelayCommand>,
    output: Arc<dyn RelayOutput>,
    log: EventLog,
}

impl Relay {
    pub fn new(
        command_rx: mpsc::Receiver<RelayCommand>,
        output: Arc<dyn RelayOutput>,
        log: EventLog,
    ) -> Self {
        Self {
            presence: PresenceRegistry::new(),
            directory: RoomDirectory::new(),
            sessions: HashMap::new(),
            outbox: HashMap::new(),
            replays: FuturesOrdered::new(),
            command_rx,
            output,
            log,
        }
    }

    pub async fn run(mut self) {
        info!("Relay event loop started");

        loop {
            tokio::select! {
                biased;

                Some((conn_id, room, lines)) = self.replays.next(), if !self.replays.is_empty() => {
                    self.finish_replay(conn_id, &room, lines).await;
                }

                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
            }
        }

        info!("Command channel closed. Relay event loop finished");
    }

    async fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Connect { conn_id, addr } => {
                debug!("Connection {} registered from {}", conn_id, addr);
                self.sessions.insert(conn_id, addr);
            }
            RelayCommand::Join {
                conn_id,
                request,
                raw,
            } => self.join(conn_id, request, raw).await,
            RelayCommand::Broadcast {
                conn_id,
                request,
                raw,
            } => self.broadcast(conn_id, request, raw).await,
            RelayCommand::Leave {
                conn_id,
                request,
                raw,
            } => self.leave(conn_id, request, raw).await,
            RelayCommand::Peers { conn_id, request } => {
                let event = ServerEvent::Peers(RosterEvent {
                    peers: self.presence_snapshot(&request.room),
                    room: request.room,
                });
                self.deliver(conn_id, event).await;
            }
            RelayCommand::SetPeer {
                conn_id,
                request,
                raw,
            } => self.set_peer(conn_id, request, raw).await,
            RelayCommand::SetRoomMetadata {
                conn_id,
                request,
                raw,
            } => self.set_room_metadata(conn_id, request, raw).await,
            RelayCommand::Disconnecting { conn_id, reason } => {
                self.disconnecting(conn_id, reason).await
            }
            RelayCommand::Disconnect { conn_id } => self.disconnect(conn_id).await,
            RelayCommand::Error { conn_id, error } => {
                warn!("Connection {} reported error: {}", conn_id, error);
                self.record(DEFAULT_ROOM, conn_id, LogKind::OnError, error)
                    .await;
            }
            RelayCommand::Stats { reply } => {
                let _ = reply.send(RelayStats {
                    connections: self.sessions.len(),
                    rooms: self.directory.room_count(),
                    memberships: self.directory.membership_count(),
                });
            }
        }
    }

    async fn join(&mut self, conn_id: ConnectionId, request: JoinRequest, raw: Value) {
        debug!("{} joins '{}'", conn_id, request.room);
        let room = request.room.clone();
        self.record(&room, conn_id, LogKind::OnJoin, raw).await;

        self.presence.set(conn_id, request.peer);
        if self.directory.join(&room, conn_id) {
            info!("Room '{}' created", room);
        }

        if let Some(metadata) = self.directory.metadata_of(&room).cloned() {
            let welcome = ServerEvent::Welcome(WelcomeEvent {
                room: room.clone(),
                metadata,
            });
            self.deliver(conn_id, welcome).await;
        }

        let event = ServerEvent::Join(PresenceEvent {
            room: room.clone(),
            peer: self.peer_of(&conn_id),
            peers: self.presence_snapshot(&room),
        });
        self.publish(conn_id, &room, event).await;

        let limit = replay_limit(request.max_log_entries);
        if limit > 0 {
            self.replay(conn_id, room, limit).await;
        }
    }

    /// Queues the tail read now, so it sees everything logged so far, and
    /// holds the joiner's later deliveries until the read completes.
    async fn replay(&mut self, conn_id: ConnectionId, room: String, limit: usize) {
        let pending = match self.log.request_tail(&room, limit).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("Replay for {} in '{}' skipped: {}", conn_id, room, e);
                return;
            }
        };

        self.outbox
            .entry(conn_id)
            .or_default()
            .push_back(Outbound::Replay);
        self.replays.push_back(Box::pin(async move {
            let lines = match pending.await {
                Ok(Ok(lines)) => lines,
                Ok(Err(e)) => {
                    warn!("Replay for {} in '{}' skipped: {}", conn_id, room, e);
                    Vec::new()
                }
                Err(_) => Vec::new(),
            };
            (conn_id, room, lines)
        }));
    }

    /// Sends a finished replay, then whatever was held behind it up to the
    /// connection's next pending replay.
    async fn finish_replay(&mut self, conn_id: ConnectionId, room: &str, lines: Vec<String>) {
        let Some(mut queue) = self.outbox.remove(&conn_id) else {
            debug!("Dropping replay of '{}' for departed {}", room, conn_id);
            return;
        };
        queue.pop_front();

        let events = replay_events(&lines);
        debug!("Replaying {} broadcasts of '{}' to {}", events.len(), room, conn_id);
        for event in events {
            self.output.send(conn_id, event).await;
        }

        while let Some(next) = queue.pop_front() {
            match next {
                Outbound::Event(event) => self.output.send(conn_id, event).await,
                Outbound::Replay => {
                    queue.push_front(Outbound::Replay);
                    self.outbox.insert(conn_id, queue);
                    break;
                }
            }
        }
    }

    async fn broadcast(&mut self, conn_id: ConnectionId, request: BroadcastRequest, raw: Value) {
        self.record(&request.room, conn_id, LogKind::OnBroadcast, raw)
            .await;

        let event = ServerEvent::Broadcast(BroadcastEvent {
            room: request.room.clone(),
            msg: request.msg,
            peer: self.peer_of(&conn_id),
            is_live: true,
        });
        self.publish(conn_id, &request.room, event).await;
    }

    async fn leave(&mut self, conn_id: ConnectionId, request: RoomRequest, raw: Value) {
        let room = request.room;
        self.record(&room, conn_id, LogKind::OnLeave, raw).await;

        if !self.directory.leave(&room, conn_id) {
            debug!("{} left '{}' without being a member", conn_id, room);
        }

        let event = ServerEvent::Leave(PresenceEvent {
            room: room.clone(),
            peer: self.peer_of(&conn_id),
            peers: self.presence_snapshot(&room),
        });
        self.publish(conn_id, &room, event.clone()).await;
        self.deliver(conn_id, event).await;
    }

    /// Replaces the caller's descriptor and tells every room it is in.
    async fn set_peer(&mut self, conn_id: ConnectionId, request: PeerRequest, raw: Value) {
        let rooms = self.directory.rooms_of(&conn_id);
        if rooms.is_empty() {
            self.record(DEFAULT_ROOM, conn_id, LogKind::OnSetPeer, raw)
                .await;
            self.presence.set(conn_id, request.peer);
            return;
        }

        for room in &rooms {
            self.record(room, conn_id, LogKind::OnSetPeer, raw.clone())
                .await;
        }
        self.presence.set(conn_id, request.peer);

        for room in rooms {
            let event = ServerEvent::PeerUpdate(PresenceEvent {
                room: room.clone(),
                peer: self.peer_of(&conn_id),
                peers: self.presence_snapshot(&room),
            });
            self.publish(conn_id, &room, event).await;
        }
    }

    async fn set_room_metadata(
        &mut self,
        conn_id: ConnectionId,
        request: RoomMetadataRequest,
        raw: Value,
    ) {
        let room = request.room;
        self.record(&room, conn_id, LogKind::OnSetRoomMetadata, raw)
            .await;

        self.directory.set_metadata(&room, request.metadata.clone());

        let event = ServerEvent::RoomMetadata(RoomMetadataEvent {
            room: room.clone(),
            metadata: request.metadata,
            peer: self.peer_of(&conn_id),
        });
        self.publish(conn_id, &room, event).await;
    }

    async fn disconnecting(&mut self, conn_id: ConnectionId, reason: String) {
        info!("{} disconnecting: {}", conn_id, reason);

        let mut rooms = self.directory.rooms_of(&conn_id);
        if rooms.is_empty() {
            rooms.push(DEFAULT_ROOM.to_string());
        }

        for room in rooms {
            self.record(
                &room,
                conn_id,
                LogKind::OnDisconnecting,
                json!({ "reason": reason }),
            )
            .await;

            self.directory.leave(&room, conn_id);

            let event = ServerEvent::Disconnect(PresenceEvent {
                room: room.clone(),
                peer: self.peer_of(&conn_id),
                peers: self.presence_snapshot(&room),
            });
            self.publish(conn_id, &room, event).await;
        }
    }

    async fn disconnect(&mut self, conn_id: ConnectionId) {
        self.record(DEFAULT_ROOM, conn_id, LogKind::OnDisconnect, json!({}))
            .await;

        let stale = self.directory.leave_all(conn_id);
        if !stale.is_empty() {
            warn!(
                "{} torn down while still in {:?}; memberships dropped",
                conn_id, stale
            );
        }
        self.presence.remove(&conn_id);
        self.sessions.remove(&conn_id);
        self.outbox.remove(&conn_id);
        info!("{} disconnected", conn_id);
    }

    fn peer_of(&self, conn_id: &ConnectionId) -> Option<PeerDescriptor> {
        self.presence.get(conn_id).cloned()
    }

    fn presence_snapshot(&self, room: &str) -> Vec<Option<PeerDescriptor>> {
        self.directory
            .members_of(room)
            .iter()
            .map(|member| self.peer_of(member))
            .collect()
    }

    /// Sends now, or holds the event if `conn_id` is waiting on a replay.
    async fn deliver(&mut self, conn_id: ConnectionId, event: ServerEvent) {
        match self.outbox.get_mut(&conn_id) {
            Some(queue) => queue.push_back(Outbound::Event(event)),
            None => self.output.send(conn_id, event).await,
        }
    }

    /// Logs `event` under its kind, then delivers it to every current member of `room`.
    async fn publish(&mut self, conn_id: ConnectionId, room: &str, event: ServerEvent) {
        if let Some(kind) = event.kind() {
            match event.data() {
                Ok(data) => self.record(room, conn_id, kind, data).await,
                Err(e) => error!("Failed to serialize {} for the log: {}", kind.as_str(), e),
            }
        }

        for member in self.directory.members_of(room) {
            self.deliver(member, event.clone()).await;
        }
    }

    async fn record(&self, room: &str, conn_id: ConnectionId, kind: LogKind, data: Value) {
        let record = LogRecord {
            date: chrono::Utc::now().timestamp_millis(),
            room: room.to_string(),
            id: conn_id,
            peer: self.peer_of(&conn_id),
            addr: self.sessions.get(&conn_id).cloned().unwrap_or_default(),
            kind,
            data,
        };

        if let Err(e) = self.log.append(&record).await {
            error!("Dropped {} record for '{}': {}", kind.as_str(), room, e);
        }
    }
}

