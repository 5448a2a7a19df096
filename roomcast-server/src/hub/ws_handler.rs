use crate::hub::app::AppState;
use crate::hub::session::Session;
use crate::transport::TransportConfig;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use roomcast_core::{ClientFrame, ConnectionId};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tracing::{error, info, warn};

/// Why a connection ended; passed to the relay as the `disconnecting` reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ClientDisconnect,
    TransportClose,
    TransportError,
    PingTimeout,
    ServerShutdown,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::ClientDisconnect => "client namespace disconnect",
            CloseReason::TransportClose => "transport close",
            CloseReason::TransportError => "transport error",
            CloseReason::PingTimeout => "ping timeout",
            CloseReason::ServerShutdown => "server shutting down",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: AppState) {
    let conn_id = ConnectionId::new();
    info!("New WebSocket connection: {} from {}", conn_id, addr);

    let hub = state.hub;
    let mut session = match Session::open(conn_id, addr.to_string(), hub.relay().clone()).await {
        Ok(session) => session,
        Err(e) => {
            error!("Refusing connection {}: {}", conn_id, e);
            return;
        }
    };

    let (mut sender, receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    hub.add_connection(conn_id, tx.clone());

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let reason = tokio::select! {
        reason = read_frames(receiver, &mut session, &tx, &state.transport) => reason,
        _ = (&mut send_task) => CloseReason::TransportClose,
    };
    send_task.abort();

    hub.remove_connection(&conn_id);
    if let Err(e) = session.close(reason.as_str()).await {
        warn!(
            "Could not report disconnect of {} (session {:?}): {}",
            conn_id,
            session.state(),
            e
        );
    }
    info!(
        "WebSocket disconnected: {} ({}), {} still connected",
        conn_id,
        reason,
        hub.connection_count()
    );
}

/// Reads client frames until the connection ends, pinging on the configured
/// interval and giving up on clients silent for longer than the idle limit.
async fn read_frames(
    mut receiver: SplitStream<WebSocket>,
    session: &mut Session,
    tx: &mpsc::UnboundedSender<Message>,
    transport: &TransportConfig,
) -> CloseReason {
    let mut ping = interval_at(
        Instant::now() + transport.ping_interval,
        transport.ping_interval,
    );
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            frame = receiver.next() => {
                let Some(frame) = frame else {
                    return CloseReason::TransportClose;
                };
                last_seen = Instant::now();

                match frame {
                    Ok(Message::Text(text)) => match ClientFrame::parse(&text) {
                        Ok(frame) => {
                            if let Err(e) = session.dispatch(frame).await {
                                error!("Relay died: {}", e);
                                return CloseReason::ServerShutdown;
                            }
                        }
                        Err(e) => {
                            warn!("Invalid frame from {}: {}", session.conn_id(), e);
                            let error = json!({ "message": format!("invalid frame: {e}") });
                            if session.report_error(error).await.is_err() {
                                return CloseReason::ServerShutdown;
                            }
                        }
                    },
                    Ok(Message::Close(_)) => return CloseReason::ClientDisconnect,
                    Ok(_) => {}
                    Err(e) => {
                        let _ = session.report_error(json!({ "message": e.to_string() })).await;
                        return CloseReason::TransportError;
                    }
                }
            }

            _ = ping.tick() => {
                if last_seen.elapsed() > transport.idle_limit() {
                    return CloseReason::PingTimeout;
                }
                if tx.send(Message::Ping(Default::default())).is_err() {
                    return CloseReason::TransportClose;
                }
            }
        }
    }
}
