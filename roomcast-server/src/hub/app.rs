use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::eventlog::{EventLog, FileLogStore, LogStore};
use crate::hub::hub_service::HubService;
use crate::hub::ws_handler::ws_handler;
use crate::relay::{RelayHandle, RelayStats};
use crate::transport::TransportConfig;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub hub: HubService,
    pub transport: TransportConfig,
}

/// A running relay, its event log writer, and the HTTP surface in front of them.
pub struct RelayServer {
    state: AppState,
}

impl RelayServer {
    /// Spawns the log writer and the relay on the current runtime.
    pub fn new(config: &RelayConfig, store: Box<dyn LogStore>) -> Self {
        let log = EventLog::spawn(store, config.log_queue_capacity);

        let (relay, relay_rx) = RelayHandle::channel(config.relay_queue_capacity);
        let hub = HubService::new(relay);
        RelayHandle::start(relay_rx, Arc::new(hub.clone()), log);

        Self {
            state: AppState {
                hub,
                transport: config.transport.clone(),
            },
        }
    }

    /// Relay backed by `log-<room>.txt` files in `config.log_dir`.
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config, Box::new(FileLogStore::new(&config.log_dir)))
    }

    pub fn relay(&self) -> &RelayHandle {
        self.state.hub.relay()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/stats", get(stats_handler))
            .layer(cors_layer(&self.state.transport))
            .with_state(self.state.clone())
    }

    pub async fn serve(self, listener: TcpListener) -> Result<(), RelayError> {
        info!("Relay listening on {}", listener.local_addr()?);

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn stats_handler(State(state): State<AppState>) -> Result<Json<RelayStats>, StatusCode> {
    state.hub.relay().stats().await.map(Json).map_err(|e| {
        error!("Stats unavailable: {}", e);
        StatusCode::SERVICE_UNAVAILABLE
    })
}

fn cors_layer(transport: &TransportConfig) -> CorsLayer {
    let origin = if transport.allows_any_origin() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            transport
                .allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
