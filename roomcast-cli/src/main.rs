use anyhow::{Context, Result};
use clap::Parser;
use roomcast::server::{RelayConfig, RelayServer, TransportConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Realtime room relay with per-room event logs.
#[derive(Parser, Debug, Clone)]
#[command(name = "roomcast")]
#[command(version)]
struct Args {
    /// Socket address to listen on.
    #[arg(long, default_value = "0.0.0.0:3000", env = "ROOMCAST_LISTEN")]
    listen: SocketAddr,

    /// Directory for the per-room `log-<room>.txt` files.
    #[arg(long, default_value = ".", env = "ROOMCAST_LOG_DIR")]
    log_dir: PathBuf,

    /// Log writes that may be pending before the relay waits on the writer.
    #[arg(long, default_value = "1024", env = "ROOMCAST_LOG_QUEUE")]
    log_queue: usize,

    /// Client events that may be pending before connections wait on the relay.
    #[arg(long, default_value = "1024", env = "ROOMCAST_RELAY_QUEUE")]
    relay_queue: usize,

    /// Seconds between websocket pings.
    #[arg(long, default_value = "5", env = "ROOMCAST_PING_INTERVAL")]
    ping_interval: u64,

    /// Seconds of silence tolerated past a ping before dropping the client.
    #[arg(long, default_value = "5", env = "ROOMCAST_PING_TIMEOUT")]
    ping_timeout: u64,

    /// Allowed CORS origins; repeat or comma-separate. `*` allows any.
    #[arg(long, default_value = "*", value_delimiter = ',', env = "ROOMCAST_ORIGINS")]
    origin: Vec<String>,

    /// Default diagnostic filter when RUST_LOG is unset.
    #[arg(long, default_value = "info", env = "ROOMCAST_LOG_LEVEL")]
    log_level: String,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            listen: args.listen,
            log_dir: args.log_dir,
            log_queue_capacity: args.log_queue,
            relay_queue_capacity: args.relay_queue,
            transport: TransportConfig {
                ping_interval: Duration::from_secs(args.ping_interval),
                ping_timeout: Duration::from_secs(args.ping_timeout),
                allowed_origins: args.origin,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = RelayConfig::from(args);
    config.validate().context("configuration error")?;

    info!("Initializing relay, logs in {}", config.log_dir.display());
    let server = RelayServer::from_config(&config);

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    server.serve(listener).await?;

    Ok(())
}
