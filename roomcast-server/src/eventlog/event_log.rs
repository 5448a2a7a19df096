use crate::error::LogError;
use crate::eventlog::log_store::LogStore;
use roomcast_core::LogRecord;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

pub type TailReply = oneshot::Receiver<Result<Vec<String>, LogError>>;

enum LogCommand {
    Append {
        room: String,
        line: String,
    },
    Tail {
        room: String,
        count: usize,
        reply: oneshot::Sender<Result<Vec<String>, LogError>>,
    },
}

/// Handle to the event log writer.
///
/// All appends and tail reads go through one bounded queue drained by a
/// single task, so lines of a room never interleave and a tail read sees
/// every append queued before it. When the queue is full, callers wait.
#[derive(Clone)]
pub struct EventLog {
    tx: mpsc::Sender<LogCommand>,
}

impl EventLog {
    /// Spawns the writer task on the current tokio runtime.
    pub fn spawn(store: Box<dyn LogStore>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(LogWorker { store, rx }.run());
        Self { tx }
    }

    /// Queue `record` for appending to its room's stream.
    ///
    /// Success means the record was queued, not written; write failures are
    /// reported by the worker's own diagnostics.
    pub async fn append(&self, record: &LogRecord) -> Result<(), LogError> {
        let line = record.to_line()?;
        self.tx
            .send(LogCommand::Append {
                room: record.room.clone(),
                line,
            })
            .await
            .map_err(|_| LogError::Closed)
    }

    /// Queue a tail read of `room` and return the receiver of its result.
    ///
    /// The read is ordered with respect to appends at the moment this call
    /// returns, so callers can release their state before awaiting it.
    pub async fn request_tail(&self, room: &str, count: usize) -> Result<TailReply, LogError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(LogCommand::Tail {
                room: room.to_string(),
                count,
                reply,
            })
            .await
            .map_err(|_| LogError::Closed)?;
        Ok(rx)
    }

    pub async fn tail(&self, room: &str, count: usize) -> Result<Vec<String>, LogError> {
        self.request_tail(room, count)
            .await?
            .await
            .map_err(|_| LogError::Closed)?
    }
}

struct LogWorker {
    store: Box<dyn LogStore>,
    rx: mpsc::Receiver<LogCommand>,
}

impl LogWorker {
    async fn run(mut self) {
        info!("Event log writer started");

        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                LogCommand::Append { room, line } => {
                    if let Err(e) = self.store.append(&room, &line).await {
                        error!("Failed to append to event log of room '{}': {}", room, e);
                    }
                }
                LogCommand::Tail { room, count, reply } => {
                    let _ = reply.send(self.store.read_last_lines(&room, count).await);
                }
            }
        }

        info!("Event log writer finished");
    }
}
