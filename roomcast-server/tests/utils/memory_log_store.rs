use async_trait::async_trait;
use roomcast_core::{LogKind, LogRecord};
use roomcast_server::{LogError, LogStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory LogStore with switchable failures. Clones share state, so a
/// test can keep one clone while the event log worker owns another.
#[derive(Clone, Default)]
pub struct MemoryLogStore {
    streams: Arc<Mutex<HashMap<String, Vec<String>>>>,
    fail_appends: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    read_delay_ms: Arc<AtomicU64>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every tail read take at least `delay`.
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Put raw lines into a room's stream, bypassing the relay.
    pub fn seed(&self, room: &str, lines: impl IntoIterator<Item = String>) {
        self.streams
            .lock()
            .unwrap()
            .entry(room.to_string())
            .or_default()
            .extend(lines);
    }

    pub fn lines(&self, room: &str) -> Vec<String> {
        self.streams
            .lock()
            .unwrap()
            .get(room)
            .cloned()
            .unwrap_or_default()
    }

    pub fn records(&self, room: &str) -> Vec<LogRecord> {
        self.lines(room)
            .iter()
            .map(|line| LogRecord::parse(line).expect("relay wrote an unparseable line"))
            .collect()
    }

    pub fn kinds(&self, room: &str) -> Vec<LogKind> {
        self.records(room).iter().map(|r| r.kind).collect()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn append(&mut self, room: &str, line: &str) -> Result<(), LogError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(LogError::Io(std::io::Error::other("injected append failure")));
        }
        self.seed(room, [line.to_string()]);
        Ok(())
    }

    async fn read_last_lines(&mut self, room: &str, count: usize) -> Result<Vec<String>, LogError> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(LogError::Io(std::io::Error::other("injected read failure")));
        }
        let lines = self.lines(room);
        let skip = lines.len().saturating_sub(count);
        Ok(lines.into_iter().skip(skip).collect())
    }
}
