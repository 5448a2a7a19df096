use crate::error::LogError;
use async_trait::async_trait;

/// Append-only line storage with one stream per room.
///
/// A store is owned by a single [`EventLog`](crate::EventLog) worker, so
/// implementations never see concurrent calls.
#[async_trait]
pub trait LogStore: Send + 'static {
    /// Append one line (without its terminating newline) to `room`'s stream.
    async fn append(&mut self, room: &str, line: &str) -> Result<(), LogError>;

    /// Read up to `count` lines from the end of `room`'s stream, oldest
    /// first. A stream that was never written reads as empty.
    async fn read_last_lines(&mut self, room: &str, count: usize) -> Result<Vec<String>, LogError>;
}
