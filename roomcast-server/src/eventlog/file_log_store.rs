use crate::error::LogError;
use crate::eventlog::log_store::LogStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Write as _;
use std::io::{ErrorKind, SeekFrom};
use std::path::PathBuf;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info};

const TAIL_CHUNK: u64 = 8 * 1024;

/// Maps a room name to its log file name. Bytes outside `[A-Za-z0-9._-]`
/// are written as `%XX`, so distinct rooms never share a file and no room
/// name can point outside the log directory.
pub fn log_file_name(room: &str) -> String {
    let mut name = String::with_capacity(room.len() + 8);
    name.push_str("log-");
    for byte in room.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-') {
            name.push(byte as char);
        } else {
            let _ = write!(name, "%{byte:02X}");
        }
    }
    name.push_str(".txt");
    name
}

/// [`LogStore`] writing `log-<room>.txt` files under one directory.
pub struct FileLogStore {
    dir: PathBuf,
    handles: HashMap<String, File>,
    dir_ready: bool,
}

impl FileLogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            handles: HashMap::new(),
            dir_ready: false,
        }
    }

    pub fn path_for(&self, room: &str) -> PathBuf {
        self.dir.join(log_file_name(room))
    }

    async fn handle(&mut self, room: &str) -> Result<&mut File, LogError> {
        if !self.dir_ready {
            tokio::fs::create_dir_all(&self.dir).await?;
            self.dir_ready = true;
        }

        let path = self.path_for(room);
        match self.handles.entry(room.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await?;
                info!("Opened event log {}", path.display());
                Ok(entry.insert(file))
            }
        }
    }
}

#[async_trait]
impl LogStore for FileLogStore {
    async fn append(&mut self, room: &str, line: &str) -> Result<(), LogError> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let file = self.handle(room).await?;
        let written = match file.write_all(buf.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            // Reopen on the next append rather than reuse a handle in an unknown state.
            self.handles.remove(room);
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_last_lines(&mut self, room: &str, count: usize) -> Result<Vec<String>, LogError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let path = self.path_for(room);
        let mut file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No event log yet for room '{}'", room);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut pos = file.metadata().await?.len();
        let mut tail: Vec<u8> = Vec::new();

        while pos > 0 && newline_count(&tail) <= count {
            let step = TAIL_CHUNK.min(pos);
            pos -= step;

            let mut chunk = vec![0u8; step as usize];
            file.seek(SeekFrom::Start(pos)).await?;
            file.read_exact(&mut chunk).await?;

            chunk.extend_from_slice(&tail);
            tail = chunk;
        }

        Ok(last_lines(&String::from_utf8_lossy(&tail), count, pos > 0))
    }
}

fn newline_count(bytes: &[u8]) -> usize {
    bytes.iter().filter(|b| **b == b'\n').count()
}

/// Splits a file tail into its last `count` lines. When `partial_head` is
/// set the text starts mid-line and its first fragment is dropped.
fn last_lines(text: &str, count: usize, partial_head: bool) -> Vec<String> {
    let mut lines: Vec<&str> = text.split('\n').collect();

    if text.ends_with('\n') {
        lines.pop();
    }
    if partial_head && !lines.is_empty() {
        lines.remove(0);
    }

    let skip = lines.len().saturating_sub(count);
    lines
        .into_iter()
        .skip(skip)
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}
