/// Room that receives records which belong to no joined room: connection
/// teardown, transport errors, and disconnects of connections that never joined.
pub const DEFAULT_ROOM: &str = "_general";

/// Upper bound on the number of log lines replayed to a joining connection.
pub const MAX_REPLAY_ENTRIES: usize = 50;

/// Clamps a client-supplied `max_log_entries` to `0..=MAX_REPLAY_ENTRIES`.
pub fn replay_limit(requested: i64) -> usize {
    if requested <= 0 {
        return 0;
    }
    usize::try_from(requested)
        .unwrap_or(usize::MAX)
        .min(MAX_REPLAY_ENTRIES)
}
