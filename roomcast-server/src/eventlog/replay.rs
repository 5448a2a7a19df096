use roomcast_core::{LogKind, ServerEvent};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// The two fields replay looks at. Everything else in a line, including
/// the connection id, is left uninterpreted.
#[derive(Deserialize)]
struct LoggedEvent {
    kind: String,
    #[serde(default)]
    data: Value,
}

/// Turns a tail of log lines into the broadcasts to replay to a joining
/// connection, in file order. Only `event:broadcast` records whose `data`
/// is an object are kept; that object is sent back as logged, with
/// `is_live` set to false. Blank and unparseable lines are skipped.
pub fn replay_events<S: AsRef<str>>(lines: &[S]) -> Vec<ServerEvent> {
    lines
        .iter()
        .filter_map(|line| {
            let line = line.as_ref().trim();
            if line.is_empty() {
                return None;
            }

            let logged: LoggedEvent = match serde_json::from_str(line) {
                Ok(logged) => logged,
                Err(e) => {
                    warn!("Skipping malformed log line during replay: {}", e);
                    return None;
                }
            };
            if logged.kind != LogKind::EventBroadcast.as_str() {
                return None;
            }

            match logged.data {
                Value::Object(mut data) => {
                    data.insert("is_live".to_string(), Value::Bool(false));
                    Some(ServerEvent::Replayed(data))
                }
                other => {
                    warn!("Skipping broadcast record with non-object payload: {}", other);
                    None
                }
            }
        })
        .collect()
}
