mod event_log;
mod file_log_store;
mod log_store;
mod replay;

pub use event_log::*;
pub use file_log_store::*;
pub use log_store::*;
pub use replay::*;
