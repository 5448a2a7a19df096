mod config;
mod error;
mod eventlog;
mod hub;
mod relay;
mod transport;

pub use config::*;
pub use error::*;
pub use eventlog::*;
pub use hub::*;
pub use relay::*;
pub use transport::*;
