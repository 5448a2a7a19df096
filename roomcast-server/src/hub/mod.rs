mod app;
mod hub_service;
mod session;
mod ws_handler;

pub use app::*;
pub use hub_service::*;
pub use session::*;
pub use ws_handler::*;
