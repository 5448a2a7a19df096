pub use roomcast_core::model::ConnectionId;

pub mod model {
    pub use roomcast_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use roomcast_server::*;
}
