mod relay_output;
mod transport_config;

pub use relay_output::*;
pub use transport_config::*;
