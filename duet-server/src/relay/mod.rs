mod connection;
mod relay;

pub use connection::*;
pub use relay::*;
