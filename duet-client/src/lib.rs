mod chat;
mod client;
mod error;
mod media;
mod session;
mod transport;

pub use chat::*;
pub use client::*;
pub use error::*;
pub use media::*;
pub use session::*;
pub use transport::*;
