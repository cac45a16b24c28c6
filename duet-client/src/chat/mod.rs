mod chat_log;
mod identity;

pub use chat_log::*;
pub use identity::*;
