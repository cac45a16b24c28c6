mod call_session;
mod session_event;
mod session_state;
mod signal_sink;

pub use call_session::*;
pub use session_event::*;
pub use session_state::*;
pub use signal_sink::*;
