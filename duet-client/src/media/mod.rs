mod media_backend;
mod rtc_media;
mod transport_config;

pub use media_backend::*;
pub use rtc_media::*;
pub use transport_config::*;
