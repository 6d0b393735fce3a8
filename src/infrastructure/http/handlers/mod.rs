//! HTTP Handlers

mod ping;
mod simplify;
mod websocket;

pub use ping::*;
pub use simplify::*;
pub use websocket::*;
