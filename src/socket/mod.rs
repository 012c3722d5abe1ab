mod backoff;
mod channel_connector;
mod client;
mod endpoint;
mod listeners;
mod port;
mod ws_connector;

pub use backoff::*;
pub use channel_connector::*;
pub use client::*;
pub use endpoint::*;
pub use listeners::*;
pub use port::*;
pub use ws_connector::*;
