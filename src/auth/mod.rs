mod api_client;
mod refresh_guard;

pub use api_client::*;
pub use refresh_guard::*;
