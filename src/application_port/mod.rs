mod api_error;
mod credential_store;
mod refresh_transport;

pub use api_error::*;
pub use credential_store::*;
pub use refresh_transport::*;
