mod credential_store_file;
mod credential_store_memory;
mod refresh_transport_fake;
mod refresh_transport_http;
mod settings_factory;

pub use credential_store_file::*;
pub use credential_store_memory::*;
pub use refresh_transport_fake::*;
pub use refresh_transport_http::*;
pub use settings_factory::*;
