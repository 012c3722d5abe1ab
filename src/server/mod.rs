mod server;
mod static_files;

pub use server::*;
pub use static_files::*;
