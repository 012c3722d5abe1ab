mod credentials;
mod socket_event;
mod user;

pub use credentials::*;
pub use socket_event::*;
pub use user::*;
