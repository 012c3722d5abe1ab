pub mod logger;
pub mod settings;

pub mod server;

pub mod application_impl;
pub mod application_port;
pub mod auth;
pub mod domain_model;
pub mod socket;
