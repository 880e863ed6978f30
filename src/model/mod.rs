pub mod config;
pub mod credentials;
