pub mod config;
pub mod endpoints;
pub mod error;
pub mod exec;
pub mod server;
pub mod system;
