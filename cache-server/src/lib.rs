//! Library half of the cache daemon: CLI configuration and HTTP routing, split out from the
//! binary entry point so integration tests can drive a real, ephemeral-port server.

pub mod config;
pub mod server;

pub use config::{Cli, PolicyKind, ServerConfig};
pub use server::ServerCore;
