//! CLI flags and the [`ServerConfig`] they're parsed into.

use std::net::IpAddr;

use cache_core::{CacheEngine, EvictionPolicy, FifoPolicy, LruPolicy};
use clap::{Parser, ValueEnum};

/// Which [`EvictionPolicy`] to build the engine with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// First-in-first-out eviction.
    Fifo,
    /// Least-recently-used eviction.
    Lru,
    /// No eviction: SETs that don't fit once the cache is full fail silently forever.
    None,
}

impl PolicyKind {
    /// Builds the boxed policy this kind names, or `None` for [`PolicyKind::None`].
    pub fn build(self) -> Option<Box<dyn EvictionPolicy>> {
        match self {
            PolicyKind::Fifo => Some(Box::new(FifoPolicy::new())),
            PolicyKind::Lru => Some(Box::new(LruPolicy::new())),
            PolicyKind::None => None,
        }
    }
}

/// A networked in-memory key-value cache daemon.
#[derive(Parser, Debug)]
#[command(name = "cache-server", about = "A networked in-memory key-value cache", version)]
pub struct Cli {
    /// Maximum number of bytes the cache may hold.
    #[arg(short = 'm', long = "maxmem", default_value_t = 10)]
    pub maxmem: usize,

    /// Address to bind the HTTP listener to.
    #[arg(short = 's', long = "bind", default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Port to listen on.
    #[arg(short = 'p', long = "port", default_value_t = 65413)]
    pub port: u16,

    /// Number of worker threads in the server's async runtime.
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Eviction policy to build the engine with.
    #[arg(long = "policy", value_enum, default_value_t = PolicyKind::Lru)]
    pub policy: PolicyKind,
}

/// The resolved configuration a [`crate::server::ServerCore`] is built from.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub maxmem: usize,
    pub bind: IpAddr,
    pub port: u16,
    pub threads: usize,
    pub policy: PolicyKind,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            maxmem: cli.maxmem,
            bind: cli.bind,
            port: cli.port,
            threads: cli.threads,
            policy: cli.policy,
        }
    }
}

impl ServerConfig {
    /// Builds the [`CacheEngine`] this configuration describes.
    pub fn build_engine(&self) -> cache_core::Result<CacheEngine> {
        CacheEngine::new(self.maxmem, 64, self.policy.build())
    }
}
