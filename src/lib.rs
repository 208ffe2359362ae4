//! hostpool - Bounded, fair connection pooling for a single remote host

pub mod client;
pub mod config;
pub mod pool;

pub use client::{Connection, Connector, PooledConn};
pub use config::{Config, HostConfig};
pub use pool::{HostPool, PoolError, PoolStats};
