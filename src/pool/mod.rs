//! Connection pooling for a single remote host
//!
//! This module provides:
//! - A bounded, fair idle registry of reusable connection handles
//! - Concurrency-safe tracking of handles out on loan
//! - Borrow/release/shutdown orchestration with backpressure when exhausted
//! - Lock-free observability counters and status reporting

mod active;
mod idle;

pub mod host;
pub mod stats;

pub use host::{HostPool, PoolError};
pub use stats::PoolStats;
