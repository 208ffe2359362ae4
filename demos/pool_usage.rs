//! Example demonstrating pool usage under concurrent callers
//!
//! This example shows how to:
//! 1. Configure a host pool
//! 2. Plug in a connector for the transport
//! 3. Borrow and release handles from concurrent tasks
//! 4. Observe pool statistics and shut down

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hostpool::{Connection, Connector, HostConfig, HostPool, PoolError};
use tracing::{info, warn};

/// Stand-in transport connection. A real connector would open a TCP or TLS
/// session here.
struct DemoConn {
    serial: u64,
    open: AtomicBool,
}

#[async_trait]
impl Connection for DemoConn {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct DemoConnector {
    serial: AtomicU64,
}

#[async_trait]
impl Connector for DemoConnector {
    type Conn = DemoConn;

    async fn connect(&self) -> Result<DemoConn, PoolError> {
        // Simulate connection setup latency
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(DemoConn {
            serial: self.serial.fetch_add(1, Ordering::SeqCst),
            open: AtomicBool::new(true),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = HostConfig {
        name: "demo-host.example.com:9160".to_string(),
        max_active: 6,
        max_wait_when_exhausted_ms: 500,
    };

    let pool = Arc::new(HostPool::new(config, DemoConnector::default()).await?);
    info!(status = %pool.status(), "pool ready");

    // Hammer the pool from more tasks than it has capacity
    let mut tasks = Vec::new();
    for worker in 0..10 {
        let pool = Arc::clone(&pool);
        tasks.push(tokio::spawn(async move {
            for round in 0..5 {
                match pool.borrow().await {
                    Ok(conn) => {
                        info!(worker, round, serial = conn.serial, "borrowed");
                        // Simulate a request on the connection
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        pool.release(conn).await;
                    }
                    Err(e) => {
                        warn!(worker, round, error = %e, "borrow failed");
                    }
                }
            }
        }));
    }
    for task in tasks {
        task.await?;
    }

    println!("\n=== FINAL POOL STATE ===\n");
    let stats = pool.stats();
    println!("  Active: {}", stats.active);
    println!("  Idle: {}", stats.idle);
    println!("  Blocked: {}", stats.blocked);
    println!("  Before exhausted: {}", stats.before_exhausted());
    println!("  Status: {}", pool.status());

    pool.shutdown().await?;
    println!("  After shutdown: {}", pool.status());

    Ok(())
}
