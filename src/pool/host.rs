//! Pool controller: borrow, release and shutdown orchestration
//!
//! `HostPool` is the only entry point; the idle registry and active set are
//! private structures it coordinates. Counters are plain atomics so the
//! borrow/release hot path never takes a pool-wide lock.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::{Connector, PooledConn};
use crate::config::HostConfig;

use super::active::ActiveSet;
use super::idle::IdleQueue;
use super::stats::PoolStats;

/// Error types for pool operations
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Borrow attempted after shutdown. Recoverable; nothing changed.
    #[error("attempt to borrow from inactive pool {0}")]
    PoolInactive(String),

    /// The wait for an idle handle timed out or was cut short. The slot
    /// reservation has been rolled back.
    #[error("max wait time exceeded for caller {caller} on host {host}")]
    PoolExhausted { caller: String, host: String },

    /// shutdown() called on a pool that is already inactive.
    #[error("shutdown called on already inactive pool {0}")]
    IllegalState(String),

    #[error("failed to connect to host: {0}")]
    ConnectionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounded pool of reusable connections to one remote host.
///
/// The pool lends each handle to at most one caller at a time. Callers
/// borrow with [`HostPool::borrow`] and must hand the handle back through
/// [`HostPool::release`]; a handle must not be retained after release.
pub struct HostPool<F: Connector> {
    config: HostConfig,
    connector: F,
    idle: IdleQueue<F::Conn>,
    active_set: ActiveSet,
    num_active: AtomicI64,
    num_blocked: AtomicI64,
    /// Handles alive (opened minus retired). Creation reserves a slot here
    /// before connecting, which is what bounds total handles at capacity.
    num_open: AtomicI64,
    active: AtomicBool,
    /// Normalized bound on the exhausted wait; zero means wait forever.
    max_wait: Duration,
    next_id: AtomicU64,
}

impl<F: Connector> HostPool<F> {
    /// Create a pool and pre-warm a third of its capacity.
    ///
    /// Opens `max_active / 3` connections up front (integer division, so
    /// small capacities pre-warm nothing). A transport failure while
    /// pre-warming fails construction.
    pub async fn new(config: HostConfig, connector: F) -> Result<Self, PoolError> {
        let max_wait = config.max_wait_when_exhausted();
        let pool = Self {
            idle: IdleQueue::new(config.max_active),
            active_set: ActiveSet::new(),
            num_active: AtomicI64::new(0),
            num_blocked: AtomicI64::new(0),
            num_open: AtomicI64::new(0),
            active: AtomicBool::new(true),
            max_wait,
            next_id: AtomicU64::new(1),
            connector,
            config,
        };

        for _ in 0..pool.config.max_active / 3 {
            pool.num_open.fetch_add(1, Ordering::SeqCst);
            match pool.connector.connect().await {
                Ok(conn) => {
                    if let Err(extra) = pool.idle.offer(pool.wrap(conn)) {
                        pool.retire(extra).await;
                    }
                }
                Err(e) => {
                    pool.num_open.fetch_sub(1, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }

        debug!(
            pool = %pool.name(),
            idle = pool.num_idle(),
            max_active = pool.config.max_active,
            max_wait_ms = max_wait.as_millis() as u64,
            "host pool started"
        );
        Ok(pool)
    }

    /// Borrow one handle exclusively.
    ///
    /// Reserves a slot, then takes an idle handle, opening a fresh one
    /// first when capacity allows. When no handle is available the call
    /// waits, bounded by the configured wait time (unbounded when that is
    /// zero). A timed-out wait rolls the reservation back and fails with
    /// [`PoolError::PoolExhausted`].
    pub async fn borrow(&self) -> Result<PooledConn<F::Conn>, PoolError> {
        if !self.is_active() {
            return Err(PoolError::PoolInactive(self.name()));
        }

        let current_active = self.num_active.fetch_add(1, Ordering::SeqCst) + 1;
        let until_exhausted = self.config.max_active as i64 - current_active;
        self.num_blocked.fetch_add(1, Ordering::SeqCst);

        let mut conn = self.idle.try_take();
        if conn.is_none() {
            if self.try_reserve_open_slot() {
                // Grow capacity optimistically. The fresh handle goes
                // through the registry, so the next take below is not
                // guaranteed to receive this exact handle.
                match self.connector.connect().await {
                    Ok(fresh) => {
                        if let Err(extra) = self.idle.offer(self.wrap(fresh)) {
                            self.retire(extra).await;
                        }
                        debug!(
                            pool = %self.name(),
                            active = current_active,
                            until_exhausted,
                            "opened new connection"
                        );
                    }
                    Err(e) => {
                        self.num_open.fetch_sub(1, Ordering::SeqCst);
                        self.num_blocked.fetch_sub(1, Ordering::SeqCst);
                        self.num_active.fetch_sub(1, Ordering::SeqCst);
                        return Err(e);
                    }
                }
            }

            debug!(
                pool = %self.name(),
                blocked = self.num_blocked(),
                "waiting for idle connection"
            );
            conn = if self.max_wait.is_zero() {
                self.idle.take().await
            } else {
                tokio::time::timeout(self.max_wait, self.idle.take())
                    .await
                    .ok()
                    .flatten()
            };
        }

        match conn {
            Some(conn) => {
                self.active_set.insert(conn.id());
                self.num_blocked.fetch_sub(1, Ordering::SeqCst);
                Ok(conn)
            }
            None => {
                // Roll back the slot reservation taken at the top.
                self.num_active.fetch_sub(1, Ordering::SeqCst);
                Err(PoolError::PoolExhausted {
                    caller: current_caller(),
                    host: self.config.name.clone(),
                })
            }
        }
    }

    /// Return a previously borrowed handle.
    ///
    /// Open handles go back to the idle registry; closed ones are dropped.
    /// After shutdown, released handles are closed instead of re-queued.
    /// Releasing a handle the pool never issued is tolerated.
    pub async fn release(&self, conn: PooledConn<F::Conn>) {
        self.active_set.remove(conn.id());
        self.num_active.fetch_sub(1, Ordering::SeqCst);

        if !self.is_active() {
            let id = conn.id();
            self.retire(conn).await;
            debug!(pool = %self.name(), id, "closed connection released after shutdown");
            return;
        }

        let id = conn.id();
        let open = conn.is_open();
        if open {
            if let Err(excess) = self.idle.offer(conn) {
                // Registry full, or closed by a concurrent shutdown.
                self.retire(excess).await;
            }
        } else {
            // Already closed; dropped without re-closing.
            self.num_open.fetch_sub(1, Ordering::SeqCst);
        }
        debug!(pool = %self.name(), id, open, "released connection");
    }

    /// One-shot transition to inactive; drains and closes all idle handles.
    ///
    /// Handles out on loan are not forcibly closed; they are closed when
    /// their holders release them against the inactive pool. Waiters parked
    /// in [`HostPool::borrow`] wake and fail over the exhausted path.
    pub async fn shutdown(&self) -> Result<(), PoolError> {
        if self
            .active
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PoolError::IllegalState(self.name()));
        }
        warn!(pool = %self.name(), "shutdown triggered");

        let drained = self.idle.close_and_drain();
        let closed = drained.len();
        for conn in drained {
            self.retire(conn).await;
        }

        info!(pool = %self.name(), closed, "shutdown complete");
        Ok(())
    }

    /// Whether the pool still accepts borrows.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Handles currently lent to callers.
    pub fn num_active(&self) -> i64 {
        self.num_active.load(Ordering::SeqCst)
    }

    /// Handles sitting in the idle registry.
    pub fn num_idle(&self) -> usize {
        self.idle.len()
    }

    /// Callers inside borrow that do not hold a handle yet.
    pub fn num_blocked(&self) -> i64 {
        self.num_blocked.load(Ordering::SeqCst)
    }

    /// Slots left before exhaustion; negative while over-subscribed.
    pub fn num_before_exhausted(&self) -> i64 {
        self.config.max_active as i64 - self.num_active()
    }

    /// Whether active count has reached capacity exactly.
    pub fn is_exhausted(&self) -> bool {
        self.num_before_exhausted() == 0
    }

    /// Configured capacity.
    pub fn max_active(&self) -> usize {
        self.config.max_active
    }

    /// Host configuration this pool was built from.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Diagnostic name of this pool.
    pub fn name(&self) -> String {
        format!("<HostConnectionPool>:{}", self.config.name)
    }

    /// Snapshot of all counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.num_active(),
            idle: self.num_idle(),
            blocked: self.num_blocked(),
            max_active: self.config.max_active,
        }
    }

    /// Human-readable one-line status.
    pub fn status(&self) -> String {
        format!("{}; {}", self.name(), self.stats())
    }

    fn wrap(&self, conn: F::Conn) -> PooledConn<F::Conn> {
        PooledConn::new(self.next_id.fetch_add(1, Ordering::SeqCst), conn)
    }

    /// Reserve room for one more live handle. Fails once `max_active`
    /// handles are already alive.
    fn try_reserve_open_slot(&self) -> bool {
        let capacity = self.config.max_active as i64;
        let mut current = self.num_open.load(Ordering::SeqCst);
        loop {
            if current >= capacity {
                return false;
            }
            match self.num_open.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Close a handle and give its slot back.
    async fn retire(&self, mut conn: PooledConn<F::Conn>) {
        conn.close().await;
        self.num_open.fetch_sub(1, Ordering::SeqCst);
    }
}

fn current_caller() -> String {
    std::thread::current().name().unwrap_or("unnamed").to_string()
}
