//! Transport collaborator traits and the pooled handle wrapper
//!
//! The pool never opens sockets itself. Callers supply a [`Connector`] that
//! knows how to open one connection to the target host, and the pool hands
//! back [`PooledConn`] wrappers that it can track by identity.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;

use crate::pool::PoolError;

/// One open transport connection to the target host.
///
/// Implementations report whether the connection is still usable and know
/// how to close it. The pool calls `close` when it retires a handle; it
/// never re-closes a handle that already reports itself closed.
#[async_trait]
pub trait Connection: Send + 'static {
    /// Whether the connection is still open and healthy enough to reuse.
    fn is_open(&self) -> bool;

    /// Close the underlying transport.
    async fn close(&mut self);
}

/// Factory for opening connections to a single host.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The connection type this connector produces.
    type Conn: Connection;

    /// Open and connect a new handle.
    ///
    /// Failures propagate to whoever triggered the open (pool construction
    /// or a borrowing caller).
    async fn connect(&self) -> Result<Self::Conn, PoolError>;
}

#[async_trait]
impl<T: Connector> Connector for Arc<T> {
    type Conn = T::Conn;

    async fn connect(&self) -> Result<Self::Conn, PoolError> {
        (**self).connect().await
    }
}

/// A connection handle owned by the pool or lent to exactly one caller.
///
/// The wrapper carries the pool-side identity used for active-set
/// membership. Callers reach the underlying connection through `Deref`.
pub struct PooledConn<C> {
    id: u64,
    conn: C,
}

impl<C: Connection> PooledConn<C> {
    pub(crate) fn new(id: u64, conn: C) -> Self {
        Self { id, conn }
    }

    /// Pool-assigned identity of this handle.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the underlying connection reports itself open.
    pub fn is_open(&self) -> bool {
        self.conn.is_open()
    }

    pub(crate) async fn close(&mut self) {
        self.conn.close().await;
    }
}

impl<C> fmt::Debug for PooledConn<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConn")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<C> Deref for PooledConn<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.conn
    }
}

impl<C> DerefMut for PooledConn<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.conn
    }
}
