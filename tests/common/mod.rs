//! Shared mock transport for pool integration tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hostpool::{Connection, Connector, PoolError};

/// In-memory connection whose open flag the tests can observe and flip.
pub struct MockConn {
    pub open: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for MockConn {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

/// Connector that tracks every handle it ever opened.
#[derive(Default)]
pub struct MockConnector {
    opened: AtomicUsize,
    handles: Mutex<Vec<Arc<AtomicBool>>>,
}

impl MockConnector {
    /// Number of connections opened over the connector's lifetime.
    pub fn total_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of handles still reporting themselves open.
    pub fn open_handles(&self) -> usize {
        self.handles
            .lock()
            .unwrap()
            .iter()
            .filter(|open| open.load(Ordering::SeqCst))
            .count()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Conn = MockConn;

    async fn connect(&self) -> Result<MockConn, PoolError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let open = Arc::new(AtomicBool::new(true));
        self.handles.lock().unwrap().push(Arc::clone(&open));
        Ok(MockConn { open })
    }
}
