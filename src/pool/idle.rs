//! Bounded, fair registry of idle connection handles
//!
//! Handles waiting to be lent out live here. Takers that find the registry
//! empty park on a fair semaphore and are woken in arrival order as handles
//! are returned. The registry is bounded at pool capacity and rejects
//! offers past that bound instead of blocking the releasing caller.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::client::{Connection, PooledConn};

struct State<C> {
    slots: VecDeque<PooledConn<C>>,
    closed: bool,
}

/// Bounded FIFO queue of idle handles with fair blocking take.
///
/// Permits on `available` track queued handles: `offer` pushes then adds a
/// permit, takers acquire a permit then pop. Permits never exceed queued
/// handles, so a taker holding a permit always finds one except when the
/// registry was drained out from under it during shutdown.
pub(crate) struct IdleQueue<C> {
    state: Mutex<State<C>>,
    available: Semaphore,
    capacity: usize,
}

impl<C: Connection> IdleQueue<C> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(State {
                slots: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            available: Semaphore::new(0),
            capacity,
        }
    }

    /// Number of handles currently idle.
    pub(crate) fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    /// Non-blocking take of the oldest idle handle.
    pub(crate) fn try_take(&self) -> Option<PooledConn<C>> {
        match self.available.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.state.lock().slots.pop_front()
            }
            Err(_) => None,
        }
    }

    /// Take the oldest idle handle, waiting until one is offered.
    ///
    /// Waiters are served in FIFO order. Returns `None` once the registry
    /// has been closed, including for waiters already parked at that point.
    pub(crate) async fn take(&self) -> Option<PooledConn<C>> {
        match self.available.acquire().await {
            Ok(permit) => {
                permit.forget();
                self.state.lock().slots.pop_front()
            }
            Err(_) => None,
        }
    }

    /// Offer a handle back to the registry.
    ///
    /// Rejected (handle returned to the caller) when the registry is full
    /// or closed; the caller decides what to do with the excess handle.
    pub(crate) fn offer(&self, conn: PooledConn<C>) -> Result<(), PooledConn<C>> {
        {
            let mut state = self.state.lock();
            if state.closed || state.slots.len() >= self.capacity {
                return Err(conn);
            }
            state.slots.push_back(conn);
        }
        self.available.add_permits(1);
        Ok(())
    }

    /// Close the registry and remove every idle handle.
    ///
    /// Parked takers wake and observe `None`. Subsequent offers are
    /// rejected.
    pub(crate) fn close_and_drain(&self) -> Vec<PooledConn<C>> {
        let drained: Vec<_> = {
            let mut state = self.state.lock();
            state.closed = true;
            state.slots.drain(..).collect()
        };
        self.available.close();
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct FakeConn;

    #[async_trait]
    impl Connection for FakeConn {
        fn is_open(&self) -> bool {
            true
        }

        async fn close(&mut self) {}
    }

    fn handle(id: u64) -> PooledConn<FakeConn> {
        PooledConn::new(id, FakeConn)
    }

    #[test]
    fn try_take_on_empty_returns_none() {
        let queue: IdleQueue<FakeConn> = IdleQueue::new(4);
        assert!(queue.try_take().is_none());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn handles_come_back_in_fifo_order() {
        let queue = IdleQueue::new(4);
        for id in 1..=3 {
            queue.offer(handle(id)).ok().unwrap();
        }
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.try_take().unwrap().id(), 1);
        assert_eq!(queue.try_take().unwrap().id(), 2);
        assert_eq!(queue.try_take().unwrap().id(), 3);
        assert!(queue.try_take().is_none());
    }

    #[test]
    fn offer_rejects_past_capacity() {
        let queue = IdleQueue::new(2);
        assert!(queue.offer(handle(1)).is_ok());
        assert!(queue.offer(handle(2)).is_ok());

        let rejected = queue.offer(handle(3)).unwrap_err();
        assert_eq!(rejected.id(), 3);
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn take_waits_for_an_offer() {
        let queue = Arc::new(IdleQueue::new(2));

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.take().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.offer(handle(7)).ok().unwrap();

        let got = waiter.await.unwrap();
        assert_eq!(got.unwrap().id(), 7);
    }

    #[tokio::test]
    async fn close_wakes_parked_takers_empty_handed() {
        let queue: Arc<IdleQueue<FakeConn>> = Arc::new(IdleQueue::new(2));

        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.take().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        let drained = queue.close_and_drain();
        assert!(drained.is_empty());

        assert!(waiter.await.unwrap().is_none());
        assert!(queue.offer(handle(1)).is_err());
    }

    #[test]
    fn close_and_drain_returns_idle_handles() {
        let queue = IdleQueue::new(4);
        queue.offer(handle(1)).ok().unwrap();
        queue.offer(handle(2)).ok().unwrap();

        let drained = queue.close_and_drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(queue.len(), 0);
        assert!(queue.try_take().is_none());
    }
}
