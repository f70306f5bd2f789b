//! Bounded "latest value wins" queue between the transport tasks and the
//! game loops.
//!
//! Producers never block: pushing into a full queue evicts the oldest
//! entry. Consumers either poll with [`LatestQueue::try_pop`], which never
//! waits, or await [`LatestQueue::pop`] from a dedicated task.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Debug)]
struct Slots<T> {
    items: VecDeque<T>,
    closed: bool,
}

#[derive(Debug)]
struct Inner<T> {
    slots: Mutex<Slots<T>>,
    notify: Notify,
    capacity: usize,
}

/// Cloning yields another handle to the same queue.
#[derive(Debug)]
pub struct LatestQueue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for LatestQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> LatestQueue<T> {
    /// A queue holding at most `capacity` values (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(Slots {
                    items: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                notify: Notify::new(),
                capacity,
            }),
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots<T>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `value`, evicting and returning the oldest entry when full.
    /// Values pushed after [`close`](Self::close) are dropped.
    pub fn push(&self, value: T) -> Option<T> {
        let evicted = {
            let mut slots = self.slots();
            if slots.closed {
                return None;
            }
            let evicted = if slots.items.len() >= self.inner.capacity {
                slots.items.pop_front()
            } else {
                None
            };
            slots.items.push_back(value);
            evicted
        };
        self.inner.notify.notify_one();
        evicted
    }

    pub fn try_pop(&self) -> Option<T> {
        self.slots().items.pop_front()
    }

    /// Waits for the next value. Returns `None` once the queue is closed
    /// and drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            let notified = self.inner.notify.notified();
            {
                let mut slots = self.slots();
                if let Some(value) = slots.items.pop_front() {
                    return Some(value);
                }
                if slots.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Wakes every waiting consumer and refuses further values.
    pub fn close(&self) {
        self.slots().closed = true;
        self.inner.notify.notify_waiters();
        self.inner.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.slots().closed
    }

    pub fn len(&self) -> usize {
        self.slots().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}
