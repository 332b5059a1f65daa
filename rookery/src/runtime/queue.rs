//! # Message Queue Module
//!
//! The lockable FIFO behind one mailbox. The lock is part of the public
//! surface on purpose: the processing protocol needs check-then-act
//! sequences (pop, then check emptiness, then decide whether to reschedule)
//! that must be atomic with respect to concurrent producer pushes, so all
//! queue operations live on the guard returned by [`MessageQueue::lock`].
//!
//! The queue's lock is independent of any directory-level lock; unrelated
//! mailboxes push and pop fully in parallel.

use std::collections::VecDeque;
use std::sync::Arc;

use rookery_api::Envelope;

use crate::runtime::spin::{SpinMutex, SpinMutexGuard};

struct Fifo {
    queue: VecDeque<Arc<Envelope>>,
    count: u32,
}

/// A lockable queue of message envelopes.
pub struct MessageQueue {
    inner: SpinMutex<Fifo>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            inner: SpinMutex::new(Fifo {
                queue: VecDeque::new(),
                count: 0,
            }),
        }
    }

    /// Locks the queue, acquiring exclusive access. Every operation on the
    /// returned guard happens under that one lock acquisition.
    pub fn lock(&self) -> QueueGuard<'_> {
        QueueGuard {
            inner: self.inner.lock(),
        }
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive access to a [`MessageQueue`].
pub struct QueueGuard<'a> {
    inner: SpinMutexGuard<'a, Fifo>,
}

impl QueueGuard<'_> {
    /// Appends an envelope.
    ///
    /// Returns `true` when this push made the queue non-empty — the
    /// transition producers must report to the scheduler.
    pub fn push(&mut self, envelope: Arc<Envelope>) -> bool {
        let was_empty = self.inner.count == 0;
        self.inner.queue.push_back(envelope);
        self.inner.count += 1;
        was_empty
    }

    /// Peeks at the first envelope without removing it.
    ///
    /// # Panics
    /// Panics when the queue is empty; the processing protocol never peeks
    /// at a mailbox it did not observe non-empty.
    pub fn front(&self) -> Arc<Envelope> {
        self.inner
            .queue
            .front()
            .expect("front on an empty message queue")
            .clone()
    }

    /// Pops the first envelope.
    ///
    /// # Panics
    /// Panics when the queue is empty.
    pub fn pop(&mut self) -> Arc<Envelope> {
        let envelope = self
            .inner
            .queue
            .pop_front()
            .expect("pop on an empty message queue");
        self.inner.count -= 1;
        envelope
    }

    /// True when the queue contains no envelopes.
    pub fn is_empty(&self) -> bool {
        self.inner.queue.is_empty()
    }

    /// Number of queued envelopes.
    pub fn count(&self) -> u32 {
        self.inner.count
    }

    /// Drops every queued envelope. Used when a mailbox is freed with
    /// undelivered messages still aboard.
    pub fn drain(&mut self) {
        self.inner.queue.clear();
        self.inner.count = 0;
    }
}
