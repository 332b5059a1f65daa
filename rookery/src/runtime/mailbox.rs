//! # Mailbox Module
//!
//! An addressable message queue plus the collection that owns all of them.
//! A mailbox is deliberately dumb: queue, index, timestamp. The guarantee
//! that it sits in the scheduler's ready set at most once at any instant is
//! established by the push/pop protocol around it (see the processor and
//! the system's send path), not by the mailbox itself.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::runtime::paged::PagedTable;
use crate::runtime::queue::MessageQueue;

/// Entries per mailbox page. Mailboxes are denser than directory entries,
/// so pages are larger.
const MAILBOXES_PER_PAGE: usize = 1024;

/// An addressable message queue that can receive messages.
///
/// Cache-line aligned so neighboring mailboxes processed by different
/// worker threads do not share a line.
#[repr(align(64))]
pub struct Mailbox {
    index: AtomicU32,
    queue: MessageQueue,
    timestamp: AtomicU64,
}

impl Mailbox {
    /// Index of this mailbox within the owning collection. Zero for a slot
    /// that is not currently allocated.
    pub fn index(&self) -> u32 {
        self.index.load(Ordering::Relaxed)
    }

    /// The mailbox's message queue.
    pub fn queue(&self) -> &MessageQueue {
        &self.queue
    }

    /// Scheduling timestamp, in nanoseconds since the owning system
    /// started. Used for measuring mailbox scheduling latencies.
    pub fn timestamp(&self) -> u64 {
        self.timestamp.load(Ordering::Relaxed)
    }

    pub fn set_timestamp(&self, nanos: u64) {
        self.timestamp.store(nanos, Ordering::Relaxed);
    }

    fn reset(&self, index: u32) {
        self.index.store(index, Ordering::Relaxed);
        self.timestamp.store(0, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn set_index_for_test(&self, index: u32) {
        self.index.store(index, Ordering::Relaxed);
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self {
            index: AtomicU32::new(0),
            queue: MessageQueue::new(),
            timestamp: AtomicU64::new(0),
        }
    }
}

/// A collection of addressable mailboxes.
///
/// The collection does not issue indices: the owning system's directory is
/// the index authority, and the collection materializes a mailbox at
/// whatever index it is handed. That keeps the actor directory and the
/// mailbox table on a single index space, which the processing protocol's
/// actor lookup depends on.
pub struct MailboxCollection {
    table: PagedTable<Mailbox, MAILBOXES_PER_PAGE>,
    mutex: Mutex<()>,
}

impl MailboxCollection {
    pub fn new() -> Self {
        Self {
            table: PagedTable::new(),
            mutex: Mutex::new(()),
        }
    }

    /// Allocates the mailbox with the given index.
    ///
    /// # Panics
    /// Panics on index 0.
    pub fn allocate_mailbox(&self, index: u32) {
        assert_ne!(index, 0, "allocate_mailbox on the null index");

        let _guard = self.mutex.lock();
        let mailbox = self.table.allocate_entry(index);
        mailbox.reset(index);
    }

    /// Frees the mailbox with the given index, dropping any undelivered
    /// envelopes. The backing page is never freed; the slot is recycled
    /// when the index is reissued. The index stamp survives the free so a
    /// ready-queue entry that outlives the mailbox still resolves to the
    /// right slot (the processor finds the queue drained and moves on).
    ///
    /// # Panics
    /// Panics on index 0.
    pub fn free_mailbox(&self, index: u32) {
        assert_ne!(index, 0, "free_mailbox on the null index");

        let _guard = self.mutex.lock();
        let mailbox = self.table.entry(index);
        mailbox.queue().lock().drain();
        mailbox.set_timestamp(0);
    }

    /// Gets the mailbox with the given index, which must have been
    /// previously allocated.
    ///
    /// # Panics
    /// Panics on index 0 and on an index whose page was never allocated.
    pub fn mailbox(&self, index: u32) -> &Mailbox {
        assert_ne!(index, 0, "mailbox lookup on the null index");
        self.table.entry(index)
    }

    /// Number of pages backing the mailbox table. Test instrumentation.
    #[cfg(test)]
    pub(crate) fn page_count(&self) -> usize {
        self.table.page_count()
    }
}

impl Default for MailboxCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rookery_api::{Address, Envelope};
    use std::sync::Arc;

    #[test]
    fn test_allocate_stamps_index() {
        let collection = MailboxCollection::new();
        collection.allocate_mailbox(1);
        collection.allocate_mailbox(2);

        assert_eq!(collection.mailbox(1).index(), 1);
        assert_eq!(collection.mailbox(2).index(), 2);
    }

    #[test]
    fn test_free_drains_pending_envelopes() {
        let collection = MailboxCollection::new();
        collection.allocate_mailbox(1);

        let envelope = Arc::new(Envelope::new(Address::new(1, 1), Box::new(42u32)));
        collection.mailbox(1).queue().lock().push(envelope.clone());

        collection.free_mailbox(1);

        // The collection's reference is gone; only ours remains.
        assert_eq!(Arc::strong_count(&envelope), 1);

        collection.allocate_mailbox(1);
        assert!(collection.mailbox(1).queue().lock().is_empty());
    }

    #[test]
    fn test_pages_grow_with_high_indices() {
        let collection = MailboxCollection::new();
        collection.allocate_mailbox(1);
        assert_eq!(collection.page_count(), 1);

        collection.allocate_mailbox(MAILBOXES_PER_PAGE as u32 + 5);
        assert_eq!(collection.page_count(), 2);
    }

    #[test]
    #[should_panic(expected = "null index")]
    fn test_zero_index_lookup_is_a_caller_bug() {
        MailboxCollection::new().mailbox(0);
    }
}
