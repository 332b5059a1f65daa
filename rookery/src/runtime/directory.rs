//! # Directory Module
//!
//! A registry mapping small non-zero integer indices to registered
//! entities, built on a [`PagedTable`]. The directory is what lets a worker
//! thread turn a mailbox index into the actor registered behind it, safely,
//! while other threads register and deregister at arbitrary times.
//!
//! ## Key Concepts
//! - Indices start at 1; 0 is reserved as the null index and never issued
//! - Freed indices return to a free list and may be reissued later
//! - Each entry carries its own spin lock; holding it pins the entry
//!
//! ## Thread Safety
//! Register/deregister are administrative and rare: they serialize on a
//! directory-wide blocking mutex. Acquire/release are frequent and O(1):
//! they touch only the entry's spin lock. Deregistration takes the entry
//! lock too, so it cannot complete while any acquire guard for that index
//! is live — that is the whole deregistration-safety story.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::runtime::paged::PagedTable;
use crate::runtime::spin::{SpinMutex, SpinMutexGuard};

/// Entries per directory page.
const ENTRIES_PER_PAGE: usize = 128;

/// One directory slot: the registered entity, or nothing.
struct Entry<E: ?Sized> {
    slot: SpinMutex<Option<Arc<E>>>,
}

impl<E: ?Sized> Default for Entry<E> {
    fn default() -> Self {
        Self {
            slot: SpinMutex::new(None),
        }
    }
}

/// Allocation state, guarded by the directory-wide mutex.
#[derive(Default)]
struct Allocation {
    next_index: u32,
    free_list: Vec<u32>,
}

/// A collection of registered entities, addressable by index.
///
/// `E` is the registered element type: the actor seam for a framework's
/// own directory, the local-delivery seam for the process-wide one.
pub struct Directory<E: ?Sized> {
    table: PagedTable<Entry<E>, ENTRIES_PER_PAGE>,
    allocation: Mutex<Allocation>,
}

impl<E: Send + Sync + ?Sized> Directory<E> {
    pub fn new() -> Self {
        Self {
            table: PagedTable::new(),
            allocation: Mutex::new(Allocation::default()),
        }
    }

    /// Registers an entity and returns its unique index.
    ///
    /// Takes a previously freed index if one is available, otherwise
    /// extends the table. The returned index is never zero.
    pub fn register(&self, entity: Arc<E>) -> u32 {
        let mut allocation = self.allocation.lock();

        let index = match allocation.free_list.pop() {
            Some(index) => index,
            None => {
                // Indices are offset by one to skip zero, which is
                // reserved for null.
                allocation.next_index += 1;
                let index = allocation.next_index;
                self.table.allocate_entry(index);
                index
            }
        };

        let entry = self.table.entry(index);
        *entry.slot.lock() = Some(entity);

        index
    }

    /// Deregisters a previously registered entity.
    ///
    /// If the entry is held by an outstanding [`acquire`](Self::acquire)
    /// guard, this waits for it to be released first, so an entity is
    /// never torn out from under a thread that is using it. The index
    /// becomes available for reuse by a later `register`.
    ///
    /// # Panics
    /// Panics on index 0.
    pub fn deregister(&self, index: u32) {
        assert_ne!(index, 0, "deregister on the null index");

        let mut allocation = self.allocation.lock();

        let entry = self.table.entry(index);
        *entry.slot.lock() = None;

        // Return the index to the free list for reuse.
        allocation.free_list.push(index);
    }

    /// Acquires shared access to the entity at `index`.
    ///
    /// The returned guard pins the entry: any attempt to deregister this
    /// index blocks until the guard is dropped. A guard over `None` means
    /// nothing is registered there — an expected state for a message that
    /// outlived its target, not an error.
    ///
    /// # Panics
    /// Panics on index 0 and on an index that was never allocated.
    pub fn acquire(&self, index: u32) -> EntityRef<'_, E> {
        assert_ne!(index, 0, "acquire on the null index");
        EntityRef {
            guard: self.table.entry(index).slot.lock(),
        }
    }

    /// Number of pages backing the entry table. Test instrumentation.
    #[cfg(test)]
    pub(crate) fn page_count(&self) -> usize {
        self.table.page_count()
    }
}

impl<E: Send + Sync + ?Sized> Default for Directory<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive hold on one directory entry.
///
/// Dropping the guard releases the entry, which is what allows a pending
/// deregistration of the same index to proceed.
pub struct EntityRef<'a, E: ?Sized> {
    guard: SpinMutexGuard<'a, Option<Arc<E>>>,
}

impl<E: ?Sized> EntityRef<'_, E> {
    /// The registered entity, if any.
    pub fn entity(&self) -> Option<&Arc<E>> {
        self.guard.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    struct Dummy;

    fn directory() -> Directory<Dummy> {
        Directory::new()
    }

    #[test]
    fn test_register_issues_small_indices_from_one() {
        let dir = directory();
        assert_eq!(dir.register(Arc::new(Dummy)), 1);
        assert_eq!(dir.register(Arc::new(Dummy)), 2);
        assert_eq!(dir.register(Arc::new(Dummy)), 3);
    }

    #[test]
    fn test_acquire_sees_registration_until_deregistered() {
        let dir = directory();
        let entity = Arc::new(Dummy);
        let index = dir.register(entity.clone());

        {
            let held = dir.acquire(index);
            let registered = held.entity().expect("entity registered");
            assert!(Arc::ptr_eq(registered, &entity));
        }

        dir.deregister(index);
        assert!(dir.acquire(index).entity().is_none());
    }

    #[test]
    fn test_freed_index_is_reused() {
        let dir = directory();
        let first = dir.register(Arc::new(Dummy));
        let second = dir.register(Arc::new(Dummy));
        assert_eq!((first, second), (1, 2));

        dir.deregister(first);

        // Free-list reuse: the freed index comes back before the counter
        // is extended.
        assert_eq!(dir.register(Arc::new(Dummy)), first);
        assert_eq!(dir.register(Arc::new(Dummy)), 3);
    }

    #[test]
    fn test_deregister_waits_for_outstanding_acquire() {
        let dir = Arc::new(directory());
        let index = dir.register(Arc::new(Dummy));

        let deregistered = Arc::new(AtomicBool::new(false));

        let held = dir.acquire(index);

        let worker = {
            let dir = dir.clone();
            let deregistered = deregistered.clone();
            thread::spawn(move || {
                dir.deregister(index);
                deregistered.store(true, Ordering::SeqCst);
            })
        };

        // The deregistering thread must stay blocked while the guard is
        // held.
        thread::sleep(Duration::from_millis(50));
        assert!(!deregistered.load(Ordering::SeqCst));

        drop(held);
        worker.join().unwrap();
        assert!(deregistered.load(Ordering::SeqCst));
        assert!(dir.acquire(index).entity().is_none());
    }

    #[test]
    #[should_panic(expected = "null index")]
    fn test_acquire_zero_is_a_caller_bug() {
        directory().acquire(0);
    }

    #[test]
    fn test_table_grows_past_one_page() {
        let dir = directory();
        for _ in 0..(ENTRIES_PER_PAGE as u32 + 1) {
            dir.register(Arc::new(Dummy));
        }
        assert!(dir.page_count() >= 2);
        assert!(dir.acquire(ENTRIES_PER_PAGE as u32 + 1).entity().is_some());
    }
}
