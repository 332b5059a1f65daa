//! # Paged Table Module
//!
//! Append-only, page-allocated storage that hands out stable references for
//! demand-allocated slots. The table underlies both the directory (entries)
//! and the mailbox collection (mailboxes): components that need an index to
//! keep pointing at the same physical slot for the life of the table, while
//! other threads grow it concurrently.
//!
//! ## Key Concepts
//! - Page *k* holds indices `[k*P, (k+1)*P)` for `P` entries per page
//! - Pages are allocated lazily, on first allocation of an index they
//!   contain, and freed only when the whole table is dropped
//! - Growth never moves or invalidates existing slots
//!
//! ## Thread Safety
//! The page spine is a fixed array of lazily initialized pages, so readers
//! take no table-wide lock: `entry` is a pair of array indexings once the
//! page exists. Logical reuse of a slot's content (directory free lists,
//! mailbox recycling) is the owner's concern and is distinct from physical
//! page lifetime.

use std::sync::OnceLock;

/// Upper bound on the number of pages a table can grow to. Exceeding it is
/// resource exhaustion and fatal: the table cannot hand out storage, and
/// callers cannot proceed safely without it.
pub const MAX_PAGES: usize = 1024;

/// A paged table of entries, with the pages created on demand.
pub struct PagedTable<T, const P: usize> {
    pages: Box<[OnceLock<Box<[T]>>]>,
}

impl<T: Default, const P: usize> PagedTable<T, P> {
    /// Creates the table with the first page pre-allocated, so the lowest
    /// indices are always backed.
    pub fn new() -> Self {
        let mut pages = Vec::with_capacity(MAX_PAGES);
        pages.resize_with(MAX_PAGES, OnceLock::new);
        let table = Self {
            pages: pages.into_boxed_slice(),
        };
        table.pages[0].get_or_init(Self::new_page);
        table
    }

    /// Returns storage for `index`, constructing every page up to and
    /// including the one containing it.
    ///
    /// Idempotent for already-present pages; the returned reference stays
    /// valid across any later growth.
    ///
    /// # Panics
    /// Panics if `index` lies beyond the table's page budget.
    pub fn allocate_entry(&self, index: u32) -> &T {
        let page_index = index as usize / P;
        assert!(
            page_index < self.pages.len(),
            "paged table exhausted: index {} needs page {} of {}",
            index,
            page_index,
            self.pages.len()
        );

        for page in &self.pages[..=page_index] {
            page.get_or_init(Self::new_page);
        }

        &self.pages[page_index].get().expect("page just initialized")[index as usize % P]
    }

    /// Returns storage for a previously allocated `index`.
    ///
    /// # Panics
    /// Panics if the index was never allocated. That is a caller bug, not a
    /// runtime condition.
    pub fn entry(&self, index: u32) -> &T {
        let page_index = index as usize / P;
        let page = self
            .pages
            .get(page_index)
            .and_then(|page| page.get())
            .expect("paged table entry accessed before allocation");
        &page[index as usize % P]
    }

    /// Number of pages currently allocated.
    pub fn page_count(&self) -> usize {
        self.pages.iter().filter(|page| page.get().is_some()).count()
    }

    fn new_page() -> Box<[T]> {
        let mut slots = Vec::with_capacity(P);
        slots.resize_with(P, T::default);
        slots.into_boxed_slice()
    }
}

impl<T: Default, const P: usize> Default for PagedTable<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: usize = 8;

    #[test]
    fn test_growth_creates_expected_pages() {
        let table: PagedTable<u32, P> = PagedTable::new();
        assert_eq!(table.page_count(), 1);

        for index in [0, P as u32 - 1, P as u32, 2 * P as u32 - 1, 2 * P as u32] {
            table.allocate_entry(index);
        }
        assert_eq!(table.page_count(), 3);
    }

    #[test]
    fn test_slots_stable_across_growth() {
        let table: PagedTable<u32, P> = PagedTable::new();
        let first = table.allocate_entry(3) as *const u32;
        let second = table.allocate_entry(P as u32 + 1) as *const u32;

        // Grow well past both slots, then re-resolve them.
        table.allocate_entry(64 * P as u32);

        assert_eq!(table.entry(3) as *const u32, first);
        assert_eq!(table.entry(P as u32 + 1) as *const u32, second);
    }

    #[test]
    fn test_allocate_fills_intermediate_pages() {
        let table: PagedTable<u32, P> = PagedTable::new();
        table.allocate_entry(3 * P as u32);
        assert_eq!(table.page_count(), 4);
    }

    #[test]
    #[should_panic(expected = "before allocation")]
    fn test_entry_requires_prior_allocation() {
        let table: PagedTable<u32, P> = PagedTable::new();
        table.entry(5 * P as u32);
    }
}
