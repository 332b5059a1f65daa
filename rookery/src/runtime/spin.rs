//! # Spin Lock Module
//!
//! Busy-wait mutual exclusion for the critical sections that are provably
//! O(1): a directory entry's pointer read/write and a mailbox queue's
//! push/pop. For those, spinning beats parking — the hold times are a few
//! loads and stores, so a blocked thread is better off burning a handful of
//! cycles than taking a trip through the OS scheduler.
//!
//! ## Key Concepts
//! - `SpinMutex<T>`: a data-carrying spin lock with an RAII guard
//! - `Backoff`: bounded exponential spinning that degrades to yielding
//!
//! Administrative locks with longer or unbounded critical sections (the
//! directory-wide register/deregister lock, the mailbox collection lock)
//! use a blocking mutex instead; see the callers.

use std::cell::UnsafeCell;
use std::hint;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Number of doubling rounds of `spin_loop` hints before a waiter starts
/// yielding its timeslice.
const SPIN_LIMIT: u32 = 6;

/// Exponential backoff for contended spin waits.
///
/// Each `wait` spins twice as long as the previous one; once the budget is
/// exhausted it yields to the OS scheduler instead, so a waiter stuck
/// behind a descheduled lock holder does not monopolize a core.
pub struct Backoff {
    step: u32,
}

impl Backoff {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Waits one round, escalating from spinning to yielding.
    pub fn wait(&mut self) {
        if self.step <= SPIN_LIMIT {
            for _ in 0..(1u32 << self.step) {
                hint::spin_loop();
            }
            self.step += 1;
        } else {
            thread::yield_now();
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// A spin lock protecting a value of type `T`.
///
/// # Thread Safety
/// - `lock` returns an RAII guard; the lock is released on guard drop
/// - Acquire/Release orderings pair the unlock store with the lock loop,
///   so writes made under the guard are visible to the next holder
///
/// # Performance Characteristics
/// - Uncontended lock/unlock is a single compare-exchange plus a store
/// - Contended waiters spin on a plain load (no cache-line ping-pong from
///   failed compare-exchanges) with [`Backoff`] between probes
pub struct SpinMutex<T> {
    locked: AtomicBool,
    value: UnsafeCell<T>,
}

// SAFETY: the lock serializes all access to `value`, so sharing the mutex
// across threads is sound whenever the value itself can be sent.
unsafe impl<T: Send> Send for SpinMutex<T> {}
unsafe impl<T: Send> Sync for SpinMutex<T> {}

impl<T> SpinMutex<T> {
    pub const fn new(value: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock, spinning until it is free.
    pub fn lock(&self) -> SpinMutexGuard<'_, T> {
        let mut backoff = Backoff::new();
        loop {
            if self
                .locked
                .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return SpinMutexGuard { lock: self };
            }
            while self.locked.load(Ordering::Relaxed) {
                backoff.wait();
            }
        }
    }

    /// Acquires the lock only if it is free right now.
    pub fn try_lock(&self) -> Option<SpinMutexGuard<'_, T>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinMutexGuard { lock: self })
        } else {
            None
        }
    }
}

impl<T: Default> Default for SpinMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// RAII guard for [`SpinMutex`]. Releases the lock when dropped.
pub struct SpinMutexGuard<'a, T> {
    lock: &'a SpinMutex<T>,
}

impl<T> Deref for SpinMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard holds the lock, so access is exclusive.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for SpinMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard holds the lock, so access is exclusive.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for SpinMutexGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_serializes_increments() {
        let mutex = Arc::new(SpinMutex::new(0u64));
        let mut handles = Vec::new();

        for _ in 0..4 {
            let mutex = mutex.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    *mutex.lock() += 1;
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*mutex.lock(), 40_000);
    }

    #[test]
    fn test_try_lock_fails_while_held() {
        let mutex = SpinMutex::new(());
        let guard = mutex.lock();
        assert!(mutex.try_lock().is_none());
        drop(guard);
        assert!(mutex.try_lock().is_some());
    }
}
