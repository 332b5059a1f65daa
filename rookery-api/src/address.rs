//! # Mailbox Address Module
//!
//! ## Key Concepts
//! - Address: a packed 32-bit mailbox address, unique within the process
//! - Framework component: identifies the owning actor system
//! - Mailbox component: identifies the mailbox within that system
//!
//! ## Design Principles
//! - Copy semantics: addresses are plain values and free to pass around
//! - Reserved zero: the all-zero address is the null address and is never
//!   issued for a live mailbox
//!
//! ## Architecture
//! An address is the pair (framework index, mailbox index) packed into one
//! `u32`. A framework component of zero denotes a receiver target: an entity
//! registered directly in the process-wide directory rather than hosted in a
//! framework's mailbox collection.

use std::fmt;

/// Number of bits reserved for the framework component.
pub const FRAMEWORK_BITS: u32 = 12;

/// Number of bits reserved for the mailbox component.
pub const MAILBOX_BITS: u32 = 20;

/// Largest framework index an address can carry.
pub const MAX_FRAMEWORKS: u32 = (1 << FRAMEWORK_BITS) - 1;

/// Largest mailbox index an address can carry.
pub const MAX_MAILBOXES: u32 = (1 << MAILBOX_BITS) - 1;

/// A packed mailbox address.
///
/// The framework component occupies the upper [`FRAMEWORK_BITS`] bits and
/// the mailbox component the lower [`MAILBOX_BITS`] bits.
///
/// # Examples
/// ```rust
/// use rookery_api::address::Address;
///
/// let addr = Address::new(3, 17);
/// assert_eq!(addr.framework(), 3);
/// assert_eq!(addr.mailbox(), 17);
/// assert!(!addr.is_receiver());
///
/// let receiver = Address::new(0, 17);
/// assert!(receiver.is_receiver());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(u32);

impl Address {
    /// The null address. Never issued for a live mailbox.
    pub const NULL: Address = Address(0);

    /// Packs a framework index and a mailbox index into an address.
    ///
    /// # Panics
    /// Panics if either component exceeds its bit range.
    pub fn new(framework: u32, mailbox: u32) -> Self {
        assert!(framework <= MAX_FRAMEWORKS, "framework index out of range: {framework}");
        assert!(mailbox <= MAX_MAILBOXES, "mailbox index out of range: {mailbox}");
        Address((framework << MAILBOX_BITS) | mailbox)
    }

    /// Reconstructs an address from its raw packed form.
    pub fn from_raw(raw: u32) -> Self {
        Address(raw)
    }

    /// Returns the raw packed form.
    pub fn to_raw(self) -> u32 {
        self.0
    }

    /// Returns the framework component.
    pub fn framework(self) -> u32 {
        self.0 >> MAILBOX_BITS
    }

    /// Returns the mailbox component.
    pub fn mailbox(self) -> u32 {
        self.0 & MAX_MAILBOXES
    }

    /// True for the reserved all-zero address.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// True when the target is a receiver registered in the process
    /// directory rather than a framework-hosted mailbox.
    pub fn is_receiver(self) -> bool {
        self.framework() == 0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Address")
            .field("framework", &self.framework())
            .field("mailbox", &self.mailbox())
            .finish()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.framework(), self.mailbox())
    }
}
