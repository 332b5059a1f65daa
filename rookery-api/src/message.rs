//! # Message Envelope Module
//!
//! This module defines the envelope carried through mailboxes. An envelope
//! is an opaque, independently allocated unit of data with a single logical
//! owner at any time: the queue that holds it, then the worker that popped
//! it. The payload is type-erased; the core never inspects it.

use crate::address::Address;
use crate::types::BoxedMessage;
use std::any::Any;
use std::fmt;

/// A queued message: the destination address plus a type-erased payload.
pub struct Envelope {
    to: Address,
    payload: BoxedMessage,
}

impl Envelope {
    /// Wraps a payload for delivery to `to`.
    pub fn new(to: Address, payload: BoxedMessage) -> Self {
        Self { to, payload }
    }

    /// The destination address this envelope was sent to.
    pub fn to(&self) -> Address {
        self.to
    }

    /// Borrows the type-erased payload.
    pub fn payload(&self) -> &(dyn Any + Send + Sync) {
        self.payload.as_ref()
    }

    /// Borrows the payload as a concrete type, if it is one.
    pub fn payload_as<T: 'static>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("to", &self.to)
            .field("payload", &"<boxed-message>")
            .finish()
    }
}
