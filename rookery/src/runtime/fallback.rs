//! # Fallback Handler Collection
//!
//! The designated destination for messages whose target no longer exists.
//! Workers route an envelope here when the directory has nothing registered
//! at the mailbox's index — the actor was deregistered while the message
//! was in flight, or never existed. From the core's perspective this path
//! always succeeds; what the handler does with the message is its business.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

use rookery_api::{Envelope, FallbackHandler};

/// Holds the registered fallback handler, with a logging default.
pub struct FallbackHandlerCollection {
    handler: RwLock<Option<Arc<dyn FallbackHandler>>>,
}

impl FallbackHandlerCollection {
    pub fn new() -> Self {
        Self {
            handler: RwLock::new(None),
        }
    }

    /// Installs a handler, replacing any previous one.
    pub fn set_handler(&self, handler: Arc<dyn FallbackHandler>) {
        *self.handler.write() = Some(handler);
    }

    /// Removes the installed handler, reverting to the logging default.
    pub fn clear_handler(&self) {
        *self.handler.write() = None;
    }

    /// Routes one undeliverable envelope.
    pub fn handle(&self, envelope: &Envelope) {
        let handler = self.handler.read().clone();
        match handler {
            Some(handler) => handler.handle(envelope),
            None => {
                // Undelivered messages are reported, not silently dropped.
                warn!(to = %envelope.to(), "message undelivered: no entity registered at target");
            }
        }
    }
}

impl Default for FallbackHandlerCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rookery_api::Address;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        seen: AtomicUsize,
    }

    impl FallbackHandler for Counting {
        fn handle(&self, _envelope: &Envelope) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_installed_handler_receives_envelopes() {
        let collection = FallbackHandlerCollection::new();
        let counting = Arc::new(Counting {
            seen: AtomicUsize::new(0),
        });
        collection.set_handler(counting.clone());

        let envelope = Envelope::new(Address::new(1, 3), Box::new(()));
        collection.handle(&envelope);
        collection.handle(&envelope);

        assert_eq!(counting.seen.load(Ordering::SeqCst), 2);

        collection.clear_handler();
        collection.handle(&envelope);
        assert_eq!(counting.seen.load(Ordering::SeqCst), 2);
    }
}
