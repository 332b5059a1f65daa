// Rookery Actor Runtime Core
//
// This crate implements the concurrency core of a thread-based actor
// runtime: a paged registry, per-actor mailboxes with a strict locking
// discipline, and the worker-side processing protocol that guarantees
// at-most-one concurrent processing of any mailbox.

pub mod logging;
pub mod runtime;

// Re-export commonly used types
pub use runtime::{ActorSystem, ProcessDirectory, SystemConfig, SystemError};
pub use rookery_api::{Address, ActorError, BoxedMessage, Entity, Envelope, FallbackHandler};
