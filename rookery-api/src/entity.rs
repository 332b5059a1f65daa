//! # Registered Entity Traits
//!
//! The directory registers entities: actors, frameworks and receivers all
//! implement [`Entity`]. The core looks an entity up by index during message
//! processing and hands it the front envelope; what the entity does with it
//! is entirely its own business.
//!
//! ## Design Principles
//! - Dispatch is opaque: the core never interprets payloads
//! - One message at a time: the processing protocol guarantees that a given
//!   entity's mailbox is drained by at most one worker concurrently, so
//!   implementations only need `&self` plus interior state
//! - Errors stay local: a handler error is reported, never propagated into
//!   the scheduling machinery

use crate::errors::ActorError;
use crate::message::Envelope;

/// A unit of behavior that can be registered in a directory and receive
/// messages through a mailbox.
pub trait Entity: Send + Sync {
    /// Handles one envelope. Called by a worker thread while the entity's
    /// directory entry is held, so the entity cannot be deregistered during
    /// the call.
    fn process_message(&self, envelope: &Envelope) -> Result<(), ActorError>;
}

/// Handler for messages whose target no longer exists.
///
/// When a worker finds no entity registered at a mailbox's index (the actor
/// was deregistered, or never existed), the envelope is routed here instead.
/// This is the expected path for messages that outlive their target, not an
/// error path.
pub trait FallbackHandler: Send + Sync {
    /// Handles one undeliverable envelope.
    fn handle(&self, envelope: &Envelope);
}
