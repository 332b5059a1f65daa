//! # Actor Error Types
//!
//! Errors an entity can report from its message handler. These cross the
//! dispatch seam only: the concurrency core logs them and moves on, it never
//! converts them into scheduling decisions.
//!
//! Precondition violations inside the core (a zero index, a pop from an
//! empty queue) are deliberately *not* represented here. Those are caller
//! bugs and abort via panic rather than travelling as values.

use thiserror::Error;

/// Error reported by an entity's message handler.
#[derive(Error, Debug)]
pub enum ActorError {
    /// The handler could not process the message.
    #[error("Message handling failed: {0}")]
    MessageHandlingError(String),

    /// The entity has already stopped and will not accept further work.
    #[error("Entity stopped")]
    Stopped,

    /// The handler gave up waiting on something it depends on.
    #[error("Timeout")]
    Timeout,

    /// Any other handler-internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}
