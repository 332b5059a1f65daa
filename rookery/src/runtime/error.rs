//! Error types for the system glue layer.
//!
//! These cover administrative operations only: spawning workers, actor
//! registration, shutdown. The concurrency core itself surfaces no
//! recoverable errors — its precondition violations abort (see the assert
//! calls in the directory, queue and paged table), and a missing dispatch
//! target is an expected state handled by the fallback path.

use thiserror::Error;

/// Errors from the actor system's administrative surface.
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("Thread setup error: {0}")]
    ThreadSetupError(String),
    #[error("Actor system is already shutting down")]
    ShuttingDown,
    #[error("Registration error: {0}")]
    RegistrationError(String),
    #[error("Internal system error: {0}")]
    Other(#[from] anyhow::Error),
}
