use crate::errors::ActorError;
use std::any::Any;

// Type aliases for common types
pub type BoxedMessage = Box<dyn Any + Send + Sync>;
pub type ActorResult<T> = Result<T, ActorError>;
