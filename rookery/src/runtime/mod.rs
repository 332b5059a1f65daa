#![doc = " The concurrency core: registry, mailboxes and the processing protocol."]

pub mod config;
pub mod directory;
pub mod error;
pub mod fallback;
pub mod mailbox;
pub mod paged;
pub mod processor;
pub mod queue;
pub mod scheduler;
pub mod spin;
pub mod system;

// Re-export key types for easier usage
pub use config::SystemConfig;
pub use directory::{Directory, EntityRef};
pub use error::SystemError;
pub use fallback::FallbackHandlerCollection;
pub use mailbox::{Mailbox, MailboxCollection};
pub use paged::PagedTable;
pub use processor::WorkerContext;
pub use queue::MessageQueue;
pub use scheduler::{ReadyQueue, Scheduler, WorkerPool};
pub use system::{ActorSystem, LocalDelivery, ProcessDirectory};
