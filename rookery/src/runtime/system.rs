//! # Actor System
//!
//! The top-level component tying the core together: it owns the actor
//! directory, the mailbox collection, the fallback collection and the
//! worker pool, and registers itself in a process-wide directory so other
//! systems (and receivers) in the same process can route messages to it.
//!
//! The process directory is dependency-injected rather than a process
//! global: whoever builds the runtime owns its lifetime, and several
//! independent systems can share one directory.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use tracing::{debug, info};

use rookery_api::address::{MAX_FRAMEWORKS, MAX_MAILBOXES};
use rookery_api::{Address, BoxedMessage, Entity, Envelope, FallbackHandler};

use crate::runtime::config::SystemConfig;
use crate::runtime::directory::Directory;
use crate::runtime::error::SystemError;
use crate::runtime::fallback::FallbackHandlerCollection;
use crate::runtime::mailbox::MailboxCollection;
use crate::runtime::scheduler::{ReadyQueue, Scheduler, WorkerPool};

/// A target registered in the process-wide directory: an actor system (a
/// framework) or a standalone receiver.
///
/// `deliver` is called while the caller holds the target's directory entry,
/// so the target cannot be deregistered mid-delivery. Implementations must
/// not send through the same process directory from inside `deliver` — the
/// entry lock is not reentrant.
pub trait LocalDelivery: Send + Sync {
    /// Delivers one envelope addressed into this target's index space.
    /// Returns `false` when the target cannot accept it.
    fn deliver(&self, envelope: Arc<Envelope>) -> bool;
}

/// The process-wide directory in which frameworks and receivers register.
pub type ProcessDirectory = Directory<dyn LocalDelivery>;

/// An actor system: one framework index, one mailbox collection, one
/// worker pool.
pub struct ActorSystem {
    name: OnceLock<String>,
    framework_index: AtomicU32,
    process_directory: Arc<ProcessDirectory>,
    actor_directory: Arc<Directory<dyn Entity>>,
    mailboxes: Arc<MailboxCollection>,
    fallbacks: Arc<FallbackHandlerCollection>,
    ready: Arc<ReadyQueue>,
    pool: WorkerPool,
    started_at: Instant,
    is_shutting_down: AtomicBool,
}

impl ActorSystem {
    /// Builds a system, registers it in the process directory and spawns
    /// its worker pool.
    pub fn new(
        process_directory: Arc<ProcessDirectory>,
        config: SystemConfig,
    ) -> Result<Arc<Self>, SystemError> {
        let actor_directory: Arc<Directory<dyn Entity>> = Arc::new(Directory::new());
        let mailboxes = Arc::new(MailboxCollection::new());
        let fallbacks = Arc::new(FallbackHandlerCollection::new());
        let ready = Arc::new(ReadyQueue::new());
        let started_at = Instant::now();

        let pool = WorkerPool::new(
            ready.clone(),
            actor_directory.clone(),
            mailboxes.clone(),
            fallbacks.clone(),
            started_at,
            &config,
        );

        let system = Arc::new(Self {
            name: OnceLock::new(),
            framework_index: AtomicU32::new(0),
            process_directory: process_directory.clone(),
            actor_directory,
            mailboxes,
            fallbacks,
            ready,
            pool,
            started_at,
            is_shutting_down: AtomicBool::new(false),
        });

        // Register the framework and get a non-zero index for it, unique
        // within the local process.
        let index = process_directory.register(system.clone());
        if index > MAX_FRAMEWORKS {
            process_directory.deregister(index);
            return Err(SystemError::RegistrationError(format!(
                "framework index {index} exceeds the address encoding"
            )));
        }
        system.framework_index.store(index, Ordering::SeqCst);

        // If the name wasn't set explicitly then generate a default one.
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| format!("framework-{index:08x}"));
        system.name.set(name.clone()).expect("name set once");

        if let Err(err) = system.pool.initialize(config.thread_count) {
            process_directory.deregister(index);
            return Err(err);
        }

        info!(
            name = %name,
            framework = index,
            threads = config.thread_count,
            "actor system started"
        );

        Ok(system)
    }

    /// The system's name.
    pub fn name(&self) -> &str {
        self.name.get().map(String::as_str).unwrap_or("")
    }

    /// The system's index in the process directory.
    pub fn framework_index(&self) -> u32 {
        self.framework_index.load(Ordering::SeqCst)
    }

    /// Number of worker threads serving this system.
    pub fn thread_count(&self) -> usize {
        self.pool.thread_count()
    }

    /// Installs the handler for messages whose target no longer exists.
    pub fn set_fallback_handler(&self, handler: Arc<dyn FallbackHandler>) {
        self.fallbacks.set_handler(handler);
    }

    /// Registers an actor: the directory issues the index, the collection
    /// materializes the mailbox at it, and the returned address packs the
    /// pair (framework index, mailbox index).
    pub fn register_actor(&self, actor: Arc<dyn Entity>) -> Result<Address, SystemError> {
        if self.is_shutting_down.load(Ordering::SeqCst) {
            return Err(SystemError::ShuttingDown);
        }

        let index = self.actor_directory.register(actor);
        if index > MAX_MAILBOXES {
            self.actor_directory.deregister(index);
            return Err(SystemError::RegistrationError(format!(
                "mailbox index {index} exceeds the address encoding"
            )));
        }
        self.mailboxes.allocate_mailbox(index);

        let address = Address::new(self.framework_index(), index);
        debug!(%address, "actor registered");
        Ok(address)
    }

    /// Deregisters an actor, so that the worker threads leave it alone.
    ///
    /// Does not return while a worker is mid-dispatch on this actor: the
    /// directory waits out the in-flight hold before clearing the entry.
    /// Undelivered messages still in the mailbox are dropped.
    ///
    /// # Panics
    /// Panics when the address does not belong to this system.
    pub fn deregister_actor(&self, address: Address) {
        assert_eq!(
            address.framework(),
            self.framework_index(),
            "deregister_actor on a foreign address"
        );

        let index = address.mailbox();
        self.actor_directory.deregister(index);
        self.mailboxes.free_mailbox(index);
        debug!(%address, "actor deregistered");
    }

    /// Sends a message. Returns `true` when a live target accepted it; on
    /// `false` the envelope has already been routed through the fallback
    /// collection.
    ///
    /// # Panics
    /// Panics on the null address.
    pub fn send(&self, to: Address, payload: BoxedMessage) -> bool {
        assert!(!to.is_null(), "send to the null address");

        let envelope = Arc::new(Envelope::new(to, payload));
        let delivered = self.deliver_within_process(envelope.clone());
        if !delivered {
            self.fallbacks.handle(&envelope);
        }
        delivered
    }

    /// Routes an envelope to its process-local target: a receiver, this
    /// system, or a sibling framework found through the process directory.
    fn deliver_within_process(&self, envelope: Arc<Envelope>) -> bool {
        let to = envelope.to();

        // Receiver addresses have a zero framework component and resolve
        // directly in the process directory.
        if to.is_receiver() {
            let held = self.process_directory.acquire(to.mailbox());
            return match held.entity() {
                Some(receiver) => receiver.deliver(envelope),
                None => false,
            };
        }

        if to.framework() == self.framework_index() {
            return self.deliver(envelope);
        }

        let held = self.process_directory.acquire(to.framework());
        match held.entity() {
            Some(framework) => framework.deliver(envelope),
            None => false,
        }
    }

    /// Deregisters the system from the process directory and stops the
    /// worker pool. Messages left in mailboxes are not processed.
    pub fn shutdown(&self) -> Result<(), SystemError> {
        if self.is_shutting_down.swap(true, Ordering::SeqCst) {
            return Err(SystemError::ShuttingDown);
        }

        self.process_directory.deregister(self.framework_index());
        self.pool.release();

        info!(name = %self.name(), "actor system stopped");
        Ok(())
    }
}

impl LocalDelivery for ActorSystem {
    fn deliver(&self, envelope: Arc<Envelope>) -> bool {
        let index = envelope.to().mailbox();
        let mailbox = self.mailboxes.mailbox(index);
        mailbox.set_timestamp(self.started_at.elapsed().as_nanos() as u64);

        // The push reports the empty-to-non-empty transition under the
        // queue lock; scheduling exactly then, mirrored by the processor's
        // pop-side check, keeps the mailbox in the ready set at most once.
        let was_empty = mailbox.queue().lock().push(envelope);
        if was_empty {
            self.ready.schedule(index);
        }
        true
    }
}
