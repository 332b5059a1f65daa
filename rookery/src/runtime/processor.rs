//! # Mailbox Processor
//!
//! The protocol a worker thread runs against one ready mailbox. This is
//! where the runtime's central promises are kept: an actor is never
//! deregistered mid-dispatch, a mailbox is never drained by two workers at
//! once, and the reschedule decision can neither duplicate an enqueue nor
//! lose a wakeup.
//!
//! ## Core Algorithm
//! 1. Acquire the actor registered at the mailbox's index — the directory
//!    hold blocks deregistration until step 5
//! 2. Peek the front envelope under the queue lock, without removing it
//! 3. Dispatch to the actor, or to the fallback collection if nothing is
//!    registered — exactly one of the two
//! 4. Pop, check emptiness and decide on rescheduling under a single queue
//!    lock acquisition, so the decision is atomic against producer pushes
//! 5. Release the actor
//! 6. Drop the envelope — the queue's reference went at step 4, so this is
//!    the single point of destruction, on both dispatch paths
//!
//! ## Safety Considerations
//! The message stays in the queue during dispatch (step 2 peeks, step 4
//! pops). Producers therefore observe the queue as non-empty for the whole
//! dispatch and never re-schedule a mailbox that is already being worked.

use std::cell::Cell;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, trace};

use rookery_api::Entity;

use crate::runtime::directory::Directory;
use crate::runtime::fallback::FallbackHandlerCollection;
use crate::runtime::mailbox::Mailbox;
use crate::runtime::scheduler::Scheduler;

/// Per-worker-thread context: the shared services a worker needs to process
/// mailboxes, plus a slot recording the mailbox currently being processed.
///
/// A context belongs to exactly one worker thread; no other thread writes
/// into it.
pub struct WorkerContext {
    directory: Arc<Directory<dyn Entity>>,
    fallbacks: Arc<FallbackHandlerCollection>,
    scheduler: Arc<dyn Scheduler>,
    epoch: Instant,
    current_mailbox: Cell<u32>,
}

impl WorkerContext {
    pub fn new(
        directory: Arc<Directory<dyn Entity>>,
        fallbacks: Arc<FallbackHandlerCollection>,
        scheduler: Arc<dyn Scheduler>,
        epoch: Instant,
    ) -> Self {
        Self {
            directory,
            fallbacks,
            scheduler,
            epoch,
            current_mailbox: Cell::new(0),
        }
    }

    /// Index of the mailbox this worker is processing right now, or zero
    /// between mailboxes. Supports introspective lookups during dispatch.
    pub fn current_mailbox(&self) -> u32 {
        self.current_mailbox.get()
    }
}

/// Processes one ready mailbox: dispatches its front message and decides,
/// atomically with respect to producers, whether the mailbox goes back to
/// the scheduler.
pub fn process(worker: &WorkerContext, mailbox: &Mailbox) {
    let index = mailbox.index();
    worker.current_mailbox.set(index);

    // Acquire exclusive access to the registered actor, blocking any
    // concurrent deregistration of this index until released below.
    let held = worker.directory.acquire(index);

    // Peek the first queued message. The mailbox is in no other work item
    // right now, even if it holds several messages, so no other worker can
    // pop underneath us. An empty queue means the mailbox was freed with
    // this work item still enqueued; nothing to do.
    let envelope = {
        let queue = mailbox.queue().lock();
        if queue.is_empty() {
            worker.current_mailbox.set(0);
            return;
        }
        queue.front()
    };

    trace!(
        index,
        queued_ns =
            (worker.epoch.elapsed().as_nanos() as u64).saturating_sub(mailbox.timestamp()),
        "processing mailbox"
    );

    // Dispatch to the registered actor, or to the fallback collection for
    // a message that outlived its target.
    match held.entity() {
        Some(actor) => {
            if let Err(err) = actor.process_message(&envelope) {
                error!(index, error = %err, "actor failed to process message");
            }
        }
        None => worker.fallbacks.handle(&envelope),
    }

    // Pop the message we just processed, then reschedule the mailbox if it
    // is not yet empty. Doing both under one lock acquisition, mirrored by
    // the producer side, keeps the mailbox enqueued whenever it has
    // unprocessed messages but at most once at any time.
    {
        let mut queue = mailbox.queue().lock();
        let popped = queue.pop();
        debug_assert!(Arc::ptr_eq(&popped, &envelope));
        if !queue.is_empty() {
            worker.scheduler.schedule(index);
        }
    }

    drop(held);
    worker.current_mailbox.set(0);

    // The queue's reference was popped above, so the envelope is destroyed
    // here, after the pop, whichever dispatch path ran.
    drop(envelope);
}
