//! # Worker Pool
//!
//! A fixed pool of OS worker threads that repeatedly draw a ready mailbox
//! index and run the mailbox processor against it to completion before
//! returning for another.
//!
//! ## Worker Thread Behavior
//! 1. Pop a ready mailbox index from the shared [`ReadyQueue`], parking
//!    briefly when idle
//! 2. Resolve the mailbox and run the processing protocol (steps 1–6)
//! 3. Repeat until the shutdown flag is observed
//!
//! Processing is synchronous and non-suspending: if an actor's handler
//! blocks, the worker thread blocks with it. The pool offers no preemption
//! or cancellation of an in-flight dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use rookery_api::Entity;

use crate::logging;
use crate::runtime::config::SystemConfig;
use crate::runtime::directory::Directory;
use crate::runtime::error::SystemError;
use crate::runtime::fallback::FallbackHandlerCollection;
use crate::runtime::mailbox::MailboxCollection;
use crate::runtime::processor::{self, WorkerContext};
use crate::runtime::scheduler::{ReadyQueue, Scheduler};

/// Everything a worker thread needs, shared across the pool.
struct PoolShared {
    ready: Arc<ReadyQueue>,
    directory: Arc<Directory<dyn Entity>>,
    mailboxes: Arc<MailboxCollection>,
    fallbacks: Arc<FallbackHandlerCollection>,
    is_shutting_down: AtomicBool,
    idle_wait: Duration,
    epoch: Instant,
}

/// A fixed pool of worker threads drawing from one ready queue.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_name_prefix: String,
}

impl WorkerPool {
    pub fn new(
        ready: Arc<ReadyQueue>,
        directory: Arc<Directory<dyn Entity>>,
        mailboxes: Arc<MailboxCollection>,
        fallbacks: Arc<FallbackHandlerCollection>,
        epoch: Instant,
        config: &SystemConfig,
    ) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                ready,
                directory,
                mailboxes,
                fallbacks,
                is_shutting_down: AtomicBool::new(false),
                idle_wait: config.idle_wait,
                epoch,
            }),
            workers: Mutex::new(Vec::new()),
            worker_name_prefix: config.worker_name_prefix.clone(),
        }
    }

    /// Spawns `thread_count` worker threads.
    pub fn initialize(&self, thread_count: usize) -> Result<(), SystemError> {
        let mut workers = self.workers.lock();

        for id in 0..thread_count {
            let shared = self.shared.clone();
            // Workers inherit the caller's tracing configuration.
            let dispatcher = logging::current_subscriber();

            let handle = std::thread::Builder::new()
                .name(format!("{}-{}", self.worker_name_prefix, id))
                .spawn(move || {
                    let _guard = tracing::dispatcher::set_default(&dispatcher);
                    Self::run_loop(shared, id);
                })
                .map_err(|err| SystemError::ThreadSetupError(err.to_string()))?;

            workers.push(handle);
        }

        Ok(())
    }

    fn run_loop(shared: Arc<PoolShared>, id: usize) {
        debug!(worker = id, "worker thread started");

        let context = WorkerContext::new(
            shared.directory.clone(),
            shared.fallbacks.clone(),
            shared.ready.clone(),
            shared.epoch,
        );

        while !shared.is_shutting_down.load(Ordering::Relaxed) {
            if let Some(index) = shared.ready.pop_timeout(shared.idle_wait) {
                let mailbox = shared.mailboxes.mailbox(index);
                processor::process(&context, mailbox);
            }
        }

        debug!(worker = id, "worker thread stopped");
    }

    /// Flags shutdown, wakes every parked worker and joins them. Ready
    /// entries still queued at this point are abandoned.
    pub fn release(&self) {
        self.shared.is_shutting_down.store(true, Ordering::SeqCst);
        self.shared.ready.notify_all();

        for handle in self.workers.lock().drain(..) {
            let _ = handle.join();
        }
    }

    /// Number of live worker threads.
    pub fn thread_count(&self) -> usize {
        self.workers.lock().len()
    }
}

impl Scheduler for WorkerPool {
    fn schedule(&self, index: u32) {
        self.shared.ready.push(index);
    }
}
