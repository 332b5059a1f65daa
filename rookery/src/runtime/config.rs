//! Configuration for an actor system and its worker pool.

use std::time::Duration;

/// Tunables for [`crate::runtime::system::ActorSystem`].
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// Human-readable system name. Generated from the framework index when
    /// not set.
    pub name: Option<String>,

    /// Number of worker threads in the pool.
    pub thread_count: usize,

    /// How long an idle worker parks before re-checking for shutdown.
    pub idle_wait: Duration,

    /// Prefix for worker thread names (`<prefix>-<id>`).
    pub worker_name_prefix: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            name: None,
            thread_count: num_cpus::get(),
            idle_wait: Duration::from_millis(10),
            worker_name_prefix: "worker".to_string(),
        }
    }
}
