//! Scheduling handoff under contention: producers and workers race on the
//! same mailbox, and the push/pop protocol must deliver every message
//! exactly once without ever letting two workers into one mailbox.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rookery::logging;
use rookery::runtime::{ActorSystem, ProcessDirectory, SystemConfig};
use rookery_api::{ActorError, Entity, Envelope};

/// Counts deliveries and asserts no two workers ever run it concurrently.
struct ExclusiveCounter {
    processed: AtomicUsize,
    busy: AtomicBool,
    overlap_seen: AtomicBool,
}

impl ExclusiveCounter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            processed: AtomicUsize::new(0),
            busy: AtomicBool::new(false),
            overlap_seen: AtomicBool::new(false),
        })
    }
}

impl Entity for ExclusiveCounter {
    fn process_message(&self, _envelope: &Envelope) -> Result<(), ActorError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlap_seen.store(true, Ordering::SeqCst);
        }
        // Widen the window a concurrent worker would have to hit.
        std::hint::spin_loop();
        self.processed.fetch_add(1, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_single_producer_drain_delivers_each_message_once() {
    logging::init_test();
    let directory: Arc<ProcessDirectory> = Arc::new(ProcessDirectory::new());
    let system = ActorSystem::new(
        directory,
        SystemConfig {
            thread_count: 4,
            ..Default::default()
        },
    )
    .unwrap();

    let actor = ExclusiveCounter::new();
    let address = system.register_actor(actor.clone()).unwrap();

    const MESSAGES: usize = 10_000;

    let producer = {
        let system = system.clone();
        thread::spawn(move || {
            for tag in 0..MESSAGES as u32 {
                assert!(system.send(address, Box::new(tag)));
            }
        })
    };
    producer.join().unwrap();

    assert!(wait_until(Duration::from_secs(10), || {
        actor.processed.load(Ordering::SeqCst) == MESSAGES
    }));
    assert_eq!(actor.processed.load(Ordering::SeqCst), MESSAGES);
    assert!(!actor.overlap_seen.load(Ordering::SeqCst));

    system.shutdown().unwrap();
}

#[test]
fn test_many_producers_many_mailboxes() {
    logging::init_test();
    let directory: Arc<ProcessDirectory> = Arc::new(ProcessDirectory::new());
    let system = ActorSystem::new(
        directory,
        SystemConfig {
            thread_count: 4,
            ..Default::default()
        },
    )
    .unwrap();

    const ACTORS: usize = 8;
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 500;

    let actors: Vec<_> = (0..ACTORS).map(|_| ExclusiveCounter::new()).collect();
    let addresses: Vec<_> = actors
        .iter()
        .map(|actor| system.register_actor(actor.clone()).unwrap())
        .collect();

    let mut producers = Vec::new();
    for producer_id in 0..PRODUCERS {
        let system = system.clone();
        let addresses = addresses.clone();
        producers.push(thread::spawn(move || {
            for step in 0..PER_PRODUCER {
                let target = addresses[(producer_id + step) % ACTORS];
                assert!(system.send(target, Box::new(step as u32)));
            }
        }));
    }
    for producer in producers {
        producer.join().unwrap();
    }

    let expected = PRODUCERS * PER_PRODUCER;
    assert!(wait_until(Duration::from_secs(10), || {
        actors
            .iter()
            .map(|actor| actor.processed.load(Ordering::SeqCst))
            .sum::<usize>()
            == expected
    }));

    for actor in &actors {
        assert!(!actor.overlap_seen.load(Ordering::SeqCst));
    }

    system.shutdown().unwrap();
}

#[test]
fn test_deregistration_waits_for_in_flight_dispatch() {
    struct Slow {
        entered: AtomicBool,
        finished: AtomicBool,
    }

    impl Entity for Slow {
        fn process_message(&self, _envelope: &Envelope) -> Result<(), ActorError> {
            self.entered.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(150));
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    logging::init_test();
    let directory: Arc<ProcessDirectory> = Arc::new(ProcessDirectory::new());
    let system = ActorSystem::new(
        directory,
        SystemConfig {
            thread_count: 2,
            ..Default::default()
        },
    )
    .unwrap();

    let actor = Arc::new(Slow {
        entered: AtomicBool::new(false),
        finished: AtomicBool::new(false),
    });
    let address = system.register_actor(actor.clone()).unwrap();

    system.send(address, Box::new(()));
    assert!(wait_until(Duration::from_secs(2), || {
        actor.entered.load(Ordering::SeqCst)
    }));

    // Deregistration must block until the worker releases the entry.
    system.deregister_actor(address);
    assert!(actor.finished.load(Ordering::SeqCst));

    system.shutdown().unwrap();
}
