//! Two actors exchanging a counter until it reaches a limit.
//!
//! Run with: cargo run --example ping_pong

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{mpsc, Arc, OnceLock};

use rookery::logging;
use rookery::runtime::{ActorSystem, ProcessDirectory, SystemConfig};
use rookery_api::{ActorError, Address, Entity, Envelope};

const ROUNDS: u32 = 1000;

struct Player {
    name: &'static str,
    system: Arc<ActorSystem>,
    peer: OnceLock<Address>,
    hits: AtomicU32,
    done: mpsc::Sender<&'static str>,
}

impl Entity for Player {
    fn process_message(&self, envelope: &Envelope) -> Result<(), ActorError> {
        let count = *envelope
            .payload_as::<u32>()
            .ok_or_else(|| ActorError::MessageHandlingError("expected a counter".into()))?;

        self.hits.fetch_add(1, Ordering::Relaxed);

        if count >= ROUNDS {
            let _ = self.done.send(self.name);
            return Ok(());
        }

        let peer = *self.peer.get().expect("peer address set before play");
        self.system.send(peer, Box::new(count + 1));
        Ok(())
    }
}

fn main() {
    logging::init_default();

    let directory: Arc<ProcessDirectory> = Arc::new(ProcessDirectory::new());
    let system = ActorSystem::new(directory, SystemConfig::default()).expect("system starts");

    let (done_tx, done_rx) = mpsc::channel();

    let ping = Arc::new(Player {
        name: "ping",
        system: system.clone(),
        peer: OnceLock::new(),
        hits: AtomicU32::new(0),
        done: done_tx.clone(),
    });
    let pong = Arc::new(Player {
        name: "pong",
        system: system.clone(),
        peer: OnceLock::new(),
        hits: AtomicU32::new(0),
        done: done_tx,
    });

    let ping_addr = system.register_actor(ping.clone()).expect("register ping");
    let pong_addr = system.register_actor(pong.clone()).expect("register pong");
    ping.peer.set(pong_addr).unwrap();
    pong.peer.set(ping_addr).unwrap();

    // Serve.
    system.send(ping_addr, Box::new(0u32));

    let winner = done_rx.recv().expect("a player finishes");
    println!(
        "{} finished after {} + {} hits",
        winner,
        ping.hits.load(Ordering::Relaxed),
        pong.hits.load(Ordering::Relaxed)
    );

    system.deregister_actor(ping_addr);
    system.deregister_actor(pong_addr);
    system.shutdown().expect("clean shutdown");
}
