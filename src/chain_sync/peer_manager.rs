// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

/// Thread-safe set of open peer channels.
///
/// Each channel is represented by the sending half of an unbounded queue;
/// the task that owns the socket drains the queue into the wire. There is
/// no delivery guarantee and no queueing for peers that are not connected:
/// a broadcast reaches whoever is online right now.
#[derive(Default)]
pub struct PeerManager {
    channels: Mutex<HashMap<usize, mpsc::UnboundedSender<String>>>,
    next_id: AtomicUsize,
    /// Set by the first outbound channel that opens; that dial additionally
    /// performs the one-shot full-chain pull.
    bootstrapped: AtomicBool,
}

/// Handle for one registered channel, used to push replies back on the
/// same connection a request came in on.
pub struct PeerChannel {
    id: usize,
    sender: mpsc::UnboundedSender<String>,
}

impl PeerChannel {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn send(&self, payload: String) {
        // A send can only fail when the socket task already exited; the
        // channel is about to be unregistered, so the message is dropped
        // like any other missed delivery.
        let _ = self.sender.send(payload);
    }
}

impl PeerManager {
    /// Registers a new channel and returns its outbound queue.
    pub fn register(&self) -> (PeerChannel, mpsc::UnboundedReceiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.channels.lock().insert(id, sender.clone());
        debug!(peer = id, "peer channel opened");
        (PeerChannel { id, sender }, receiver)
    }

    pub fn unregister(&self, id: usize) {
        if self.channels.lock().remove(&id).is_some() {
            debug!(peer = id, "peer channel closed");
        }
    }

    /// Pushes the same payload to every currently open channel.
    pub fn broadcast(&self, payload: &str) {
        let mut channels = self.channels.lock();
        channels.retain(|_, sender| sender.send(payload.to_owned()).is_ok());
    }

    /// First-open election for the bootstrap chain pull: true exactly once.
    pub fn try_elect_bootstrap(&self) -> bool {
        self.bootstrapped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }

    /// Drops every channel sender, which ends the socket writer tasks.
    pub fn clear(&self) {
        self.channels.lock().clear();
    }
}
