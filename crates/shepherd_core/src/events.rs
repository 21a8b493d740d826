//! Invalidation bus for external observers.
//!
//! # Responsibility
//! - Broadcast a payload-free "directory changed" signal to UI subscribers
//!   so they re-read state (filter chips, tag pickers, note lists).
//!
//! # Invariants
//! - Publishing is fire-and-forget: a slow or dropped subscriber never
//!   blocks or fails a mutation.
//! - Subscribers must be idempotent; lost and duplicated signals are
//!   tolerated by contract.
//!
//! Internal cache invalidation is NOT routed through this bus; the engine
//! calls its caches directly.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

/// Payload-free change signal. Subscribers re-read whatever state they
/// render instead of receiving deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryChanged;

/// Single-topic publish/subscribe channel.
#[derive(Debug, Default)]
pub struct InvalidationBus {
    subscribers: Mutex<Vec<Sender<DirectoryChanged>>>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and returns its receiving end.
    ///
    /// Dropping the receiver unsubscribes; the dead sender is pruned on the
    /// next publish.
    pub fn subscribe(&self) -> Receiver<DirectoryChanged> {
        let (sender, receiver) = channel();
        self.lock_subscribers().push(sender);
        receiver
    }

    /// Broadcasts one signal to all live subscribers.
    pub fn publish(&self) {
        self.lock_subscribers()
            .retain(|sender| sender.send(DirectoryChanged).is_ok());
    }

    /// Number of live subscribers, for diagnostics.
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    // A poisoned lock only means a subscriber list mutation panicked; the
    // list itself is still usable, so recover instead of propagating.
    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Sender<DirectoryChanged>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
