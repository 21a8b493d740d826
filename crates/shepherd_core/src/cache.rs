//! Time-bounded cache for expensive derived views.
//!
//! # Responsibility
//! - Own the `(value, computed_at)` pair for a derived view and answer
//!   freshness questions against an explicit clock.
//!
//! # Invariants
//! - `invalidate` guarantees the next `get` misses, regardless of age.
//! - The freshness window is fixed at construction; call sites never carry
//!   their own staleness literals.

use std::time::{Duration, Instant};

/// Single-slot cache with a freshness window.
///
/// The clock is passed in by the caller, which keeps expiry behavior
/// deterministic under test.
#[derive(Debug)]
pub struct TtlCache<T> {
    slot: Option<(T, Instant)>,
    ttl: Duration,
}

impl<T> TtlCache<T> {
    /// Creates an empty cache with the given freshness window.
    pub fn new(ttl: Duration) -> Self {
        Self { slot: None, ttl }
    }

    /// Returns the cached value when it was computed within the freshness
    /// window relative to `now`; `None` on miss or expiry.
    pub fn get(&self, now: Instant) -> Option<&T> {
        match &self.slot {
            Some((value, computed_at)) if now.duration_since(*computed_at) < self.ttl => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Stores a freshly computed value and returns a reference to it.
    pub fn fill(&mut self, value: T, now: Instant) -> &T {
        let (value, _) = self.slot.insert((value, now));
        value
    }

    /// Drops the cached value so the next read recomputes.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}
