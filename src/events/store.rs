//! Fixed-capacity FIFO history of recent detection events.
//!
//! The store is the only owner of raw events. Readers get owned snapshots,
//! so iterating a snapshot is never affected by later pushes.

use crate::events::types::DetectionEvent;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default number of events retained.
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded, insertion-ordered event history.
#[derive(Debug)]
pub struct EventStore {
    capacity: usize,
    events: Mutex<VecDeque<DetectionEvent>>,
}

impl EventStore {
    /// Create an empty store holding at most `capacity` events.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append an event, evicting and returning the oldest one when full.
    pub fn push(&self, event: DetectionEvent) -> Option<DetectionEvent> {
        let mut events = self.lock();
        let evicted = if events.len() >= self.capacity {
            events.pop_front()
        } else {
            None
        };
        events.push_back(event);
        evicted
    }

    /// Owned copy of the history, oldest first.
    pub fn snapshot(&self) -> Vec<DetectionEvent> {
        self.lock().iter().cloned().collect()
    }

    /// Most recently pushed event.
    pub fn latest(&self) -> Option<DetectionEvent> {
        self.lock().back().cloned()
    }

    /// Drop every stored event.
    pub fn reset(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<DetectionEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Store handle shared by the producers.
pub type SharedEventStore = Arc<EventStore>;

/// Create a new shared store.
pub fn create_shared_store(capacity: usize) -> SharedEventStore {
    Arc::new(EventStore::new(capacity))
}
