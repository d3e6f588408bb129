//! Session-scoped memo of the active event record.

use std::sync::{
    PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

use stallscan_model::{Event, EventId};
use tokio::time::Instant;
use tracing::debug;

/// The event held by the cache together with when it was fetched.
#[derive(Debug, Clone)]
pub struct CachedEvent {
    pub event: Event,
    pub fetched_at: Instant,
}

/// Hit/miss counters for a cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Single-slot cache keyed by event id.
///
/// One instance lives for one scan session. The slot is only replaced by a
/// successful fetch or cleared when the active event changes; there is no
/// time-based expiry because event metadata is stable for a session.
#[derive(Debug, Default)]
pub struct EventCache {
    slot: RwLock<Option<CachedEvent>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-through lookup; counts towards hit/miss statistics.
    pub fn get(&self, event_id: &EventId) -> Option<Event> {
        let found = self.peek(event_id);
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Event cache HIT: {}", event_id);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Event cache MISS: {}", event_id);
        }
        found
    }

    /// Lookup without touching the statistics.
    pub fn peek(&self, event_id: &EventId) -> Option<Event> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|cached| &cached.event.id == event_id)
            .map(|cached| cached.event.clone())
    }

    pub fn store(&self, event: Event) {
        let mut slot =
            self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(CachedEvent {
            event,
            fetched_at: Instant::now(),
        });
    }

    pub fn invalidate(&self) {
        let mut slot =
            self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            debug!("Event cache invalidated: {}", previous.event.id);
        }
    }

    pub fn current(&self) -> Option<CachedEvent> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
