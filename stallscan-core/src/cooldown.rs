//! Per-marker cooldown that absorbs detector flicker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::{DashMap, mapref::entry::Entry};
use stallscan_model::MarkerId;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Tracks when each marker was last admitted for processing.
///
/// A marker admitted at `t` is suppressed until `t + window`. The map is
/// checked lazily on every acquisition and swept every `sweep_every`
/// admissions, so no background timer is needed. Safe to share between
/// concurrent detections; each marker's timestamp is updated under its
/// shard lock.
#[derive(Debug)]
pub struct CooldownTracker {
    window: Duration,
    sweep_every: u64,
    last_processed: DashMap<MarkerId, Instant>,
    admissions: AtomicU64,
}

impl CooldownTracker {
    pub fn new(window: Duration, sweep_every: u64) -> Self {
        Self {
            window,
            sweep_every: sweep_every.max(1),
            last_processed: DashMap::new(),
            admissions: AtomicU64::new(0),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit `marker` unless it was admitted within the window.
    pub fn try_acquire(&self, marker: &MarkerId) -> bool {
        self.try_acquire_at(marker, Instant::now())
    }

    pub fn try_acquire_at(&self, marker: &MarkerId, now: Instant) -> bool {
        let admitted = match self.last_processed.entry(marker.clone()) {
            Entry::Occupied(mut entry) => {
                let since = now.saturating_duration_since(*entry.get());
                if since < self.window {
                    trace!(
                        "Cooldown active for {}: {:?} remaining",
                        marker,
                        self.window - since
                    );
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        };

        if admitted {
            let count = self.admissions.fetch_add(1, Ordering::Relaxed) + 1;
            if count % self.sweep_every == 0 {
                self.prune_at(now);
            }
        }
        admitted
    }

    /// Forget `marker` so its next detection is processed immediately.
    pub fn release(&self, marker: &MarkerId) {
        self.last_processed.remove(marker);
    }

    /// Drop every entry whose window has elapsed.
    pub fn prune_at(&self, now: Instant) -> usize {
        let before = self.last_processed.len();
        self.last_processed.retain(|_, admitted_at| {
            now.saturating_duration_since(*admitted_at) < self.window
        });
        let removed = before.saturating_sub(self.last_processed.len());
        if removed > 0 {
            debug!("Cooldown sweep removed {} expired markers", removed);
        }
        removed
    }

    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    pub fn clear(&self) {
        self.last_processed.clear();
    }

    /// Markers currently tracked, including expired ones not yet swept.
    pub fn tracked(&self) -> usize {
        self.last_processed.len()
    }
}
