use std::{
    path::Path,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stallscan_model::{Event, EventId, MarkerId, Stall};
use tokio::sync::RwLock;
use tracing::debug;

use super::RecordStore;
use crate::error::{Result, StoreError};

/// On-disk layout of a store fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFixture {
    #[serde(default)]
    pub stalls: Vec<Stall>,
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Number of queries each collection has served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchCounts {
    pub stalls: u64,
    pub events: u64,
}

/// Map-backed [`RecordStore`] used for fixtures, demos and tests.
///
/// The store can be switched offline to behave like an unreachable
/// backend, and can add an artificial delay to every query.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    stalls: RwLock<Vec<Stall>>,
    events: RwLock<Vec<Event>>,
    offline: AtomicBool,
    latency: Option<Duration>,
    stall_fetches: AtomicU64,
    event_fetches: AtomicU64,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: StoreFixture) -> Self {
        Self {
            stalls: RwLock::new(fixture.stalls),
            events: RwLock::new(fixture.events),
            ..Self::default()
        }
    }

    pub fn from_fixture_str(raw: &str) -> Result<Self> {
        let fixture: StoreFixture = serde_json::from_str(raw)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn from_fixture_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            StoreError::Fixture {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let store = Self::from_fixture_str(&raw)?;
        debug!("Loaded record store fixture from {}", path.display());
        Ok(store)
    }

    /// Delay every query by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn insert_stall(&self, stall: Stall) {
        self.stalls.write().await.push(stall);
    }

    pub async fn insert_event(&self, event: Event) {
        let mut events = self.events.write().await;
        events.retain(|existing| existing.id != event.id);
        events.push(event);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fetch_counts(&self) -> FetchCounts {
        FetchCounts {
            stalls: self.stall_fetches.load(Ordering::SeqCst),
            events: self.event_fetches.load(Ordering::SeqCst),
        }
    }

    async fn answer_delay(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is offline".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_stalls(&self, marker_id: &MarkerId) -> Result<Vec<Stall>> {
        self.stall_fetches.fetch_add(1, Ordering::SeqCst);
        self.answer_delay().await?;

        let stalls = self.stalls.read().await;
        Ok(stalls
            .iter()
            .filter(|stall| &stall.marker_id == marker_id)
            .cloned()
            .collect())
    }

    async fn fetch_event(&self, event_id: &EventId) -> Result<Option<Event>> {
        self.event_fetches.fetch_add(1, Ordering::SeqCst);
        self.answer_delay().await?;

        let events = self.events.read().await;
        Ok(events.iter().find(|event| &event.id == event_id).cloned())
    }
}
