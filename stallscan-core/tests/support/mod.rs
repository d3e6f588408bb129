//! Shared fixtures for core integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use stallscan_core::{
    reporter::{AnalyticsRecord, AnalyticsSink},
    session::{ScanSession, SessionSettings},
    store::InMemoryRecordStore,
};
use stallscan_model::{
    Event, EventId, EventStatus, MarkerId, Stall, StallId, StallStatus,
};

pub const ACTIVE_EVENT: &str = "E1";
pub const OTHER_EVENT: &str = "E2";

/// Analytics sink that keeps every record it is handed.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<AnalyticsRecord>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<AnalyticsRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AnalyticsSink for RecordingSink {
    fn emit(&self, record: AnalyticsRecord) {
        self.records.lock().unwrap().push(record);
    }
}

pub fn marker(raw: &str) -> MarkerId {
    MarkerId::new(raw).unwrap()
}

pub fn event_id(raw: &str) -> EventId {
    EventId::new(raw).unwrap()
}

pub fn stall(
    id: &str,
    marker_id: &str,
    event: &str,
    status: StallStatus,
) -> Stall {
    let now = Utc::now();
    Stall {
        id: StallId::new(id).unwrap(),
        event_id: event_id(event),
        marker_id: marker(marker_id),
        name: format!("Stall {id}"),
        category: "food".into(),
        description: String::new(),
        status,
        created_at: now,
        updated_at: now,
    }
}

pub fn event(id: &str, ends_in: ChronoDuration) -> Event {
    let now = Utc::now();
    Event {
        id: event_id(id),
        name: format!("Event {id}"),
        start_time: now - ChronoDuration::hours(2),
        end_time: now + ends_in,
        status: EventStatus::Live,
    }
}

pub fn running_event(id: &str) -> Event {
    event(id, ChronoDuration::hours(4))
}

pub fn settings() -> SessionSettings {
    SessionSettings {
        cooldown: Duration::from_secs(2),
        fetch_timeout: Duration::from_secs(5),
        latency_budget: Duration::from_millis(1500),
        cooldown_sweep_every: 64,
    }
}

pub struct Harness {
    pub store: Arc<InMemoryRecordStore>,
    pub sink: Arc<RecordingSink>,
    pub session: ScanSession<InMemoryRecordStore>,
}

impl Harness {
    pub fn new(store: InMemoryRecordStore) -> Self {
        Self::with_settings(store, settings())
    }

    pub fn with_settings(
        store: InMemoryRecordStore,
        settings: SessionSettings,
    ) -> Self {
        let store = Arc::new(store);
        let sink = Arc::new(RecordingSink::default());
        let session = ScanSession::new(
            Arc::clone(&store),
            event_id(ACTIVE_EVENT),
            settings,
            sink.clone(),
        );
        Self {
            store,
            sink,
            session,
        }
    }
}

/// Store holding the active event and a handful of stalls covering every
/// validation branch.
pub async fn seeded_store() -> InMemoryRecordStore {
    let store = InMemoryRecordStore::new();
    store.insert_event(running_event(ACTIVE_EVENT)).await;
    store.insert_event(running_event(OTHER_EVENT)).await;
    store
        .insert_stall(stall("s-1", "STALL_001", ACTIVE_EVENT, StallStatus::Active))
        .await;
    store
        .insert_stall(stall("s-2", "STALL_002", ACTIVE_EVENT, StallStatus::Active))
        .await;
    store
        .insert_stall(stall("s-3", "STALL_003", OTHER_EVENT, StallStatus::Active))
        .await;
    store
        .insert_stall(stall("s-4", "STALL_004", ACTIVE_EVENT, StallStatus::Inactive))
        .await;
    store
}
