//! Record store port and its adapters.
//!
//! The document database is a black box reachable through two queries:
//! stall-by-marker-id and event-by-id. Adapters map their transport onto
//! [`RecordStore`]; everything above this module only sees the port.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use stallscan_model::{Event, EventId, MarkerId, Stall};

use crate::error::Result;

pub use http::HttpRecordStore;
pub use memory::{FetchCounts, InMemoryRecordStore, StoreFixture};

/// Collection names as they appear in the document database.
pub const STALLS_COLLECTION: &str = "stalls";
pub const EVENTS_COLLECTION: &str = "events";

/// Read-only query surface of the document database.
///
/// A missing record is `Ok(None)`. `Err` is reserved for transport or
/// availability failures so callers can tell "absent" from "unknown".
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every stall registered under `marker_id`, across all events.
    async fn fetch_stalls(&self, marker_id: &MarkerId) -> Result<Vec<Stall>>;

    /// Look up an event by document id.
    async fn fetch_event(&self, event_id: &EventId) -> Result<Option<Event>>;

    /// The stall `marker_id` resolves to while scanning under
    /// `active_event`.
    async fn fetch_stall(
        &self,
        marker_id: &MarkerId,
        active_event: &EventId,
    ) -> Result<Option<Stall>> {
        let stalls = self.fetch_stalls(marker_id).await?;
        Ok(select_stall(stalls, active_event))
    }
}

/// Marker ids are only unique within one event. Prefer the registration
/// under `active_event`; otherwise keep the first match so the caller can
/// still report the event the marker belongs to.
pub fn select_stall(stalls: Vec<Stall>, active_event: &EventId) -> Option<Stall> {
    let preferred = stalls
        .iter()
        .position(|stall| stall.belongs_to(active_event))
        .unwrap_or(0);
    stalls.into_iter().nth(preferred)
}
