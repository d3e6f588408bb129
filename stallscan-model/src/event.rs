use chrono::{DateTime, Utc};

use crate::ids::EventId;

/// Lifecycle status stored on the event document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventStatus {
    #[default]
    Scheduled,
    Live,
    Ended,
    Cancelled,
}

/// An event that stalls belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: EventStatus,
}

impl Event {
    /// An event has ended once its end time is in the past, or when an
    /// admin has closed or cancelled it early.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, EventStatus::Ended | EventStatus::Cancelled)
            || self.end_time < now
    }
}
