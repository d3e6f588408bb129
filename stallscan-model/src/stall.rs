use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::ModelError;
use crate::ids::{EventId, MarkerId, StallId};

/// Whether a stall is currently open to visitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StallStatus {
    #[default]
    Active,
    Inactive,
}

impl StallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StallStatus::Active => "active",
            StallStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for StallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StallStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(StallStatus::Active),
            "inactive" => Ok(StallStatus::Inactive),
            other => Err(ModelError::InvalidStatus {
                field: "stall status",
                value: other.to_string(),
            }),
        }
    }
}

/// A vendor/booth record tied to exactly one event.
///
/// Records are owned by the document store and only mutated by admin
/// tooling; the scan flow treats them as read-only snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Stall {
    pub id: StallId,
    pub event_id: EventId,
    pub marker_id: MarkerId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    pub status: StallStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stall {
    pub fn is_active(&self) -> bool {
        self.status == StallStatus::Active
    }

    pub fn belongs_to(&self, event_id: &EventId) -> bool {
        &self.event_id == event_id
    }
}
