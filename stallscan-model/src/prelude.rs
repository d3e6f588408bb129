//! Flat snapshot of the model surface for presentation layers.

pub use super::error::ModelError;
pub use super::event::{Event, EventStatus};
pub use super::ids::{EventId, MarkerId, StallId};
pub use super::outcome::{OutcomeKind, ScanOutcome};
pub use super::stall::{Stall, StallStatus};
