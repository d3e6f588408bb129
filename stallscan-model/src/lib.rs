//! Core data model definitions shared across stallscan crates.
#![allow(missing_docs)]

pub use ::chrono;

pub mod error;
pub mod event;
pub mod ids;
pub mod outcome;
pub mod prelude;
pub mod stall;

pub use error::{ModelError, Result as ModelResult};
pub use event::{Event, EventStatus};
pub use ids::{EventId, MarkerId, StallId};
pub use outcome::{OutcomeKind, ScanOutcome};
pub use stall::{Stall, StallStatus};
