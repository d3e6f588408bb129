use std::fmt;

use crate::ids::EventId;
use crate::stall::Stall;

/// Result of resolving one scanned marker.
///
/// Every variant is an expected, user-facing condition. Outcomes travel as
/// data; nothing in the scan flow turns them into errors.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "kind", content = "detail", rename_all = "snake_case")
)]
pub enum ScanOutcome {
    Success(Stall),
    MarkerNotFound,
    EventNotFound,
    /// The stall exists but belongs to another event.
    WrongEvent(EventId),
    StallInactive,
    EventEnded,
    NetworkError {
        retryable: bool,
    },
}

impl ScanOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ScanOutcome::Success(_) => OutcomeKind::Success,
            ScanOutcome::MarkerNotFound => OutcomeKind::MarkerNotFound,
            ScanOutcome::EventNotFound => OutcomeKind::EventNotFound,
            ScanOutcome::WrongEvent(_) => OutcomeKind::WrongEvent,
            ScanOutcome::StallInactive => OutcomeKind::StallInactive,
            ScanOutcome::EventEnded => OutcomeKind::EventEnded,
            ScanOutcome::NetworkError { .. } => OutcomeKind::NetworkError,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanOutcome::Success(_))
    }

    /// Only network failures can be retried without a fresh detection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScanOutcome::NetworkError { retryable: true })
    }

    pub fn stall(&self) -> Option<&Stall> {
        match self {
            ScanOutcome::Success(stall) => Some(stall),
            _ => None,
        }
    }
}

/// Payload-free tag of a [`ScanOutcome`], used for analytics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutcomeKind {
    Success,
    MarkerNotFound,
    EventNotFound,
    WrongEvent,
    StallInactive,
    EventEnded,
    NetworkError,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::MarkerNotFound => "marker_not_found",
            OutcomeKind::EventNotFound => "event_not_found",
            OutcomeKind::WrongEvent => "wrong_event",
            OutcomeKind::StallInactive => "stall_inactive",
            OutcomeKind::EventEnded => "event_ended",
            OutcomeKind::NetworkError => "network_error",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
