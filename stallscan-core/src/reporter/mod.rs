//! Turns outcomes into user-facing notices and analytics records.

pub mod analytics;

use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stallscan_model::{EventId, MarkerId, OutcomeKind, ScanOutcome};
use uuid::Uuid;

pub use analytics::{
    AnalyticsCounters, AnalyticsSink, AnalyticsSnapshot, AnalyticsTransport,
    ChannelAnalyticsSink, HttpAnalyticsTransport, NoopAnalyticsSink,
    TracingTransport,
};

/// How the presentation layer should style a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// User-facing rendering of an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    /// Set when scanning the same marker again may succeed.
    pub retry_hint: bool,
}

/// Best-effort timing record for one completed scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    pub scan_id: Uuid,
    pub outcome: OutcomeKind,
    pub elapsed_ms: u64,
    pub marker_id: MarkerId,
    pub event_id: EventId,
    pub recorded_at: DateTime<Utc>,
}

/// Maps outcomes to notices and hands analytics to a sink without waiting.
#[derive(Debug, Clone)]
pub struct ResultReporter {
    sink: Arc<dyn AnalyticsSink>,
}

impl ResultReporter {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { sink }
    }

    /// Build the notice for `outcome` and emit the analytics record.
    ///
    /// Analytics delivery happens elsewhere; nothing here can fail or block.
    pub fn report(
        &self,
        marker_id: &MarkerId,
        event_id: &EventId,
        outcome: &ScanOutcome,
        elapsed: Duration,
    ) -> UserNotice {
        self.sink.emit(AnalyticsRecord {
            scan_id: Uuid::now_v7(),
            outcome: outcome.kind(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            marker_id: marker_id.clone(),
            event_id: event_id.clone(),
            recorded_at: Utc::now(),
        });
        notice_for(outcome)
    }

    pub fn analytics(&self) -> Option<AnalyticsSnapshot> {
        self.sink.snapshot()
    }
}

pub fn severity_of(outcome: &ScanOutcome) -> Severity {
    match outcome {
        ScanOutcome::Success(_) => Severity::Success,
        ScanOutcome::MarkerNotFound
        | ScanOutcome::WrongEvent(_)
        | ScanOutcome::StallInactive
        | ScanOutcome::EventEnded => Severity::Warning,
        ScanOutcome::EventNotFound | ScanOutcome::NetworkError { .. } => {
            Severity::Error
        }
    }
}

pub fn notice_for(outcome: &ScanOutcome) -> UserNotice {
    let severity = severity_of(outcome);
    let (title, message) = match outcome {
        ScanOutcome::Success(stall) => (
            stall.name.clone(),
            if stall.description.is_empty() {
                format!("Found {} ({})", stall.name, stall.category)
            } else {
                stall.description.clone()
            },
        ),
        ScanOutcome::MarkerNotFound => (
            "Unknown marker".to_string(),
            "This marker is not registered to any stall.".to_string(),
        ),
        ScanOutcome::EventNotFound => (
            "Event unavailable".to_string(),
            "The event you are browsing could not be found. Reopen it from \
             the event list."
                .to_string(),
        ),
        ScanOutcome::WrongEvent(actual) => (
            "Different event".to_string(),
            format!(
                "This stall belongs to another event ({actual}). Switch \
                 events to view it."
            ),
        ),
        ScanOutcome::StallInactive => (
            "Stall closed".to_string(),
            "This stall is not currently active.".to_string(),
        ),
        ScanOutcome::EventEnded => (
            "Event ended".to_string(),
            "This event has already ended.".to_string(),
        ),
        ScanOutcome::NetworkError { retryable: true } => (
            "Connection problem".to_string(),
            "Could not reach the server. Point the camera at the marker \
             again to retry."
                .to_string(),
        ),
        ScanOutcome::NetworkError { retryable: false } => (
            "Lookup failed".to_string(),
            "The stall record could not be read.".to_string(),
        ),
    };

    UserNotice {
        severity,
        title,
        message,
        retry_hint: outcome.is_retryable(),
    }
}
