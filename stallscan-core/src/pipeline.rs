//! Ordered business checks turning a lookup into a [`ScanOutcome`].

use chrono::{DateTime, Utc};
use stallscan_model::{EventId, ScanOutcome};

use crate::client::LookupResult;

/// Run the checks in order; the first failing check decides the outcome.
///
/// 1. a failed fetch makes absence meaningless, so it is reported first
/// 2. missing stall
/// 3. missing event (the session context itself is invalid)
/// 4. stall registered under another event
/// 5. inactive stall
/// 6. ended event
pub fn validate(
    lookup: LookupResult,
    active_event: &EventId,
    now: DateTime<Utc>,
) -> ScanOutcome {
    let stall = match lookup.stall {
        Ok(stall) => stall,
        Err(err) => {
            return ScanOutcome::NetworkError {
                retryable: err.is_retryable(),
            };
        }
    };

    let event = match lookup.event {
        Ok(event) => event,
        Err(err) => {
            return ScanOutcome::NetworkError {
                retryable: err.is_retryable(),
            };
        }
    };

    let Some(stall) = stall else {
        return ScanOutcome::MarkerNotFound;
    };

    let Some(event) = event else {
        return ScanOutcome::EventNotFound;
    };

    if !stall.belongs_to(active_event) {
        return ScanOutcome::WrongEvent(stall.event_id);
    }

    if !stall.is_active() {
        return ScanOutcome::StallInactive;
    }

    if event.has_ended(now) {
        return ScanOutcome::EventEnded;
    }

    ScanOutcome::Success(stall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{EventSource, FetchTimings};
    use crate::error::StoreError;
    use chrono::Duration;
    use stallscan_model::{
        Event, EventStatus, MarkerId, Stall, StallId, StallStatus,
    };

    fn eid(raw: &str) -> EventId {
        EventId::new(raw).unwrap()
    }

    fn stall(event: &str, status: StallStatus) -> Stall {
        let now = Utc::now();
        Stall {
            id: StallId::new("s-1").unwrap(),
            event_id: eid(event),
            marker_id: MarkerId::new("STALL_001").unwrap(),
            name: "Dumpling House".into(),
            category: "food".into(),
            description: String::new(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn event(id: &str, ends_in: Duration) -> Event {
        let now = Utc::now();
        Event {
            id: eid(id),
            name: "Night Market".into(),
            start_time: now - Duration::hours(3),
            end_time: now + ends_in,
            status: EventStatus::Live,
        }
    }

    fn lookup(
        stall: crate::error::Result<Option<Stall>>,
        event: crate::error::Result<Option<Event>>,
    ) -> LookupResult {
        LookupResult {
            stall,
            event,
            timings: FetchTimings {
                stall: std::time::Duration::ZERO,
                event: std::time::Duration::ZERO,
                event_source: EventSource::Store,
            },
        }
    }

    fn offline() -> StoreError {
        StoreError::Unavailable("offline".into())
    }

    #[test]
    fn matching_active_stall_in_running_event_succeeds() {
        let s = stall("E1", StallStatus::Active);
        let outcome = validate(
            lookup(Ok(Some(s.clone())), Ok(Some(event("E1", Duration::hours(2))))),
            &eid("E1"),
            Utc::now(),
        );
        assert_eq!(outcome, ScanOutcome::Success(s));
    }

    #[test]
    fn stall_network_failure_wins_over_everything() {
        let outcome = validate(lookup(Err(offline()), Ok(None)), &eid("E1"), Utc::now());
        assert_eq!(outcome, ScanOutcome::NetworkError { retryable: true });
    }

    #[test]
    fn event_network_failure_makes_absent_stall_meaningless() {
        let outcome = validate(lookup(Ok(None), Err(offline())), &eid("E1"), Utc::now());
        assert_eq!(outcome, ScanOutcome::NetworkError { retryable: true });
    }

    #[test]
    fn decode_failure_is_not_retryable() {
        let err = StoreError::Decode {
            collection: "stalls",
            message: "bad".into(),
        };
        let outcome = validate(lookup(Err(err), Ok(None)), &eid("E1"), Utc::now());
        assert_eq!(outcome, ScanOutcome::NetworkError { retryable: false });
    }

    #[test]
    fn missing_stall_is_reported_before_missing_event() {
        let outcome = validate(lookup(Ok(None), Ok(None)), &eid("E1"), Utc::now());
        assert_eq!(outcome, ScanOutcome::MarkerNotFound);
    }

    #[test]
    fn missing_event_with_known_stall() {
        let outcome = validate(
            lookup(Ok(Some(stall("E1", StallStatus::Active))), Ok(None)),
            &eid("E1"),
            Utc::now(),
        );
        assert_eq!(outcome, ScanOutcome::EventNotFound);
    }

    #[test]
    fn wrong_event_dominates_inactive_and_ended() {
        let outcome = validate(
            lookup(
                Ok(Some(stall("E2", StallStatus::Inactive))),
                Ok(Some(event("E1", Duration::hours(-1)))),
            ),
            &eid("E1"),
            Utc::now(),
        );
        assert_eq!(outcome, ScanOutcome::WrongEvent(eid("E2")));
    }

    #[test]
    fn inactive_dominates_ended() {
        let outcome = validate(
            lookup(
                Ok(Some(stall("E1", StallStatus::Inactive))),
                Ok(Some(event("E1", Duration::hours(-1)))),
            ),
            &eid("E1"),
            Utc::now(),
        );
        assert_eq!(outcome, ScanOutcome::StallInactive);
    }

    #[test]
    fn ended_event_with_active_stall() {
        let outcome = validate(
            lookup(
                Ok(Some(stall("E1", StallStatus::Active))),
                Ok(Some(event("E1", Duration::minutes(-5)))),
            ),
            &eid("E1"),
            Utc::now(),
        );
        assert_eq!(outcome, ScanOutcome::EventEnded);
    }
}
