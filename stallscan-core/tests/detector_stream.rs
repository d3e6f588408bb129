//! Driving a session from a stream of detector events.

use std::time::Duration;

use futures::stream;
use stallscan_core::{
    detector::{DetectorEvent, DriveSummary},
    store::InMemoryRecordStore,
};
use stallscan_model::ScanOutcome;
use tokio_stream::StreamExt as _;

#[path = "support/mod.rs"]
mod support;

use support::{Harness, marker, seeded_store};

#[tokio::test(start_paused = true)]
async fn flickering_marker_is_processed_once() {
    let h = Harness::new(seeded_store().await);
    let detections = stream::iter(vec![
        DetectorEvent::Detected(marker("STALL_001")),
        DetectorEvent::Lost(marker("STALL_001")),
        DetectorEvent::Detected(marker("STALL_001")),
        DetectorEvent::Detected(marker("INVALID_123")),
        DetectorEvent::Lost(marker("INVALID_123")),
    ]);

    let mut reports = Vec::new();
    let summary = h.session.drive(detections, |r| reports.push(r)).await;

    assert_eq!(
        summary,
        DriveSummary {
            detected: 3,
            lost: 2,
            completed: 2,
            suppressed: 1,
        }
    );
    assert!(reports[0].outcome.is_success());
    assert_eq!(reports[1].outcome, ScanOutcome::MarkerNotFound);
    assert_eq!(h.store.fetch_counts().stalls, 2);
}

#[tokio::test(start_paused = true)]
async fn detections_after_cooldown_are_processed_again() {
    let h = Harness::new(seeded_store().await);
    let detections = stream::iter(vec![
        DetectorEvent::Detected(marker("STALL_001")),
        DetectorEvent::Detected(marker("STALL_001")),
    ])
    .throttle(Duration::from_secs(3));

    let mut completed = 0;
    let summary = h.session.drive(detections, |_| completed += 1).await;

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.suppressed, 0);
    assert_eq!(completed, 2);
}

#[tokio::test(start_paused = true)]
async fn teardown_stops_an_open_detector_stream() {
    let store = InMemoryRecordStore::new();
    let h = Harness::new(store);
    let token = h.session.shutdown_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    // A detector that never finishes on its own.
    let detections = stream::pending::<DetectorEvent>();
    let summary = h.session.drive(detections, |_| {}).await;

    assert_eq!(summary, DriveSummary::default());
    assert!(h.session.is_torn_down());
}
