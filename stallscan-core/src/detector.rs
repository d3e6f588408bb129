//! Detector boundary: feeds marker detections into a session.

use futures::{Stream, StreamExt};
use stallscan_model::MarkerId;
use tracing::{debug, trace};

use crate::{
    session::{ScanAttempt, ScanReport, ScanSession},
    store::RecordStore,
};

/// Signals produced by the camera/marker detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorEvent {
    Detected(MarkerId),
    /// The marker left the frame. Only used for tracing.
    Lost(MarkerId),
}

/// Totals for one [`ScanSession::drive`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveSummary {
    pub detected: u64,
    pub lost: u64,
    pub completed: u64,
    pub suppressed: u64,
}

impl<S> ScanSession<S>
where
    S: RecordStore + ?Sized,
{
    /// Process detections one at a time until the stream ends or the
    /// session is torn down, handing each completed report to `on_report`.
    pub async fn drive<D, F>(
        &self,
        detections: D,
        mut on_report: F,
    ) -> DriveSummary
    where
        D: Stream<Item = DetectorEvent>,
        F: FnMut(ScanReport),
    {
        let shutdown = self.shutdown_token();
        let mut summary = DriveSummary::default();
        let mut detections = std::pin::pin!(detections);

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = detections.next() => next,
            };

            let marker_id = match next {
                None => break,
                Some(DetectorEvent::Lost(marker_id)) => {
                    summary.lost += 1;
                    trace!("Marker {} lost", marker_id);
                    continue;
                }
                Some(DetectorEvent::Detected(marker_id)) => marker_id,
            };

            summary.detected += 1;
            match self.scan(&marker_id).await {
                ScanAttempt::Completed(report) => {
                    summary.completed += 1;
                    on_report(*report);
                }
                ScanAttempt::Suppressed => summary.suppressed += 1,
                ScanAttempt::Abandoned => break,
            }
        }

        debug!(
            "Detector stream finished: detected={} completed={} suppressed={} lost={}",
            summary.detected, summary.completed, summary.suppressed, summary.lost
        );
        summary
    }
}
