//! A scan session: one AR screen scanning markers under one active event.

use std::{
    any::type_name_of_val,
    fmt,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use serde::Serialize;
use stallscan_model::{EventId, MarkerId, ScanOutcome};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    cache::CacheStats,
    client::{FetchTimings, RecordStoreClient},
    cooldown::CooldownTracker,
    pipeline,
    reporter::{AnalyticsSink, AnalyticsSnapshot, ResultReporter, UserNotice},
    store::RecordStore,
};

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_LATENCY_BUDGET: Duration = Duration::from_millis(1500);
const DEFAULT_COOLDOWN_SWEEP_EVERY: u64 = 64;

/// Tunables for a [`ScanSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Minimum time between two processed detections of one marker.
    pub cooldown: Duration,
    /// Deadline for each record-store query.
    pub fetch_timeout: Duration,
    /// Scans slower than this are flagged in the report and logged.
    pub latency_budget: Duration,
    /// Sweep expired cooldown entries every this many admissions.
    pub cooldown_sweep_every: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            latency_budget: DEFAULT_LATENCY_BUDGET,
            cooldown_sweep_every: DEFAULT_COOLDOWN_SWEEP_EVERY,
        }
    }
}

/// Everything the presentation layer needs about one completed scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub marker_id: MarkerId,
    pub event_id: EventId,
    pub outcome: ScanOutcome,
    pub notice: UserNotice,
    #[serde(skip)]
    pub timings: FetchTimings,
    pub elapsed_ms: u64,
    pub over_budget: bool,
}

/// What happened to a detection handed to [`ScanSession::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAttempt {
    Completed(Box<ScanReport>),
    /// Same marker was processed within the cooldown window.
    Suppressed,
    /// The session was torn down before the scan finished.
    Abandoned,
}

impl ScanAttempt {
    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            ScanAttempt::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn into_report(self) -> Option<ScanReport> {
        match self {
            ScanAttempt::Completed(report) => Some(*report),
            _ => None,
        }
    }
}

/// Counters snapshot for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub completed: u64,
    pub suppressed: u64,
    pub abandoned: u64,
    pub over_budget: u64,
    pub cache: CacheStats,
    pub tracked_markers: usize,
    /// Present when the analytics sink keeps queue counters.
    pub analytics: Option<AnalyticsSnapshot>,
}

#[derive(Debug, Default)]
struct SessionCounters {
    completed: AtomicU64,
    suppressed: AtomicU64,
    abandoned: AtomicU64,
    over_budget: AtomicU64,
}

/// Resolves detected markers for one AR session.
///
/// The session owns its event cache and cooldown state; both are dropped
/// with it. Scans may run concurrently for different markers.
pub struct ScanSession<S = dyn RecordStore>
where
    S: RecordStore + ?Sized,
{
    active_event: RwLock<EventId>,
    client: RecordStoreClient<S>,
    cooldown: CooldownTracker,
    reporter: ResultReporter,
    settings: SessionSettings,
    shutdown: CancellationToken,
    counters: SessionCounters,
}

impl<S> fmt::Debug for ScanSession<S>
where
    S: RecordStore + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanSession")
            .field("active_event", &self.active_event())
            .field("store", &type_name_of_val(self.client.store().as_ref()))
            .field("settings", &self.settings)
            .field("torn_down", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl<S> ScanSession<S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(
        store: Arc<S>,
        active_event: EventId,
        settings: SessionSettings,
        analytics: Arc<dyn AnalyticsSink>,
    ) -> Self {
        info!("Starting scan session for event {}", active_event);
        Self {
            active_event: RwLock::new(active_event),
            client: RecordStoreClient::new(store, settings.fetch_timeout),
            cooldown: CooldownTracker::new(
                settings.cooldown,
                settings.cooldown_sweep_every,
            ),
            reporter: ResultReporter::new(analytics),
            settings,
            shutdown: CancellationToken::new(),
            counters: SessionCounters::default(),
        }
    }

    pub fn active_event(&self) -> EventId {
        self.active_event
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Change the event being scanned under. Clears the cached event and
    /// cooldown state when the event actually changes.
    pub fn switch_event(&self, event_id: EventId) {
        let mut active = self
            .active_event
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if *active == event_id {
            return;
        }
        info!("Switching scan session from event {} to {}", active, event_id);
        *active = event_id;
        self.client.cache().invalidate();
        self.cooldown.clear();
    }

    /// Process one detection, unless the marker is cooling down.
    pub async fn scan(&self, marker_id: &MarkerId) -> ScanAttempt {
        if self.shutdown.is_cancelled() {
            return ScanAttempt::Abandoned;
        }

        if !self.cooldown.try_acquire(marker_id) {
            self.counters.suppressed.fetch_add(1, Ordering::Relaxed);
            debug!("Suppressed repeat detection of {}", marker_id);
            return ScanAttempt::Suppressed;
        }

        self.resolve(marker_id).await
    }

    /// Re-run a scan immediately, bypassing the cooldown. Meant for
    /// outcomes that are retryable.
    pub async fn retry(&self, marker_id: &MarkerId) -> ScanAttempt {
        if self.shutdown.is_cancelled() {
            return ScanAttempt::Abandoned;
        }
        self.cooldown.release(marker_id);
        self.scan(marker_id).await
    }

    async fn resolve(&self, marker_id: &MarkerId) -> ScanAttempt {
        let started = Instant::now();
        let event_id = self.active_event();

        let lookup = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                return self.abandon(marker_id);
            }
            lookup = self.client.lookup(marker_id, &event_id) => lookup,
        };

        let timings = lookup.timings;
        let outcome = pipeline::validate(lookup, &event_id, Utc::now());
        let elapsed = started.elapsed();

        if self.shutdown.is_cancelled() {
            return self.abandon(marker_id);
        }

        let notice =
            self.reporter.report(marker_id, &event_id, &outcome, elapsed);

        let over_budget = elapsed > self.settings.latency_budget;
        if over_budget {
            self.counters.over_budget.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Scan of {} took {:?}, over the {:?} budget (stall={:?} event={:?} via {:?})",
                marker_id,
                elapsed,
                self.settings.latency_budget,
                timings.stall,
                timings.event,
                timings.event_source
            );
        }

        info!(
            "Scan {} under {} -> {} in {:?}",
            marker_id,
            event_id,
            outcome.kind(),
            elapsed
        );
        self.counters.completed.fetch_add(1, Ordering::Relaxed);

        ScanAttempt::Completed(Box::new(ScanReport {
            marker_id: marker_id.clone(),
            event_id,
            outcome,
            notice,
            timings,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            over_budget,
        }))
    }

    fn abandon(&self, marker_id: &MarkerId) -> ScanAttempt {
        self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
        debug!("Abandoned scan of {} after teardown", marker_id);
        ScanAttempt::Abandoned
    }

    /// Tear the session down. In-flight scans are abandoned without
    /// reporting, and later scans are refused.
    pub fn teardown(&self) {
        if !self.shutdown.is_cancelled() {
            info!("Tearing down scan session for {}", self.active_event());
            self.shutdown.cancel();
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// A token the screen can cancel to tear down this session.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            completed: self.counters.completed.load(Ordering::Relaxed),
            suppressed: self.counters.suppressed.load(Ordering::Relaxed),
            abandoned: self.counters.abandoned.load(Ordering::Relaxed),
            over_budget: self.counters.over_budget.load(Ordering::Relaxed),
            cache: self.client.cache().stats(),
            tracked_markers: self.cooldown.tracked(),
            analytics: self.reporter.analytics(),
        }
    }
}

impl<S> Drop for ScanSession<S>
where
    S: RecordStore + ?Sized,
{
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
