//! Fire-and-forget analytics delivery.
//!
//! Delivery is at-most-once and best-effort: records are queued with
//! `try_send`, dropped when the queue is full or closed, and delivery
//! failures are logged and discarded. Nothing here reports back to the
//! scan that produced the record.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use super::AnalyticsRecord;
use crate::error::AnalyticsError;

/// Accepts analytics records without blocking or failing.
pub trait AnalyticsSink: Send + Sync + fmt::Debug {
    fn emit(&self, record: AnalyticsRecord);

    /// Queue totals, for sinks that keep them.
    fn snapshot(&self) -> Option<AnalyticsSnapshot> {
        None
    }
}

/// Where queued records are eventually delivered.
#[async_trait]
pub trait AnalyticsTransport: Send + Sync {
    async fn deliver(
        &self,
        record: &AnalyticsRecord,
    ) -> Result<(), AnalyticsError>;
}

/// Sink used when analytics is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalyticsSink;

impl AnalyticsSink for NoopAnalyticsSink {
    fn emit(&self, _record: AnalyticsRecord) {}
}

/// Running totals for a [`ChannelAnalyticsSink`].
#[derive(Debug, Default)]
pub struct AnalyticsCounters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`AnalyticsCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyticsSnapshot {
    pub enqueued: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub failed: u64,
}

impl AnalyticsCounters {
    pub fn snapshot(&self) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Bounded queue drained by a background worker that forwards records to
/// an [`AnalyticsTransport`].
///
/// The worker exits once every sink handle is dropped and the queue is
/// drained.
#[derive(Clone)]
pub struct ChannelAnalyticsSink {
    tx: mpsc::Sender<AnalyticsRecord>,
    counters: Arc<AnalyticsCounters>,
}

impl fmt::Debug for ChannelAnalyticsSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelAnalyticsSink")
            .field("capacity", &self.tx.max_capacity())
            .field("counters", &self.counters.snapshot())
            .finish()
    }
}

impl ChannelAnalyticsSink {
    /// Start the delivery worker on the current tokio runtime.
    pub fn spawn(
        transport: Arc<dyn AnalyticsTransport>,
        capacity: usize,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<AnalyticsRecord>(capacity.max(1));
        let counters = Arc::new(AnalyticsCounters::default());

        let worker_counters = Arc::clone(&counters);
        tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                match transport.deliver(&record).await {
                    Ok(()) => {
                        worker_counters.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        worker_counters.failed.fetch_add(1, Ordering::Relaxed);
                        debug!(
                            "Discarding analytics record {} after delivery failure: {}",
                            record.scan_id, err
                        );
                    }
                }
            }
            debug!("Analytics worker stopped");
        });

        Self { tx, counters }
    }

    pub fn counters(&self) -> AnalyticsSnapshot {
        self.counters.snapshot()
    }
}

impl AnalyticsSink for ChannelAnalyticsSink {
    fn emit(&self, record: AnalyticsRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Dropped analytics record (queue full/closed): {}", err);
            }
        }
    }

    fn snapshot(&self) -> Option<AnalyticsSnapshot> {
        Some(self.counters.snapshot())
    }
}

/// Writes each record as a structured log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTransport;

#[async_trait]
impl AnalyticsTransport for TracingTransport {
    async fn deliver(
        &self,
        record: &AnalyticsRecord,
    ) -> Result<(), AnalyticsError> {
        info!(
            target: "stallscan::analytics",
            scan_id = %record.scan_id,
            outcome = %record.outcome,
            elapsed_ms = record.elapsed_ms,
            marker_id = %record.marker_id,
            event_id = %record.event_id,
            "scan recorded"
        );
        Ok(())
    }
}

/// POSTs each record as JSON to a collector endpoint.
#[derive(Debug, Clone)]
pub struct HttpAnalyticsTransport {
    client: Client,
    endpoint: Url,
}

impl HttpAnalyticsTransport {
    pub fn new(
        endpoint: Url,
        timeout: Duration,
    ) -> Result<Self, AnalyticsError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl AnalyticsTransport for HttpAnalyticsTransport {
    async fn deliver(
        &self,
        record: &AnalyticsRecord,
    ) -> Result<(), AnalyticsError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyticsError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
