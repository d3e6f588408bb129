//! Concurrent stall/event lookup for a single scan.

use std::{any::type_name_of_val, fmt, sync::Arc, time::Duration};

use stallscan_model::{Event, EventId, MarkerId, Stall};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::{
    cache::EventCache,
    error::{Result, StoreError},
    store::RecordStore,
};

/// Where the event half of a lookup was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Cache,
    Store,
    /// The store failed and a copy cached by a concurrent scan was used.
    CacheFallback,
}

/// Per-fetch latencies of one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimings {
    pub stall: Duration,
    pub event: Duration,
    pub event_source: EventSource,
}

/// Both halves of a lookup, each with its own success or failure.
#[derive(Debug)]
pub struct LookupResult {
    pub stall: Result<Option<Stall>>,
    pub event: Result<Option<Event>>,
    pub timings: FetchTimings,
}

/// Issues the two record-store queries for a scan, reading the event
/// through the session's [`EventCache`].
pub struct RecordStoreClient<S>
where
    S: RecordStore + ?Sized,
{
    store: Arc<S>,
    cache: EventCache,
    fetch_timeout: Duration,
}

impl<S> fmt::Debug for RecordStoreClient<S>
where
    S: RecordStore + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStoreClient")
            .field("store", &type_name_of_val(self.store.as_ref()))
            .field("cache", &self.cache)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

impl<S> RecordStoreClient<S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: Arc<S>, fetch_timeout: Duration) -> Self {
        Self {
            store,
            cache: EventCache::new(),
            fetch_timeout,
        }
    }

    pub fn cache(&self) -> &EventCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetch the stall for `marker_id` and the event `event_id` concurrently
    /// and wait for both to settle.
    pub async fn lookup(
        &self,
        marker_id: &MarkerId,
        event_id: &EventId,
    ) -> LookupResult {
        let stall = async {
            let started = Instant::now();
            let result = self
                .with_deadline(self.store.fetch_stall(marker_id, event_id))
                .await;
            (result, started.elapsed())
        };

        let event = async {
            let started = Instant::now();
            let (result, source) = self.fetch_event(event_id).await;
            (result, source, started.elapsed())
        };

        let ((stall, stall_latency), (event, event_source, event_latency)) =
            tokio::join!(stall, event);

        LookupResult {
            stall,
            event,
            timings: FetchTimings {
                stall: stall_latency,
                event: event_latency,
                event_source,
            },
        }
    }

    async fn fetch_event(
        &self,
        event_id: &EventId,
    ) -> (Result<Option<Event>>, EventSource) {
        if let Some(event) = self.cache.get(event_id) {
            return (Ok(Some(event)), EventSource::Cache);
        }

        match self.with_deadline(self.store.fetch_event(event_id)).await {
            Ok(Some(event)) => {
                self.cache.store(event.clone());
                (Ok(Some(event)), EventSource::Store)
            }
            Ok(None) => (Ok(None), EventSource::Store),
            Err(err) => match self.cache.peek(event_id) {
                Some(cached) => {
                    warn!(
                        "Event fetch for {} failed ({}); serving cached copy",
                        event_id, err
                    );
                    (Ok(Some(cached)), EventSource::CacheFallback)
                }
                None => (Err(err), EventSource::Store),
            },
        }
    }

    async fn with_deadline<T>(
        &self,
        fetch: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => {
                debug!("Record store fetch exceeded {:?}", self.fetch_timeout);
                Err(StoreError::Timeout(self.fetch_timeout))
            }
        }
    }
}
