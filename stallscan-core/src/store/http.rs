use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use stallscan_model::{Event, EventId, MarkerId, Stall};
use tracing::debug;
use url::Url;

use super::{EVENTS_COLLECTION, RecordStore, STALLS_COLLECTION};
use crate::error::{Result, StoreError};

/// REST adapter for the document database.
///
/// Queries:
/// - `GET {base}/collections/stalls/documents?markerId={id}` returns a JSON
///   array of every stall registered under that marker, in any event.
/// - `GET {base}/collections/events/documents/{id}` returns one document,
///   or 404 when the event does not exist.
#[derive(Clone)]
pub struct HttpRecordStore {
    client: Client,
    base_url: Url,
}

impl fmt::Debug for HttpRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRecordStore")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl HttpRecordStore {
    pub fn new(base_url: Url, request_timeout: Duration) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn documents_url(&self, collection: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["collections", collection, "documents"]);
        Ok(url)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn fetch_stalls(&self, marker_id: &MarkerId) -> Result<Vec<Stall>> {
        let mut url = self.documents_url(STALLS_COLLECTION)?;
        url.query_pairs_mut()
            .append_pair("markerId", marker_id.as_str());

        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let matches: Option<Vec<Stall>> =
            read_document(response, STALLS_COLLECTION).await?;
        Ok(matches.unwrap_or_default())
    }

    async fn fetch_event(&self, event_id: &EventId) -> Result<Option<Event>> {
        let mut url = self.documents_url(EVENTS_COLLECTION)?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidBaseUrl(self.base_url.to_string()))?
            .push(event_id.as_str());

        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_document(response, EVENTS_COLLECTION).await
    }
}

async fn read_document<T: DeserializeOwned>(
    response: Response,
    collection: &'static str,
) -> Result<Option<T>> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        return Err(StoreError::Unavailable(format!(
            "{collection} query returned {status}"
        )));
    }

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body)
        .map(Some)
        .map_err(|e| StoreError::Decode {
            collection,
            message: e.to_string(),
        })
}
