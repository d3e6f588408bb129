//! Document-database REST adapter against a canned local HTTP responder.

use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use stallscan_core::{
    StoreError,
    reporter::NoopAnalyticsSink,
    session::{ScanSession, SessionSettings},
    store::{HttpRecordStore, RecordStore},
};
use stallscan_model::{EventId, MarkerId, ScanOutcome};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use url::Url;

const STALL_DOC: &str = r#"[{
    "id": "s-1",
    "eventId": "E1",
    "markerId": "STALL_001",
    "name": "Dumpling House",
    "category": "food",
    "status": "active",
    "createdAt": "2026-03-01T09:00:00Z",
    "updatedAt": "2026-03-01T09:00:00Z"
}]"#;

const SHARED_MARKER_DOCS: &str = r#"[{
    "id": "s-7",
    "eventId": "E2",
    "markerId": "SHARED",
    "name": "Lantern Tea",
    "status": "active",
    "createdAt": "2026-03-01T09:00:00Z",
    "updatedAt": "2026-03-01T09:00:00Z"
}, {
    "id": "s-8",
    "eventId": "E1",
    "markerId": "SHARED",
    "name": "Noodle Bar",
    "status": "active",
    "createdAt": "2026-03-01T09:00:00Z",
    "updatedAt": "2026-03-01T09:00:00Z"
}]"#;

const NO_STATUS_DOC: &str = r#"[{
    "id": "s-5",
    "eventId": "E1",
    "markerId": "NO_STATUS",
    "name": "Mystery Stall",
    "createdAt": "2026-03-01T09:00:00Z",
    "updatedAt": "2026-03-01T09:00:00Z"
}]"#;

const EVENT_DOC: &str = r#"{
    "id": "E1",
    "name": "Night Market",
    "startTime": "2026-03-01T09:00:00Z",
    "endTime": "2099-03-01T23:00:00Z",
    "status": "live"
}"#;

/// Serves fixed responses keyed by request target, one request per
/// connection.
async fn spawn_responder(
    routes: HashMap<&'static str, (u16, &'static str)>,
) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let Ok(n) = socket.read(&mut chunk).await else {
                        return;
                    };
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&buf);
                let target = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/");
                let (status, body) =
                    routes.get(target).copied().unwrap_or((404, ""));
                let response = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Ok(addr)
}

async fn store() -> Result<HttpRecordStore> {
    let routes = HashMap::from([
        (
            "/db/collections/stalls/documents?markerId=STALL_001",
            (200, STALL_DOC),
        ),
        (
            "/db/collections/stalls/documents?markerId=INVALID_123",
            (200, "[]"),
        ),
        (
            "/db/collections/stalls/documents?markerId=BROKEN",
            (200, r#"{"unexpected": true}"#),
        ),
        (
            "/db/collections/stalls/documents?markerId=SHARED",
            (200, SHARED_MARKER_DOCS),
        ),
        (
            "/db/collections/stalls/documents?markerId=NO_STATUS",
            (200, NO_STATUS_DOC),
        ),
        (
            "/db/collections/stalls/documents?markerId=BUSY",
            (503, ""),
        ),
        (
            "/db/collections/stalls/documents?markerId=FORBIDDEN",
            (403, "denied"),
        ),
        ("/db/collections/events/documents/E1", (200, EVENT_DOC)),
    ]);
    let addr = spawn_responder(routes).await?;
    let base = Url::parse(&format!("http://{addr}/db/"))?;
    Ok(HttpRecordStore::new(base, Duration::from_secs(5))?)
}

fn marker(raw: &str) -> MarkerId {
    MarkerId::new(raw).unwrap()
}

fn event_id(raw: &str) -> EventId {
    EventId::new(raw).unwrap()
}

#[tokio::test]
async fn resolves_stall_and_event_documents() -> Result<()> {
    let store = store().await?;

    let stall = store.fetch_stall(&marker("STALL_001"), &event_id("E1")).await?;
    assert_eq!(stall.map(|s| s.name), Some("Dumpling House".to_string()));

    let event = store.fetch_event(&EventId::new("E1")?).await?;
    assert_eq!(event.map(|e| e.name), Some("Night Market".to_string()));
    Ok(())
}

#[tokio::test]
async fn empty_query_and_missing_document_are_absent() -> Result<()> {
    let store = store().await?;

    assert!(store.fetch_stalls(&marker("INVALID_123")).await?.is_empty());
    assert!(store.fetch_event(&EventId::new("E404")?).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn status_and_body_failures_are_classified() -> Result<()> {
    let store = store().await?;

    let busy = store.fetch_stalls(&marker("BUSY")).await.unwrap_err();
    assert!(matches!(busy, StoreError::Unavailable(_)));
    assert!(busy.is_retryable());

    let forbidden = store.fetch_stalls(&marker("FORBIDDEN")).await.unwrap_err();
    assert!(matches!(
        forbidden,
        StoreError::Rejected { status: 403, .. }
    ));
    assert!(!forbidden.is_retryable());

    let broken = store.fetch_stalls(&marker("BROKEN")).await.unwrap_err();
    assert!(matches!(
        broken,
        StoreError::Decode {
            collection: "stalls",
            ..
        }
    ));
    assert!(!broken.is_retryable());
    Ok(())
}

#[tokio::test]
async fn reused_marker_resolves_to_active_event_registration() -> Result<()> {
    let store = store().await?;

    assert_eq!(store.fetch_stalls(&marker("SHARED")).await?.len(), 2);

    let local = store.fetch_stall(&marker("SHARED"), &event_id("E1")).await?;
    assert_eq!(local.map(|s| s.name), Some("Noodle Bar".to_string()));

    let foreign = store.fetch_stall(&marker("SHARED"), &event_id("E9")).await?;
    assert_eq!(
        foreign.map(|s| s.event_id),
        Some(event_id("E2"))
    );
    Ok(())
}

#[tokio::test]
async fn stall_document_without_status_is_a_decode_error() -> Result<()> {
    let store = store().await?;

    let err = store.fetch_stalls(&marker("NO_STATUS")).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Decode {
            collection: "stalls",
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn refused_connection_is_retryable() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let store = HttpRecordStore::new(
        Url::parse(&format!("http://{addr}/"))?,
        Duration::from_secs(2),
    )?;
    let err = store.fetch_stalls(&marker("STALL_001")).await.unwrap_err();
    assert!(err.is_retryable(), "expected retryable, got {err:?}");
    Ok(())
}

#[tokio::test]
async fn session_over_http_store_succeeds() -> Result<()> {
    let store = Arc::new(store().await?);
    let session = ScanSession::new(
        store,
        EventId::new("E1")?,
        SessionSettings::default(),
        Arc::new(NoopAnalyticsSink),
    );

    let report = session
        .scan(&marker("STALL_001"))
        .await
        .into_report()
        .expect("scan completes");
    assert!(matches!(report.outcome, ScanOutcome::Success(_)));
    Ok(())
}
