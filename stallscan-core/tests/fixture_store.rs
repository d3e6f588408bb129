//! Loading the in-memory store from fixture files.

use std::io::Write;

use anyhow::Result;
use stallscan_core::{
    StoreError,
    store::{InMemoryRecordStore, RecordStore},
};
use stallscan_model::{EventId, MarkerId, StallStatus};

#[tokio::test]
async fn loads_stalls_and_events_from_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{
            "stalls": [
                {{
                    "id": "s-1",
                    "eventId": "E1",
                    "markerId": "STALL_001",
                    "name": "Dumpling House",
                    "status": "inactive",
                    "createdAt": "2026-03-01T09:00:00Z",
                    "updatedAt": "2026-03-01T09:00:00Z"
                }}
            ],
            "events": [
                {{
                    "id": "E1",
                    "name": "Night Market",
                    "startTime": "2026-03-01T09:00:00Z",
                    "endTime": "2026-03-01T23:00:00Z"
                }}
            ]
        }}"#
    )?;

    let store = InMemoryRecordStore::from_fixture_file(file.path())?;
    let stall = store
        .fetch_stall(&MarkerId::new("STALL_001")?, &EventId::new("E1")?)
        .await?
        .expect("fixture stall");
    assert_eq!(stall.status, StallStatus::Inactive);
    assert!(store.fetch_event(&EventId::new("E1")?).await?.is_some());
    Ok(())
}

#[test]
fn missing_fixture_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = InMemoryRecordStore::from_fixture_file(&path).unwrap_err();
    match err {
        StoreError::Fixture { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other:?}"),
    }
}
