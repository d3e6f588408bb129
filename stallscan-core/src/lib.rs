//! # stallscan core
//!
//! Resolves a marker scanned by the event-guide app to a stall record,
//! validates it against the event the user is browsing, and reports one of a
//! fixed set of outcomes with timing.
//!
//! ## Flow
//!
//! A detection enters a [`session::ScanSession`]. Repeat detections inside
//! the cooldown window are dropped. Otherwise the stall and the active event
//! are fetched concurrently through [`client::RecordStoreClient`] (the event
//! via the session's [`cache::EventCache`]), [`pipeline::validate`] picks the
//! outcome, and [`reporter::ResultReporter`] renders a notice and hands an
//! analytics record to a fire-and-forget sink.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use stallscan_core::{
//!     reporter::NoopAnalyticsSink,
//!     session::{ScanSession, SessionSettings},
//!     store::InMemoryRecordStore,
//! };
//! use stallscan_model::{EventId, MarkerId};
//!
//! async fn scan_once() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryRecordStore::new());
//!     let session = ScanSession::new(
//!         store,
//!         EventId::new("E1")?,
//!         SessionSettings::default(),
//!         Arc::new(NoopAnalyticsSink),
//!     );
//!     let attempt = session.scan(&MarkerId::new("STALL_001")?).await;
//!     println!("{attempt:?}");
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Single-slot memo of the active event
pub mod cache;

/// Concurrent stall/event lookups with per-fetch deadlines
pub mod client;

/// Per-marker cooldown state
pub mod cooldown;

/// Detector stream adapter
pub mod detector;

/// Error types
pub mod error;

/// Ordered validation checks
pub mod pipeline;

/// Notices and fire-and-forget analytics
pub mod reporter;

/// Scan session lifecycle
pub mod session;

/// Record store port and adapters
pub mod store;

pub use error::{AnalyticsError, StoreError};
pub use session::{ScanAttempt, ScanReport, ScanSession, SessionSettings};
pub use stallscan_model as model;
