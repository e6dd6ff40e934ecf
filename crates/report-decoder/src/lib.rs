//! Decoding pipeline for binary verum analysis reports.
//!
//! This crate provides:
//! - Runtime protobuf support: the embedded `.proto` schema is compiled at
//!   first use, no code generation
//! - A descriptor-driven wire decoder producing the schema-shaped
//!   intermediate object
//! - The task boundary that runs read → decode → normalize off the
//!   initiating thread and reports progress and a single result
//!
//! # Data flow
//!
//! ```text
//! bytes → ReportDecoder → ProtoMessage → normalize → AnalysisReport
//! ```
//!
//! The value model and the normalizer live in `report-types`; this crate
//! owns schema compilation, byte-level decoding and orchestration.
//!
//! # Example
//!
//! ```no_run
//! use report_decoder::{spawn_report_task, PayloadSource, SchemaProvider};
//! use std::sync::Arc;
//!
//! # async fn demo(payload: Vec<u8>) {
//! let provider = Arc::new(SchemaProvider::embedded());
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! spawn_report_task(provider, PayloadSource::Bytes(payload), tx);
//! while let Some(event) = rx.recv().await {
//!     // progress* then exactly one success or error
//! }
//! # }
//! ```

pub mod decoder;
pub mod error;
pub mod schema;
pub mod worker;

// Re-export the intermediate value model for callers that inspect decoded
// messages directly.
pub use report_types::{ProtoFieldValue, ProtoMessage, ProtoSchema};

pub use decoder::ReportDecoder;
pub use error::{Error, Result};
pub use schema::{SchemaProvider, REPORT_MESSAGE_TYPE, REPORT_SCHEMA};
pub use worker::{run_report_task, spawn_report_task, PayloadSource, WorkerEvent};
