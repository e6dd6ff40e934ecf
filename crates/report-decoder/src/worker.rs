//! Task boundary: one payload in, progress and a single result out.
//!
//! The pipeline (read → decode → normalize) runs as one sequential unit of
//! work on a spawned tokio task, so decoding a large artifact never blocks
//! the thread that initiated the request. One payload per activation; the
//! state machine is one-directional and terminal at Done/Failed. There is no
//! cancellation and no timeout here; bounded latency is the caller's
//! concern.

use crate::decoder::ReportDecoder;
use crate::error::{Error, Result};
use crate::schema::SchemaProvider;
use report_types::{normalize, AnalysisReport};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Raw payload source handed across the boundary.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    /// Payload already in memory
    Bytes(Vec<u8>),
    /// Payload to be read from disk during the Reading state
    File(PathBuf),
}

/// Events emitted across the boundary, in order: zero or more progress
/// notifications followed by exactly one terminal event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerEvent {
    /// Human-readable status text; informational only, safe to drop
    Progress { message: String },
    /// The canonical report; emitted exactly once on success
    Success { result: Box<AnalysisReport> },
    /// A single structured error; emitted exactly once on failure
    Error { message: String },
}

/// Pipeline states. Transitions are one-directional; Done and Failed are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskState {
    Idle,
    Reading,
    Decoding,
    Done,
    Failed,
}

struct ReportTask {
    state: TaskState,
}

impl ReportTask {
    fn new() -> Self {
        Self {
            state: TaskState::Idle,
        }
    }

    fn advance(&mut self, next: TaskState) {
        debug!("Report task state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// Spawn the decode pipeline for one payload.
///
/// All failures are converted into a single [`WorkerEvent::Error`]; nothing
/// escapes the task or panics the host. Event sends are fire-and-forget: a
/// receiver that went away only means nobody is listening anymore.
pub fn spawn_report_task(
    provider: Arc<SchemaProvider>,
    source: PayloadSource,
    events: UnboundedSender<WorkerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        match run_report_task(provider, source, Some(&events)).await {
            Ok(report) => {
                let _ = events.send(WorkerEvent::Success {
                    result: Box::new(report),
                });
            }
            Err(e) => {
                error!("Report task failed: {e}");
                let _ = events.send(WorkerEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    })
}

/// Run the pipeline for one payload: read, decode, normalize.
///
/// Request/response form of the boundary; progress notifications go to the
/// optional channel. Runs to completion or failure, no cancellation.
pub async fn run_report_task(
    provider: Arc<SchemaProvider>,
    source: PayloadSource,
    progress: Option<&UnboundedSender<WorkerEvent>>,
) -> Result<AnalysisReport> {
    let mut task = ReportTask::new();
    let notify = |message: &str| {
        if let Some(events) = progress {
            let _ = events.send(WorkerEvent::Progress {
                message: message.to_string(),
            });
        }
    };

    task.advance(TaskState::Reading);
    notify("Reading file into memory...");
    let bytes = match read_payload(source).await {
        Ok(bytes) => bytes,
        Err(e) => {
            task.advance(TaskState::Failed);
            return Err(e);
        }
    };

    task.advance(TaskState::Decoding);
    notify("Decoding binary report...");
    let decoder = ReportDecoder::new(provider);
    let report = match decoder.decode(&bytes).map(normalize) {
        Ok(report) => report,
        Err(e) => {
            task.advance(TaskState::Failed);
            return Err(e);
        }
    };

    task.advance(TaskState::Done);
    info!(
        "Decoded report for {} ({} bytes)",
        report.file_name,
        bytes.len()
    );
    Ok(report)
}

async fn read_payload(source: PayloadSource) -> Result<Vec<u8>> {
    match source {
        PayloadSource::Bytes(bytes) => Ok(bytes),
        PayloadSource::File(path) => {
            debug!("Reading report payload from {}", path.display());
            tokio::fs::read(&path).await.map_err(Error::from)
        }
    }
}
