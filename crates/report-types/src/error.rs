//! Error types for report-types crate.

use thiserror::Error;

/// Errors that can occur while producing wire-format bytes.
#[derive(Error, Debug)]
pub enum ReportTypesError {
    #[error("Protobuf encoding error: {0}")]
    ProtobufEncode(String),
}

/// Result type alias for report-types operations.
pub type Result<T> = std::result::Result<T, ReportTypesError>;
