//! Shared types and normalization for verum-report.
//!
//! This crate provides the value model for decoded analysis reports: the
//! schema-shaped intermediate representation produced by the wire decoder,
//! the canonical application-facing report, and the conversions between them.
//!
//! # Architecture
//!
//! ```text
//! Decode (reader):   encoded bytes → ProtoMessage → AnalysisReport
//! Encode (producer): AnalysisReport → encoded bytes
//! ```
//!
//! # Modules
//!
//! - [`proto`] - Intermediate value model and schema descriptors
//! - [`report`] - The canonical `AnalysisReport` and its section records
//! - [`normalize`] - ProtoMessage → AnalysisReport normalization
//! - [`encode`] - AnalysisReport → protobuf wire encoding
//! - [`error`] - Error types for encoding operations
//!
//! The decoding logic itself lives in the `report-decoder` crate; this crate
//! deliberately has no knowledge of how bytes are parsed, only of the shapes
//! they parse into.

pub mod encode;
pub mod error;
pub mod normalize;
pub mod proto;
pub mod report;

// Re-export main types for convenient access
pub use encode::encode_report;
pub use error::{ReportTypesError, Result};
pub use normalize::normalize;
pub use proto::{
    ProtoEnumDescriptor, ProtoFieldDescriptor, ProtoFieldValue, ProtoMessage,
    ProtoMessageDescriptor, ProtoSchema, ProtoType,
};
pub use report::{
    ActionableOutput, AnalysisReport, DishonestyFinding, EvidenceIndexItem, EvidenceSpotlightItem,
    LegalSubjectFinding, PostAnalysisDeclaration, PreAnalysisChecks, RecommendedAction,
    TopLiability,
};
