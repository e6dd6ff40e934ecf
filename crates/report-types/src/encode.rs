//! Forward conversion: canonical report → protobuf wire encoding.
//!
//! Producer-side counterpart of [`crate::normalize`]. The encoding follows
//! the proto3 wire format:
//! - Each field is encoded as (tag, value) pairs
//! - Tag = (field_number << 3) | wire_type
//! - Nested messages and repeated message fields are length-delimited
//!
//! Field numbers here mirror the `verumomnis` schema exactly; they are the
//! compatibility contract with previously produced artifacts.

use crate::error::{ReportTypesError, Result};
use crate::report::{
    ActionableOutput, AnalysisReport, DishonestyFinding, EvidenceIndexItem, EvidenceSpotlightItem,
    LegalSubjectFinding, PostAnalysisDeclaration, PreAnalysisChecks, RecommendedAction,
    TopLiability,
};
use protobuf::CodedOutputStream;

/// Encode an [`AnalysisReport`] to protobuf binary format.
pub fn encode_report(report: &AnalysisReport) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut stream = CodedOutputStream::vec(&mut buffer);

        write_uint32(&mut stream, 1, report.protocol_version)?;
        write_string(&mut stream, 2, &report.analysis_timestamp_utc)?;
        write_string(&mut stream, 3, &report.document_hash)?;
        write_string(&mut stream, 4, &report.file_name)?;
        write_string(&mut stream, 5, &report.case_narrative)?;
        for item in &report.evidence_spotlight {
            write_nested(&mut stream, 6, |s| write_spotlight_item(s, item))?;
        }
        for item in &report.evidence_index {
            write_nested(&mut stream, 7, |s| write_index_item(s, item))?;
        }
        write_nested(&mut stream, 8, |s| {
            write_pre_analysis_checks(s, &report.pre_analysis_checks)
        })?;
        for finding in &report.critical_legal_subjects {
            write_nested(&mut stream, 9, |s| write_subject_finding(s, finding))?;
        }
        for finding in &report.dishonesty_detection_matrix {
            write_nested(&mut stream, 10, |s| write_dishonesty_finding(s, finding))?;
        }
        write_nested(&mut stream, 11, |s| {
            write_actionable_output(s, &report.actionable_output)
        })?;
        write_nested(&mut stream, 12, |s| {
            write_post_analysis_declaration(s, &report.post_analysis_declaration)
        })?;

        stream
            .flush()
            .map_err(|e| ReportTypesError::ProtobufEncode(e.to_string()))?;
    }

    Ok(buffer)
}

fn write_spotlight_item(stream: &mut CodedOutputStream, item: &EvidenceSpotlightItem) -> Result<()> {
    write_string(stream, 1, &item.title)?;
    write_string(stream, 2, &item.significance)?;
    write_string(stream, 3, &item.evidence_reference)?;
    write_uint32(stream, 4, item.page_number)
}

fn write_index_item(stream: &mut CodedOutputStream, item: &EvidenceIndexItem) -> Result<()> {
    write_string(stream, 1, &item.id)?;
    write_string(stream, 2, &item.description)?;
    write_uint32(stream, 3, item.page_number)?;
    write_string(stream, 4, &item.document_reference)
}

fn write_pre_analysis_checks(
    stream: &mut CodedOutputStream,
    checks: &PreAnalysisChecks,
) -> Result<()> {
    write_bool(stream, 1, checks.extraction_protocol)?;
    write_bool(stream, 2, checks.preservation_flags)?;
    write_bool(stream, 3, checks.scope)
}

fn write_subject_finding(
    stream: &mut CodedOutputStream,
    finding: &LegalSubjectFinding,
) -> Result<()> {
    write_string(stream, 1, &finding.subject)?;
    for point in &finding.key_points {
        write_string(stream, 2, point)?;
    }
    write_string(stream, 3, &finding.evidence)?;
    write_string(stream, 4, &finding.severity)
}

fn write_dishonesty_finding(
    stream: &mut CodedOutputStream,
    finding: &DishonestyFinding,
) -> Result<()> {
    write_string(stream, 1, &finding.flag)?;
    write_string(stream, 2, &finding.description)?;
    write_string(stream, 3, &finding.evidence)?;
    write_string(stream, 4, &finding.severity)
}

fn write_actionable_output(stream: &mut CodedOutputStream, out: &ActionableOutput) -> Result<()> {
    for liability in &out.top_liabilities {
        write_nested(stream, 1, |s| write_top_liability(s, liability))?;
    }
    write_uint32(stream, 2, out.dishonesty_score)?;
    for action in &out.recommended_actions {
        write_nested(stream, 3, |s| write_recommended_action(s, action))?;
    }
    write_string(stream, 4, &out.summary)
}

fn write_top_liability(stream: &mut CodedOutputStream, liability: &TopLiability) -> Result<()> {
    write_string(stream, 1, &liability.name)?;
    write_string(stream, 2, &liability.severity)
}

fn write_recommended_action(
    stream: &mut CodedOutputStream,
    action: &RecommendedAction,
) -> Result<()> {
    write_string(stream, 1, &action.jurisdiction)?;
    write_string(stream, 2, &action.action)?;
    write_string(stream, 3, &action.legal_basis)
}

fn write_post_analysis_declaration(
    stream: &mut CodedOutputStream,
    decl: &PostAnalysisDeclaration,
) -> Result<()> {
    write_bool(stream, 1, decl.extraction_complete)?;
    write_bool(stream, 2, decl.integrity_seals_verified)?;
    write_string(stream, 3, &decl.logs)?;
    write_string(stream, 4, &decl.seal)
}

/// Encode a nested message as a length-delimited sub-buffer.
fn write_nested<F>(stream: &mut CodedOutputStream, field_number: u32, body: F) -> Result<()>
where
    F: FnOnce(&mut CodedOutputStream) -> Result<()>,
{
    let mut nested = Vec::new();
    {
        let mut nested_stream = CodedOutputStream::vec(&mut nested);
        body(&mut nested_stream)?;
        nested_stream
            .flush()
            .map_err(|e| ReportTypesError::ProtobufEncode(e.to_string()))?;
    }
    stream
        .write_bytes(field_number, &nested)
        .map_err(|e| ReportTypesError::ProtobufEncode(e.to_string()))
}

fn write_string(stream: &mut CodedOutputStream, field_number: u32, value: &str) -> Result<()> {
    stream
        .write_string(field_number, value)
        .map_err(|e| ReportTypesError::ProtobufEncode(e.to_string()))
}

fn write_uint32(stream: &mut CodedOutputStream, field_number: u32, value: u32) -> Result<()> {
    stream
        .write_uint32(field_number, value)
        .map_err(|e| ReportTypesError::ProtobufEncode(e.to_string()))
}

fn write_bool(stream: &mut CodedOutputStream, field_number: u32, value: bool) -> Result<()> {
    stream
        .write_bool(field_number, value)
        .map_err(|e| ReportTypesError::ProtobufEncode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use protobuf::CodedInputStream;

    #[test]
    fn test_encode_default_report_is_decodable() {
        let encoded = encode_report(&AnalysisReport::default()).unwrap();
        assert!(!encoded.is_empty());

        // Verify we can walk the encoded data
        let mut stream = CodedInputStream::from_bytes(&encoded);
        let tag = stream.read_raw_varint32().unwrap();
        assert_eq!(tag >> 3, 1); // field number 1: protocol_version
        let version = stream.read_uint32().unwrap();
        assert_eq!(version, 0);
    }

    #[test]
    fn test_encode_identity_fields() {
        let report = AnalysisReport {
            protocol_version: 2,
            document_hash: "sha256:cafe".to_string(),
            ..Default::default()
        };
        let encoded = encode_report(&report).unwrap();

        let mut stream = CodedInputStream::from_bytes(&encoded);
        let tag = stream.read_raw_varint32().unwrap();
        assert_eq!(tag >> 3, 1);
        assert_eq!(stream.read_uint32().unwrap(), 2);

        // field 2: analysis_timestamp_utc (empty)
        let tag = stream.read_raw_varint32().unwrap();
        assert_eq!(tag >> 3, 2);
        assert_eq!(stream.read_string().unwrap(), "");

        // field 3: document_hash
        let tag = stream.read_raw_varint32().unwrap();
        assert_eq!(tag >> 3, 3);
        assert_eq!(stream.read_string().unwrap(), "sha256:cafe");
    }

    #[test]
    fn test_repeated_fields_emit_one_tag_per_item() {
        let report = AnalysisReport {
            evidence_index: vec![
                EvidenceIndexItem {
                    id: "E1".to_string(),
                    ..Default::default()
                },
                EvidenceIndexItem {
                    id: "E2".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let encoded = encode_report(&report).unwrap();

        let mut stream = CodedInputStream::from_bytes(&encoded);
        let mut index_items = 0;
        while !stream.eof().unwrap() {
            let tag = stream.read_raw_varint32().unwrap();
            match tag & 0x7 {
                0 => {
                    stream.read_raw_varint64().unwrap();
                }
                2 => {
                    if tag >> 3 == 7 {
                        index_items += 1;
                    }
                    stream.read_bytes().unwrap();
                }
                other => panic!("unexpected wire type {other}"),
            }
        }
        assert_eq!(index_items, 2);
    }
}
