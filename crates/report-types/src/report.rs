//! The canonical analysis report.
//!
//! This is the application-facing output contract. Field names on the
//! serialized surface are camelCase (`documentHash`, `pageNumber`, ...) while
//! the wire schema uses snake_case; the normalizer owns that mapping.
//!
//! Every repeated wire field surfaces as a `Vec`, present even when empty,
//! and every nested message group as a concrete record with proto3 defaults
//! when absent from the wire.

use serde::{Deserialize, Serialize};

/// A fully normalized legal-document analysis report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Wire schema revision the artifact was produced against
    pub protocol_version: u32,
    /// Producer-side analysis timestamp, RFC 3339 text
    pub analysis_timestamp_utc: String,
    /// Content fingerprint of the analyzed document
    pub document_hash: String,
    pub file_name: String,
    pub case_narrative: String,
    pub evidence_spotlight: Vec<EvidenceSpotlightItem>,
    pub evidence_index: Vec<EvidenceIndexItem>,
    pub pre_analysis_checks: PreAnalysisChecks,
    pub critical_legal_subjects: Vec<LegalSubjectFinding>,
    pub dishonesty_detection_matrix: Vec<DishonestyFinding>,
    pub actionable_output: ActionableOutput,
    pub post_analysis_declaration: PostAnalysisDeclaration,
}

/// A highlighted piece of evidence with its significance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSpotlightItem {
    pub title: String,
    pub significance: String,
    pub evidence_reference: String,
    pub page_number: u32,
}

/// An entry in the exhaustive evidence index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceIndexItem {
    pub id: String,
    pub description: String,
    pub page_number: u32,
    pub document_reference: String,
}

/// Checks performed before the analysis ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreAnalysisChecks {
    pub extraction_protocol: bool,
    pub preservation_flags: bool,
    pub scope: bool,
}

/// A finding on a critical legal subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalSubjectFinding {
    pub subject: String,
    pub key_points: Vec<String>,
    pub evidence: String,
    pub severity: String,
}

/// A flag raised by the dishonesty detection matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishonestyFinding {
    pub flag: String,
    pub description: String,
    pub evidence: String,
    pub severity: String,
}

/// Actionable conclusions of the analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionableOutput {
    pub top_liabilities: Vec<TopLiability>,
    pub dishonesty_score: u32,
    pub recommended_actions: Vec<RecommendedAction>,
    pub summary: String,
}

/// A named liability ranked by severity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLiability {
    pub name: String,
    pub severity: String,
}

/// A recommended legal action in a jurisdiction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAction {
    pub jurisdiction: String,
    pub action: String,
    pub legal_basis: String,
}

/// Declarations recorded after the analysis completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAnalysisDeclaration {
    pub extraction_complete: bool,
    pub integrity_seals_verified: bool,
    pub logs: String,
    pub seal: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_surface() {
        let report = AnalysisReport {
            document_hash: "abc123".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["documentHash"], "abc123");
        assert!(json.get("document_hash").is_none());
        assert!(json["preAnalysisChecks"]["extractionProtocol"].is_boolean());
    }

    #[test]
    fn test_default_report_has_empty_sequences() {
        let report = AnalysisReport::default();
        assert!(report.evidence_index.is_empty());
        assert!(report.actionable_output.top_liabilities.is_empty());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["evidenceIndex"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_serde_round_trip() {
        let report = AnalysisReport {
            file_name: "contract.pdf".to_string(),
            evidence_spotlight: vec![EvidenceSpotlightItem {
                title: "Backdated signature".to_string(),
                significance: "high".to_string(),
                evidence_reference: "EX-1".to_string(),
                page_number: 4,
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: AnalysisReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
