//! Normalization: schema-shaped intermediate object → canonical report.
//!
//! This is the reverse conversion path of the pipeline: the decoder hands
//! over a [`ProtoMessage`] keyed by wire field names, and this module maps it
//! into the camelCase [`AnalysisReport`] shape the application consumes.
//!
//! `normalize` is total over schema-conforming messages. Proto3 omits
//! default-valued scalars from the wire and may omit empty repeated fields
//! and untouched nested messages entirely; every accessor here therefore
//! falls back to the proto3 default instead of failing. No field is invented
//! and none is dropped: each struct literal below names every canonical
//! field, so a missing mapping is a compile error.

use crate::proto::{ProtoFieldValue, ProtoMessage};
use crate::report::{
    ActionableOutput, AnalysisReport, DishonestyFinding, EvidenceIndexItem, EvidenceSpotlightItem,
    LegalSubjectFinding, PostAnalysisDeclaration, PreAnalysisChecks, RecommendedAction,
    TopLiability,
};
use std::collections::HashMap;
use tracing::debug;

type Fields = HashMap<String, ProtoFieldValue>;

/// Normalize a decoded `AnalysisResult` message into the canonical report.
///
/// Consumes the intermediate object; nothing retains it after this step.
/// Repeated elements are mapped independently and keep their wire order.
pub fn normalize(message: ProtoMessage) -> AnalysisReport {
    debug!("Normalizing decoded message {}", message.message_type);
    let mut f = message.fields;

    AnalysisReport {
        protocol_version: take_u32(&mut f, "protocol_version"),
        analysis_timestamp_utc: take_string(&mut f, "analysis_timestamp_utc"),
        document_hash: take_string(&mut f, "document_hash"),
        file_name: take_string(&mut f, "file_name"),
        case_narrative: take_string(&mut f, "case_narrative"),
        evidence_spotlight: take_items(&mut f, "evidence_spotlight", spotlight_item),
        evidence_index: take_items(&mut f, "evidence_index", index_item),
        pre_analysis_checks: pre_analysis_checks(take_message(&mut f, "pre_analysis_checks")),
        critical_legal_subjects: take_items(&mut f, "critical_legal_subjects", subject_finding),
        dishonesty_detection_matrix: take_items(
            &mut f,
            "dishonesty_detection_matrix",
            dishonesty_finding,
        ),
        actionable_output: actionable_output(take_message(&mut f, "actionable_output")),
        post_analysis_declaration: post_analysis_declaration(take_message(
            &mut f,
            "post_analysis_declaration",
        )),
    }
}

fn spotlight_item(mut f: Fields) -> EvidenceSpotlightItem {
    EvidenceSpotlightItem {
        title: take_string(&mut f, "title"),
        significance: take_string(&mut f, "significance"),
        evidence_reference: take_string(&mut f, "evidence_reference"),
        page_number: take_u32(&mut f, "page_number"),
    }
}

fn index_item(mut f: Fields) -> EvidenceIndexItem {
    EvidenceIndexItem {
        id: take_string(&mut f, "id"),
        description: take_string(&mut f, "description"),
        page_number: take_u32(&mut f, "page_number"),
        document_reference: take_string(&mut f, "document_reference"),
    }
}

fn pre_analysis_checks(fields: Option<Fields>) -> PreAnalysisChecks {
    let mut f = fields.unwrap_or_default();
    PreAnalysisChecks {
        extraction_protocol: take_bool(&mut f, "extraction_protocol"),
        preservation_flags: take_bool(&mut f, "preservation_flags"),
        scope: take_bool(&mut f, "scope"),
    }
}

fn subject_finding(mut f: Fields) -> LegalSubjectFinding {
    LegalSubjectFinding {
        subject: take_string(&mut f, "subject"),
        key_points: take_string_list(&mut f, "key_points"),
        evidence: take_string(&mut f, "evidence"),
        severity: take_string(&mut f, "severity"),
    }
}

fn dishonesty_finding(mut f: Fields) -> DishonestyFinding {
    DishonestyFinding {
        flag: take_string(&mut f, "flag"),
        description: take_string(&mut f, "description"),
        evidence: take_string(&mut f, "evidence"),
        severity: take_string(&mut f, "severity"),
    }
}

fn actionable_output(fields: Option<Fields>) -> ActionableOutput {
    let mut f = fields.unwrap_or_default();
    ActionableOutput {
        top_liabilities: take_items(&mut f, "top_liabilities", top_liability),
        dishonesty_score: take_u32(&mut f, "dishonesty_score"),
        recommended_actions: take_items(&mut f, "recommended_actions", recommended_action),
        summary: take_string(&mut f, "summary"),
    }
}

fn top_liability(mut f: Fields) -> TopLiability {
    TopLiability {
        name: take_string(&mut f, "name"),
        severity: take_string(&mut f, "severity"),
    }
}

fn recommended_action(mut f: Fields) -> RecommendedAction {
    RecommendedAction {
        jurisdiction: take_string(&mut f, "jurisdiction"),
        action: take_string(&mut f, "action"),
        legal_basis: take_string(&mut f, "legal_basis"),
    }
}

fn post_analysis_declaration(fields: Option<Fields>) -> PostAnalysisDeclaration {
    let mut f = fields.unwrap_or_default();
    PostAnalysisDeclaration {
        extraction_complete: take_bool(&mut f, "extraction_complete"),
        integrity_seals_verified: take_bool(&mut f, "integrity_seals_verified"),
        logs: take_string(&mut f, "logs"),
        seal: take_string(&mut f, "seal"),
    }
}

// Field accessors. Each removes the field from the map and applies the
// proto3 default when the field is absent or carries an unexpected variant.

fn take_string(fields: &mut Fields, name: &str) -> String {
    match fields.remove(name) {
        Some(ProtoFieldValue::String(s)) => s,
        Some(ProtoFieldValue::Enum(s)) => s,
        _ => String::new(),
    }
}

fn take_u32(fields: &mut Fields, name: &str) -> u32 {
    match fields.remove(name) {
        Some(ProtoFieldValue::Uint32(v)) => v,
        Some(ProtoFieldValue::Int32(v)) => v.try_into().unwrap_or(0),
        _ => 0,
    }
}

fn take_bool(fields: &mut Fields, name: &str) -> bool {
    matches!(fields.remove(name), Some(ProtoFieldValue::Bool(true)))
}

fn take_message(fields: &mut Fields, name: &str) -> Option<Fields> {
    match fields.remove(name) {
        Some(ProtoFieldValue::Message(msg)) => Some(msg.fields),
        _ => None,
    }
}

/// Map each element of a repeated message field in wire order.
fn take_items<T>(fields: &mut Fields, name: &str, item: fn(Fields) -> T) -> Vec<T>
where
    T: Default,
{
    match fields.remove(name) {
        Some(ProtoFieldValue::Repeated(values)) => values
            .into_iter()
            .map(|v| match v {
                ProtoFieldValue::Message(msg) => item(msg.fields),
                _ => T::default(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn take_string_list(fields: &mut Fields, name: &str) -> Vec<String> {
    match fields.remove(name) {
        Some(ProtoFieldValue::Repeated(values)) => values
            .into_iter()
            .map(|v| match v {
                ProtoFieldValue::String(s) => s,
                _ => String::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(fields: Vec<(&str, ProtoFieldValue)>) -> ProtoMessage {
        ProtoMessage {
            message_type: "verumomnis.AnalysisResult".to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    fn sub_message(type_name: &str, fields: Vec<(&str, ProtoFieldValue)>) -> ProtoFieldValue {
        ProtoFieldValue::Message(Box::new(ProtoMessage {
            message_type: type_name.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }))
    }

    #[test]
    fn test_empty_message_normalizes_to_defaults() {
        let report = normalize(message(vec![]));
        assert_eq!(report, AnalysisReport::default());
        // Repeated fields are sequences, never absent.
        assert!(report.evidence_index.is_empty());
        assert!(report.actionable_output.recommended_actions.is_empty());
    }

    #[test]
    fn test_identity_fields_renamed() {
        let report = normalize(message(vec![
            (
                "document_hash",
                ProtoFieldValue::String("sha256:feed".to_string()),
            ),
            (
                "file_name",
                ProtoFieldValue::String("contract.pdf".to_string()),
            ),
            ("protocol_version", ProtoFieldValue::Uint32(2)),
        ]));
        assert_eq!(report.document_hash, "sha256:feed");
        assert_eq!(report.file_name, "contract.pdf");
        assert_eq!(report.protocol_version, 2);
    }

    #[test]
    fn test_pre_analysis_checks_mapping() {
        let report = normalize(message(vec![(
            "pre_analysis_checks",
            sub_message(
                "verumomnis.AnalysisResult.PreAnalysisChecks",
                vec![
                    ("extraction_protocol", ProtoFieldValue::Bool(true)),
                    ("preservation_flags", ProtoFieldValue::Bool(false)),
                    ("scope", ProtoFieldValue::Bool(true)),
                ],
            ),
        )]));
        assert_eq!(
            report.pre_analysis_checks,
            PreAnalysisChecks {
                extraction_protocol: true,
                preservation_flags: false,
                scope: true,
            }
        );
    }

    #[test]
    fn test_spotlight_order_preserved() {
        let items = ["A", "B", "C"]
            .iter()
            .map(|title| {
                sub_message(
                    "verumomnis.EvidenceSpotlightItem",
                    vec![("title", ProtoFieldValue::String(title.to_string()))],
                )
            })
            .collect();
        let report = normalize(message(vec![(
            "evidence_spotlight",
            ProtoFieldValue::Repeated(items),
        )]));
        let titles: Vec<&str> = report
            .evidence_spotlight
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_nested_actionable_output() {
        let report = normalize(message(vec![(
            "actionable_output",
            sub_message(
                "verumomnis.AnalysisResult.ActionableOutput",
                vec![
                    ("dishonesty_score", ProtoFieldValue::Uint32(7)),
                    (
                        "summary",
                        ProtoFieldValue::String("material misrepresentation".to_string()),
                    ),
                    (
                        "top_liabilities",
                        ProtoFieldValue::Repeated(vec![sub_message(
                            "verumomnis.TopLiability",
                            vec![
                                ("name", ProtoFieldValue::String("fraud".to_string())),
                                ("severity", ProtoFieldValue::String("high".to_string())),
                            ],
                        )]),
                    ),
                ],
            ),
        )]));
        assert_eq!(report.actionable_output.dishonesty_score, 7);
        assert_eq!(report.actionable_output.top_liabilities.len(), 1);
        assert_eq!(report.actionable_output.top_liabilities[0].name, "fraud");
        assert!(report.actionable_output.recommended_actions.is_empty());
    }

    #[test]
    fn test_key_points_preserved_in_order() {
        let report = normalize(message(vec![(
            "critical_legal_subjects",
            ProtoFieldValue::Repeated(vec![sub_message(
                "verumomnis.LegalSubjectFinding",
                vec![
                    ("subject", ProtoFieldValue::String("consent".to_string())),
                    (
                        "key_points",
                        ProtoFieldValue::Repeated(vec![
                            ProtoFieldValue::String("first".to_string()),
                            ProtoFieldValue::String("second".to_string()),
                        ]),
                    ),
                ],
            )]),
        )]));
        assert_eq!(
            report.critical_legal_subjects[0].key_points,
            vec!["first", "second"]
        );
    }

    #[test]
    fn test_missing_nested_sections_default() {
        let report = normalize(message(vec![(
            "case_narrative",
            ProtoFieldValue::String("narrative".to_string()),
        )]));
        assert_eq!(report.pre_analysis_checks, PreAnalysisChecks::default());
        assert_eq!(
            report.post_analysis_declaration,
            PostAnalysisDeclaration::default()
        );
    }
}
