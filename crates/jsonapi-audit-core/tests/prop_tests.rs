//! Property-based tests for the validators
//!
//! These tests check that validation is total and deterministic over
//! arbitrary JSON, and that the grammar helpers agree with themselves.

use jsonapi_audit_core::pointer::{check_pointer, join, segments};
use jsonapi_audit_core::validation::document::EXCLUSIVITY_RULE;
use jsonapi_audit_core::validation::linkage::{ORPHAN_RULE, UNFULFILLED_RULE};
use jsonapi_audit_core::validation::member_name::{check_member_name, MemberKind};
use jsonapi_audit_core::validation::query::sort::parse_sort;
use jsonapi_audit_core::{validate_document, ValidationContext};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Strategy for generating random JSON values with controlled complexity
fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,30}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 16, 5, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            proptest::collection::hash_map("[a-z_]{1,12}", inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Strategy for JSON shaped like a document, so validators get past the envelope
fn document_like_strategy() -> impl Strategy<Value = Value> {
    (
        proptest::option::of(json_value_strategy()),
        proptest::option::of(json_value_strategy()),
        proptest::option::of(json_value_strategy()),
        proptest::option::of(json_value_strategy()),
    )
        .prop_map(|(data, included, links, meta)| {
            let mut document = json!({});
            for (key, value) in [("data", data), ("included", included), ("links", links), ("meta", meta)] {
                if let Some(value) = value {
                    document[key] = value;
                }
            }
            document
        })
}

/// Strategy for names matching the member-name grammar
fn member_name_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]([a-z0-9]{0,6}[-_][a-z0-9]){0,3}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_document_validator_never_panics(value in json_value_strategy()) {
        let _ = validate_document(&value, &ValidationContext::new());
    }

    #[test]
    fn prop_document_like_validation_is_deterministic(document in document_like_strategy()) {
        let ctx = ValidationContext::new();
        let first = validate_document(&document, &ctx);
        let second = validate_document(&document, &ctx);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_finding_pointers_are_well_formed(document in document_like_strategy()) {
        let findings = validate_document(&document, &ValidationContext::new());
        for finding in findings.iter() {
            prop_assert!(check_pointer(finding.pointer()).is_ok(), "bad pointer {:?}", finding.pointer());
        }
    }

    #[test]
    fn prop_summary_partitions_findings(document in document_like_strategy()) {
        let summary = validate_document(&document, &ValidationContext::new()).summary();
        prop_assert_eq!(summary.passed + summary.warnings + summary.failed, summary.total);
    }

    #[test]
    fn prop_data_with_errors_always_fails(data in json_value_strategy(), errors in json_value_strategy()) {
        let document = json!({"data": data, "errors": errors});
        let findings = validate_document(&document, &ValidationContext::new());
        prop_assert!(findings.with_rule(EXCLUSIVITY_RULE).any(|f| f.is_failure()));
    }

    #[test]
    fn prop_grammar_names_are_accepted(name in member_name_strategy()) {
        prop_assert!(check_member_name(&name, MemberKind::General).is_ok());
    }

    #[test]
    fn prop_uppercase_names_are_rejected(prefix in member_name_strategy(), upper in "[A-Z]") {
        let name = format!("{}{}", prefix, upper);
        prop_assert!(check_member_name(&name, MemberKind::General).is_err());
    }

    #[test]
    fn prop_doubled_separators_are_rejected(
        left in "[a-z0-9]{1,6}",
        separators in "[-_]{2,3}",
        right in "[a-z0-9]{1,6}",
    ) {
        let name = format!("{}{}{}", left, separators, right);
        prop_assert!(check_member_name(&name, MemberKind::General).is_err());
    }

    #[test]
    fn prop_joined_pointers_split_back(tokens in proptest::collection::vec(".{0,8}", 0..5)) {
        let pointer = tokens.iter().fold(String::new(), |acc, token| join(&acc, token));
        prop_assert!(check_pointer(&pointer).is_ok());
        prop_assert_eq!(segments(&pointer), tokens);
    }

    #[test]
    fn prop_sort_parameter_preserves_fields(
        fields in proptest::collection::vec((member_name_strategy(), any::<bool>()), 1..5)
    ) {
        let raw = fields
            .iter()
            .map(|(name, descending)| format!("{}{}", if *descending { "-" } else { "" }, name))
            .collect::<Vec<_>>()
            .join(",");
        let parsed = parse_sort(&raw).unwrap();
        prop_assert_eq!(parsed.len(), fields.len());
        for (field, (name, descending)) in parsed.iter().zip(&fields) {
            prop_assert_eq!(&field.path, name);
            prop_assert_eq!(field.descending, *descending);
        }
    }

    #[test]
    fn prop_fully_linked_compound_document_has_no_linkage_failures(
        ids in proptest::collection::btree_set("[1-9][0-9]{0,3}", 1..8)
    ) {
        let identifiers: Vec<Value> = ids.iter().map(|id| json!({"type": "people", "id": id})).collect();
        let document = json!({
            "data": [{
                "type": "articles",
                "id": "1",
                "relationships": {"authors": {"data": identifiers}}
            }],
            "included": identifiers
        });
        let findings = validate_document(&document, &ValidationContext::new());
        prop_assert!(!findings.has_failures(), "{:?}", findings.failures().collect::<Vec<_>>());
        prop_assert_eq!(findings.with_rule(ORPHAN_RULE).filter(|f| f.is_failure()).count(), 0);
        prop_assert_eq!(findings.with_rule(UNFULFILLED_RULE).filter(|f| f.is_failure()).count(), 0);
    }
}
