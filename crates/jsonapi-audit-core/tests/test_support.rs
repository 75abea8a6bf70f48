//! Shared test support utilities for integration tests

use jsonapi_audit_core::{Finding, FindingSet, ValidationRequest};
use serde_json::{json, Value};

#[allow(dead_code)]
pub const JSONAPI: &str = "application/vnd.api+json";

/// A bare resource object
pub fn resource(resource_type: &str, id: &str) -> Value {
    json!({"type": resource_type, "id": id})
}

/// An article whose `related` relationship points at the given identifiers
#[allow(dead_code)]
pub fn article_referencing(id: &str, refs: &[(&str, &str)]) -> Value {
    let data: Vec<Value> = refs.iter().map(|(t, i)| resource(t, i)).collect();
    json!({
        "type": "articles",
        "id": id,
        "attributes": {"title": format!("Article {}", id)},
        "relationships": {"related": {"data": data}}
    })
}

/// A compound document with one primary article
#[allow(dead_code)]
pub fn compound_document(refs: &[(&str, &str)], included: &[(&str, &str)]) -> Value {
    let included: Vec<Value> = included.iter().map(|(t, i)| resource(t, i)).collect();
    json!({
        "data": [article_referencing("1", refs)],
        "included": included
    })
}

/// A GET exchange whose response is a well-formed JSON:API response
#[allow(dead_code)]
pub fn jsonapi_get(url: &str, body: Value) -> ValidationRequest {
    ValidationRequest::new("GET", url, 200)
        .with_header("Content-Type", JSONAPI)
        .with_header("Vary", "Accept")
        .with_body(body)
}

/// Findings of one rule with a given outcome
pub fn failures_of<'a>(findings: &'a FindingSet, rule: &'a str) -> Vec<&'a Finding> {
    findings.with_rule(rule).filter(|f| f.is_failure()).collect()
}

#[allow(dead_code)]
pub fn warnings_of<'a>(findings: &'a FindingSet, rule: &'a str) -> Vec<&'a Finding> {
    findings.with_rule(rule).filter(|f| f.is_warning()).collect()
}

/// Assert that a finding set has no failures, printing them if it does
pub fn assert_no_failures(findings: &FindingSet) {
    let failures: Vec<String> = findings.failures().map(ToString::to_string).collect();
    if !failures.is_empty() {
        panic!("Expected no failures, found:\n{}", failures.join("\n"));
    }
}
