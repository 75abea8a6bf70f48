//! Top-level document validation
//!
//! Checks the envelope invariants and then delegates each member to its
//! validator: `data` and `included` to the resource validator, `errors` to
//! the error validator, compound documents to the linkage analyzer.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::FindingSet;
use crate::kind::ValueKind;
use crate::rules::{SUPPORTED_VERSIONS, TOP_LEVEL_MEMBERS};
use crate::types::{PrimaryData, ResourceIdentifier};
use crate::validation::error_object::validate_errors;
use crate::validation::linkage::analyze_linkage;
use crate::validation::links::validate_links_object;
use crate::validation::member_name::{check_member_name, MemberKind};
use crate::validation::resource::{check_allowed_members, validate_meta, validate_resource};
use serde_json::{Map, Value};
use std::collections::HashMap;
use url::Url;

pub const STRUCTURE_RULE: &str = "Document Structure";
pub const EXCLUSIVITY_RULE: &str = "Data and Errors Exclusivity";
pub const TOP_LEVEL_RULE: &str = "Document Top-Level Members";
pub const INCLUDED_RULE: &str = "Document Included Resources";
pub const PRIMARY_DATA_RULE: &str = "Primary Data";
pub const PRIMARY_UNIQUENESS_RULE: &str = "Primary Data Uniqueness";
pub const JSONAPI_OBJECT_RULE: &str = "JSON:API Object";

const JSONAPI_OBJECT_MEMBERS: &[&str] = &["version", "ext", "profile", "meta"];

/// How the linkage analyzer treats the document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkagePolicy {
    /// Every included resource must be reachable from primary data
    #[default]
    Full,
    /// The request used sparse fieldsets; orphans only warn
    SparseFieldsets,
}

/// Validate a response document with full linkage required
pub fn validate_document(value: &Value, ctx: &ValidationContext) -> FindingSet {
    validate_document_with(value, LinkagePolicy::Full, ctx)
}

/// Validate a response document
pub fn validate_document_with(
    value: &Value,
    policy: LinkagePolicy,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();

    let document = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                STRUCTURE_RULE,
                format!("A document must be a JSON object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    findings.append(check_envelope(document, ctx));

    if let Some(data) = document.get("data") {
        findings.append(validate_primary_data(data, &ctx.child("data")));
    }
    if let Some(errors) = document.get("errors") {
        findings.append(validate_errors(errors, &ctx.child("errors")));
    }
    if let Some(included) = document.get("included") {
        findings.append(validate_included(document.get("data"), included, policy, ctx));
    }
    if let Some(links) = document.get("links") {
        findings.append(validate_links_object(links, None, &ctx.child("links")));
    }
    if let Some(jsonapi) = document.get("jsonapi") {
        findings.append(validate_jsonapi_object(jsonapi, &ctx.child("jsonapi")));
    }
    if let Some(meta) = document.get("meta") {
        findings.append(validate_meta(meta, &ctx.child("meta")));
    }

    findings
}

/// Envelope invariants: exclusivity, required members, whitelist, `included` needs `data`
pub fn check_envelope(document: &Map<String, Value>, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    let has_data = document.contains_key("data");
    let has_errors = document.contains_key("errors");

    if has_data && has_errors {
        findings.fail(
            EXCLUSIVITY_RULE,
            "'data' and 'errors' must not coexist in the same document",
            ctx,
        );
    } else {
        findings.pass(EXCLUSIVITY_RULE, "'data' and 'errors' are not both present", ctx);
    }

    if has_data || has_errors || document.contains_key("meta") {
        findings.pass(STRUCTURE_RULE, "Document contains a required top-level member", ctx);
    } else {
        findings.fail(
            STRUCTURE_RULE,
            "A document must contain at least one of 'data', 'errors' or 'meta'",
            ctx,
        );
    }

    for key in document.keys() {
        if TOP_LEVEL_MEMBERS.contains(&key.as_str()) {
            continue;
        }
        if is_extension_member(key) {
            continue;
        }
        findings.fail(
            TOP_LEVEL_RULE,
            format!(
                "Member '{}' is not allowed at the top level (allowed: {})",
                key,
                TOP_LEVEL_MEMBERS.join(", ")
            ),
            &ctx.child(key),
        );
    }

    if document.contains_key("included") && !has_data {
        findings.fail(
            INCLUDED_RULE,
            "'included' must not be present without 'data'",
            &ctx.child("included"),
        );
    }

    findings
}

/// `namespace:member`, both halves valid member names
fn is_extension_member(key: &str) -> bool {
    match key.split_once(':') {
        Some((namespace, member)) => {
            check_member_name(namespace, MemberKind::General).is_ok()
                && check_member_name(member, MemberKind::General).is_ok()
        }
        None => false,
    }
}

/// Validate primary `data`
pub fn validate_primary_data(data: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    match PrimaryData::classify(data) {
        PrimaryData::Null => findings.pass(PRIMARY_DATA_RULE, "Primary data is null", ctx),
        PrimaryData::Single(resource) => findings.append(validate_resource(resource, ctx)),
        PrimaryData::Collection(resources) => {
            for (i, resource) in resources.iter().enumerate() {
                findings.append(validate_resource(resource, &ctx.child_index(i)));
            }
            findings.append(check_primary_uniqueness(resources, ctx));
        }
        PrimaryData::Invalid(other) => findings.fail(
            PRIMARY_DATA_RULE,
            format!(
                "Primary data must be null, a resource object or an array of resource objects, found {}",
                ValueKind::of(other)
            ),
            ctx,
        ),
    }

    findings
}

fn check_primary_uniqueness(resources: &[Value], ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    let mut seen: HashMap<ResourceIdentifier, usize> = HashMap::with_capacity(resources.len());

    for (i, resource) in resources.iter().enumerate() {
        let Some(key) = ResourceIdentifier::from_value(resource) else {
            continue;
        };
        if let Some(first) = seen.get(&key) {
            findings.fail(
                PRIMARY_UNIQUENESS_RULE,
                format!(
                    "Resource {} at index {} repeats the resource at index {}",
                    key, i, first
                ),
                &ctx.child_index(i),
            );
        } else {
            seen.insert(key, i);
        }
    }

    if findings.is_empty() {
        findings.pass(
            PRIMARY_UNIQUENESS_RULE,
            format!("All {} primary resource(s) are unique", resources.len()),
            ctx,
        );
    }
    findings
}

fn validate_included(
    data: Option<&Value>,
    included: &Value,
    policy: LinkagePolicy,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();
    let included_ctx = ctx.child("included");

    let resources = match included {
        Value::Array(items) => items,
        other => {
            findings.fail(
                INCLUDED_RULE,
                format!("'included' must be an array, found {}", ValueKind::of(other)),
                &included_ctx,
            );
            return findings;
        }
    };

    // Included resources are never client-created, so they always need an id
    let strict_ctx = included_ctx.with_allow_missing_id(false);
    for (i, resource) in resources.iter().enumerate() {
        findings.append(validate_resource(resource, &strict_ctx.child_index(i)));
    }

    if let Some(data) = data {
        findings.append(analyze_linkage(
            data,
            resources,
            policy == LinkagePolicy::SparseFieldsets,
            ctx,
        ));
    }
    findings
}

/// Validate the `jsonapi` object
pub fn validate_jsonapi_object(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let jsonapi = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                JSONAPI_OBJECT_RULE,
                format!("'jsonapi' must be an object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    findings.append(check_allowed_members(
        jsonapi,
        JSONAPI_OBJECT_MEMBERS,
        JSONAPI_OBJECT_RULE,
        "jsonapi object",
        ctx,
    ));

    match jsonapi.get("version") {
        None => {}
        Some(Value::String(version)) if SUPPORTED_VERSIONS.contains(&version.as_str()) => {
            findings.pass(
                JSONAPI_OBJECT_RULE,
                format!("JSON:API version {}", version),
                &ctx.child("version"),
            )
        }
        Some(Value::String(version)) => findings.fail(
            JSONAPI_OBJECT_RULE,
            format!(
                "Unsupported JSON:API version '{}' (supported: {})",
                version,
                SUPPORTED_VERSIONS.join(", ")
            ),
            &ctx.child("version"),
        ),
        Some(other) => findings.fail(
            JSONAPI_OBJECT_RULE,
            format!("'version' must be a string, found {}", ValueKind::of(other)),
            &ctx.child("version"),
        ),
    }

    for member in ["ext", "profile"] {
        if let Some(uris) = jsonapi.get(member) {
            findings.append(check_uri_array(member, uris, &ctx.child(member)));
        }
    }

    if let Some(meta) = jsonapi.get("meta") {
        findings.append(validate_meta(meta, &ctx.child("meta")));
    }

    findings
}

fn check_uri_array(member: &str, value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let Value::Array(items) = value else {
        findings.fail(
            JSONAPI_OBJECT_RULE,
            format!("'{}' must be an array of URIs, found {}", member, ValueKind::of(value)),
            ctx,
        );
        return findings;
    };

    for (i, item) in items.iter().enumerate() {
        let is_absolute = item.as_str().map(|s| Url::parse(s).is_ok()).unwrap_or(false);
        if !is_absolute {
            findings.fail(
                JSONAPI_OBJECT_RULE,
                format!("'{}' entries must be absolute URIs, found {}", member, item),
                &ctx.child_index(i),
            );
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> ValidationContext {
        ValidationContext::new()
    }

    #[test]
    fn test_data_and_errors_exclusive() {
        let doc = json!({"data": null, "errors": [{"status": "400"}]});
        let findings = validate_document(&doc, &root());
        let exclusivity: Vec<_> = findings
            .with_rule(EXCLUSIVITY_RULE)
            .filter(|f| f.is_failure())
            .collect();
        assert_eq!(exclusivity.len(), 1);
    }

    #[test]
    fn test_requires_top_level_member() {
        let findings = validate_document(&json!({"links": {"self": "/x"}}), &root());
        assert!(findings.with_rule(STRUCTURE_RULE).any(|f| f.is_failure()));
    }

    #[test]
    fn test_unknown_member_and_extension_member() {
        let findings = validate_document(
            &json!({"meta": {"count": 1}, "extra": 1, "atomic:operations": []}),
            &root(),
        );
        let failures: Vec<_> = findings.with_rule(TOP_LEVEL_RULE).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].pointer(), "/extra");
    }

    #[test]
    fn test_included_requires_data() {
        let findings = validate_document(&json!({"meta": {}, "included": []}), &root());
        assert!(findings.with_rule(INCLUDED_RULE).any(|f| f.is_failure()));
    }

    #[test]
    fn test_primary_uniqueness() {
        let doc = json!({"data": [
            {"type": "articles", "id": "1"},
            {"type": "articles", "id": "1"}
        ]});
        let findings = validate_document(&doc, &root());
        let failure = findings
            .with_rule(PRIMARY_UNIQUENESS_RULE)
            .find(|f| f.is_failure())
            .unwrap();
        assert_eq!(failure.pointer(), "/data/1");
    }

    #[test]
    fn test_jsonapi_version() {
        let ok = validate_jsonapi_object(&json!({"version": "1.1"}), &root());
        assert!(!ok.has_failures());
        let bad = validate_jsonapi_object(&json!({"version": "2.0"}), &root());
        assert!(bad.has_failures());
        let ext = validate_jsonapi_object(&json!({"ext": ["relative/ext"]}), &root());
        assert!(ext.has_failures());
    }

    #[test]
    fn test_included_resources_need_id() {
        let doc = json!({
            "data": {"type": "articles", "id": "1",
                "relationships": {"author": {"data": {"type": "people", "id": "9"}}}},
            "included": [{"type": "people"}]
        });
        let relaxed = root().with_allow_missing_id(true);
        let findings = validate_document(&doc, &relaxed);
        let failure = findings.failures().next().unwrap();
        assert_eq!(failure.pointer(), "/included/0");
    }

    #[test]
    fn test_compound_document_passes() {
        let doc = json!({
            "data": [{
                "type": "articles",
                "id": "1",
                "attributes": {"title": "JSON:API paints my bikeshed!"},
                "relationships": {
                    "author": {"data": {"type": "people", "id": "9"}},
                    "comments": {"data": [{"type": "comments", "id": "5"}]}
                }
            }],
            "included": [
                {"type": "people", "id": "9", "attributes": {"name": "Dan"}},
                {"type": "comments", "id": "5", "attributes": {"body": "First!"}}
            ],
            "links": {"self": "http://example.com/articles"},
            "jsonapi": {"version": "1.1"}
        });
        let findings = validate_document(&doc, &root());
        assert!(!findings.has_failures(), "{:#?}", findings);
    }
}
