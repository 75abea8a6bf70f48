//! Request document validation
//!
//! Rules that depend on the HTTP method: creation may omit `id`, updates
//! may not, relationship endpoints take bare resource linkage, and fields
//! configured as read-only must not be sent at all.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::config::ClientIdPolicy;
use crate::context::ValidationContext;
use crate::finding::FindingSet;
use crate::kind::ValueKind;
use crate::types::{Linkage, Method};
use crate::validation::links::check_url;
use crate::validation::resource::{validate_linkage, validate_resource};
use serde_json::{Map, Value};

pub const REQUEST_DOCUMENT_RULE: &str = "Request Document";
pub const CLIENT_ID_RULE: &str = "Request Client-Generated ID";
pub const READ_ONLY_RULE: &str = "Request Read-Only Fields";
pub const RELATIONSHIP_ENDPOINT_RULE: &str = "Request Relationship Linkage";

/// Name of the relationship addressed by a `.../relationships/<name>` URL
pub fn relationship_endpoint(request_url: &str) -> Option<String> {
    let url = check_url(request_url).ok()?;
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [.., "relationships", name] => Some((*name).to_string()),
        _ => None,
    }
}

/// Validate the body a client sent
pub fn validate_request_document(
    method: &Method,
    request_url: &str,
    body: &Value,
    client_ids: ClientIdPolicy,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();

    if !method.sends_document() {
        findings.warn(
            REQUEST_DOCUMENT_RULE,
            format!("{} requests should not carry a body", method),
            ctx,
        );
        return findings;
    }

    let document = match body {
        Value::Object(map) => map,
        other => {
            findings.fail(
                REQUEST_DOCUMENT_RULE,
                format!("Request document must be a JSON object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    if let Some(relationship) = relationship_endpoint(request_url) {
        findings.append(validate_relationship_request(method, &relationship, document, ctx));
        return findings;
    }

    if *method == Method::Delete {
        findings.warn(
            REQUEST_DOCUMENT_RULE,
            "DELETE on a resource endpoint should not carry a request document",
            ctx,
        );
        return findings;
    }

    if document.contains_key("errors") {
        findings.fail(
            REQUEST_DOCUMENT_RULE,
            "Request documents must not contain 'errors'",
            &ctx.child("errors"),
        );
    }
    if document.contains_key("included") {
        findings.warn(
            REQUEST_DOCUMENT_RULE,
            "'included' in a request document is only meaningful with an extension",
            &ctx.child("included"),
        );
    }

    let data_ctx = ctx.child("data");
    let resource = match document.get("data") {
        None => {
            findings.fail(REQUEST_DOCUMENT_RULE, "Request document must contain 'data'", ctx);
            return findings;
        }
        Some(Value::Object(resource)) => resource,
        Some(other) => {
            findings.fail(
                REQUEST_DOCUMENT_RULE,
                format!(
                    "{} request 'data' must be a single resource object, found {}",
                    method,
                    ValueKind::of(other)
                ),
                &data_ctx,
            );
            return findings;
        }
    };
    let data = &document["data"];

    match method {
        Method::Post => {
            findings.append(validate_resource(data, &data_ctx.with_allow_missing_id(true)));
            findings.append(check_client_id(resource, client_ids, &data_ctx));
        }
        Method::Patch | Method::Put => {
            if *method == Method::Put {
                findings.warn(
                    REQUEST_DOCUMENT_RULE,
                    "JSON:API defines PATCH for updates; PUT is validated with PATCH semantics",
                    ctx,
                );
            }
            findings.append(validate_resource(data, &data_ctx.with_allow_missing_id(false)));
        }
        _ => {}
    }

    findings.append(check_read_only_fields(resource, &data_ctx));

    if !findings.has_failures() {
        findings.pass(
            REQUEST_DOCUMENT_RULE,
            format!("{} request document is well formed", method),
            ctx,
        );
    }
    findings
}

fn check_client_id(
    resource: &Map<String, Value>,
    policy: ClientIdPolicy,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();
    match (resource.get("id"), policy) {
        (Some(_), ClientIdPolicy::Forbidden) => findings.fail(
            CLIENT_ID_RULE,
            "Server does not accept client-generated ids, but the request supplies 'id'",
            &ctx.child("id"),
        ),
        (Some(_), ClientIdPolicy::Allowed) => {
            findings.pass(CLIENT_ID_RULE, "Client-generated id supplied", &ctx.child("id"))
        }
        (None, _) => findings.pass(CLIENT_ID_RULE, "Server will assign the resource id", ctx),
    }
    findings
}

fn check_read_only_fields(resource: &Map<String, Value>, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    for section in ["attributes", "relationships"] {
        let Some(Value::Object(fields)) = resource.get(section) else {
            continue;
        };
        for name in fields.keys().filter(|name| ctx.is_read_only(name)) {
            findings.fail(
                READ_ONLY_RULE,
                format!("Read-only field '{}' must not be sent by the client", name),
                &ctx.child(section).child(name),
            );
        }
    }

    findings
}

fn validate_relationship_request(
    method: &Method,
    relationship: &str,
    document: &Map<String, Value>,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();

    let Some(data) = document.get("data") else {
        findings.fail(
            RELATIONSHIP_ENDPOINT_RULE,
            format!("Request to relationship '{}' must contain 'data'", relationship),
            ctx,
        );
        return findings;
    };
    let data_ctx = ctx.child("data");

    if ctx.is_read_only(relationship) {
        findings.fail(
            READ_ONLY_RULE,
            format!("Relationship '{}' is read-only", relationship),
            &data_ctx,
        );
    }

    findings.append(validate_linkage(data, &data_ctx));

    let is_to_many = matches!(Linkage::classify(data), Linkage::ToMany(_));
    if matches!(method, Method::Post | Method::Delete) && !is_to_many {
        findings.fail(
            RELATIONSHIP_ENDPOINT_RULE,
            format!(
                "{} to relationship '{}' requires an array of resource identifiers",
                method, relationship
            ),
            &data_ctx,
        );
    }

    if !findings.has_failures() {
        findings.pass(
            RELATIONSHIP_ENDPOINT_RULE,
            format!("Linkage for relationship '{}' is well formed", relationship),
            &data_ctx,
        );
    }
    findings
}
