//! Error object validation
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::FindingSet;
use crate::kind::ValueKind;
use crate::pointer::check_pointer;
use crate::rules::{status_code_pattern, ERROR_LINK_MEMBERS, ERROR_MEMBERS, ERROR_SOURCE_MEMBERS};
use crate::validation::links::validate_links_object;
use crate::validation::resource::{check_allowed_members, validate_meta};
use serde_json::{Map, Value};

pub const ERRORS_RULE: &str = "Errors Array";
pub const ERROR_OBJECT_RULE: &str = "Error Object";
pub const ERROR_STATUS_RULE: &str = "Error Status";
pub const ERROR_SOURCE_RULE: &str = "Error Source";

/// Validate the top-level `errors` member
pub fn validate_errors(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let errors = match value {
        Value::Array(items) => items,
        other => {
            findings.fail(
                ERRORS_RULE,
                format!("'errors' must be an array, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    if errors.is_empty() {
        findings.warn(ERRORS_RULE, "'errors' is an empty array", ctx);
        return findings;
    }

    for (i, error) in errors.iter().enumerate() {
        findings.append(validate_error_object(error, &ctx.child_index(i)));
    }
    findings
}

/// Validate one error object
pub fn validate_error_object(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let error = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                ERROR_OBJECT_RULE,
                format!("Error object must be an object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    findings.append(check_allowed_members(
        error,
        ERROR_MEMBERS,
        ERROR_OBJECT_RULE,
        "error object",
        ctx,
    ));
    findings.append(check_string_members(error, &["id", "code", "title", "detail"], ctx));

    if let Some(status) = error.get("status") {
        findings.append(validate_error_status(status, &ctx.child("status")));
    }
    if let Some(source) = error.get("source") {
        findings.append(validate_source(source, &ctx.child("source")));
    }
    if let Some(links) = error.get("links") {
        findings.append(validate_links_object(
            links,
            Some(ERROR_LINK_MEMBERS),
            &ctx.child("links"),
        ));
    }
    if let Some(meta) = error.get("meta") {
        findings.append(validate_meta(meta, &ctx.child("meta")));
    }

    if !findings.has_failures() {
        findings.pass(ERROR_OBJECT_RULE, "Error object is well formed", ctx);
    }
    findings
}

fn check_string_members(
    error: &Map<String, Value>,
    members: &[&str],
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();
    for member in members {
        match error.get(*member) {
            None | Some(Value::String(_)) => {}
            Some(other) => findings.fail(
                ERROR_OBJECT_RULE,
                format!("'{}' must be a string, found {}", member, ValueKind::of(other)),
                &ctx.child(member),
            ),
        }
    }
    findings
}

/// Validate an error `status`: a three-digit string
pub fn validate_error_status(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    match value {
        Value::String(status) if status_code_pattern().is_match(status) => {
            findings.pass(ERROR_STATUS_RULE, format!("Status '{}' is valid", status), ctx)
        }
        Value::String(status) => findings.fail(
            ERROR_STATUS_RULE,
            format!("Status '{}' must be a three-digit HTTP status code", status),
            ctx,
        ),
        Value::Number(n) => findings.fail(
            ERROR_STATUS_RULE,
            format!("Status must be a string such as \"{}\", not a number", n),
            ctx,
        ),
        other => findings.fail(
            ERROR_STATUS_RULE,
            format!("Status must be a string, found {}", ValueKind::of(other)),
            ctx,
        ),
    }
    findings
}

/// Validate an error `source` object
pub fn validate_source(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let source = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                ERROR_SOURCE_RULE,
                format!("'source' must be an object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    findings.append(check_allowed_members(
        source,
        ERROR_SOURCE_MEMBERS,
        ERROR_SOURCE_RULE,
        "error source",
        ctx,
    ));

    if !ERROR_SOURCE_MEMBERS.iter().any(|m| source.contains_key(*m)) {
        findings.fail(
            ERROR_SOURCE_RULE,
            "'source' must contain 'pointer', 'parameter' or 'header'",
            ctx,
        );
    }

    if let Some(pointer) = source.get("pointer") {
        let pointer_ctx = ctx.child("pointer");
        match pointer {
            Value::String(p) => match check_pointer(p) {
                Ok(()) => findings.pass(
                    ERROR_SOURCE_RULE,
                    format!("'{}' is a well-formed JSON Pointer", p),
                    &pointer_ctx,
                ),
                Err(e) => findings.fail(
                    ERROR_SOURCE_RULE,
                    format!("Invalid JSON Pointer '{}': {}", p, e),
                    &pointer_ctx,
                ),
            },
            other => findings.fail(
                ERROR_SOURCE_RULE,
                format!("'pointer' must be a string, found {}", ValueKind::of(other)),
                &pointer_ctx,
            ),
        }
    }

    for member in ["parameter", "header"] {
        match source.get(member) {
            None | Some(Value::String(_)) => {}
            Some(other) => findings.fail(
                ERROR_SOURCE_RULE,
                format!("'{}' must be a string, found {}", member, ValueKind::of(other)),
                &ctx.child(member),
            ),
        }
    }

    findings
}
