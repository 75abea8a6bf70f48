//! Sparse fieldset compliance
//!
//! When a client asks for `fields[T]=a,b`, every resource of type `T` in the
//! response may expose only `a` and `b` among its attributes and
//! relationships.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::FindingSet;
use crate::types::PrimaryData;
use serde_json::Value;
use std::collections::BTreeMap;

pub const FIELDSET_RULE: &str = "Sparse Fieldset Compliance";

/// Check every resource in `data` and `included` against the requested fieldsets
pub fn check_sparse_fieldsets(
    fieldsets: &BTreeMap<String, Vec<String>>,
    document: &Value,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();
    let mut checked = 0usize;

    let data_ctx = ctx.child("data");
    let mut located: Vec<(&Value, ValidationContext)> = Vec::new();
    if let Some(data) = document.get("data") {
        match PrimaryData::classify(data) {
            PrimaryData::Single(resource) => located.push((resource, data_ctx)),
            PrimaryData::Collection(items) => located.extend(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, resource)| (resource, data_ctx.child_index(i))),
            ),
            PrimaryData::Null | PrimaryData::Invalid(_) => {}
        }
    }
    if let Some(Value::Array(included)) = document.get("included") {
        let included_ctx = ctx.child("included");
        located.extend(
            included
                .iter()
                .enumerate()
                .map(|(i, resource)| (resource, included_ctx.child_index(i))),
        );
    }

    for (resource, resource_ctx) in located {
        let Some(resource_type) = resource.get("type").and_then(Value::as_str) else {
            continue;
        };
        let Some(allowed) = fieldsets.get(resource_type) else {
            continue;
        };
        checked += 1;

        for section in ["attributes", "relationships"] {
            let Some(Value::Object(fields)) = resource.get(section) else {
                continue;
            };
            for name in fields.keys().filter(|name| !allowed.contains(name)) {
                findings.fail(
                    FIELDSET_RULE,
                    format!(
                        "Field '{}' of {} was not requested by fields[{}]={}",
                        name,
                        resource_type,
                        resource_type,
                        allowed.join(",")
                    ),
                    &resource_ctx.child(section).child(name),
                );
            }
        }
    }

    if findings.is_empty() {
        findings.pass(
            FIELDSET_RULE,
            format!("{} resource(s) respect the requested sparse fieldsets", checked),
            ctx,
        );
    }
    findings
}
