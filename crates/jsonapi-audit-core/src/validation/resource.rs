//! Resource object validation
//!
//! Every check runs independently so that one resource can surface several
//! findings: structure, `type`, `id`, attributes, relationships, links and
//! meta are each evaluated even when a sibling check failed.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::FindingSet;
use crate::kind::ValueKind;
use crate::rules::{IDENTIFIER_MEMBERS, RELATIONSHIP_MEMBERS, RESOURCE_MEMBERS};
use crate::types::Linkage;
use crate::validation::links::validate_links_object;
use crate::validation::member_name::{check_member_name, validate_member_names, MemberKind};
use serde_json::{Map, Value};

pub(crate) const STRUCTURE_RULE: &str = "Resource Object Structure";
pub(crate) const TYPE_RULE: &str = "Resource Type";
pub(crate) const ID_RULE: &str = "Resource ID";
const ATTRIBUTES_RULE: &str = "Resource Attributes";
const NAMESPACE_RULE: &str = "Resource Field Namespace";
const META_RULE: &str = "Meta Object";
const RELATIONSHIP_RULE: &str = "Relationship Object";
const LINKAGE_RULE: &str = "Relationship Linkage Shape";
const RELATIONSHIP_LINKS_RULE: &str = "Relationship Links";
const IDENTIFIER_RULE: &str = "Resource Identifier";

/// Validate a resource object
pub fn validate_resource(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let resource = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                STRUCTURE_RULE,
                format!("Resource object must be an object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    findings.append(check_allowed_members(
        resource,
        RESOURCE_MEMBERS,
        STRUCTURE_RULE,
        "resource object",
        ctx,
    ));
    findings.append(check_type(resource, TYPE_RULE, ctx));
    findings.append(check_id(resource, ID_RULE, ctx));

    if let Some(attributes) = resource.get("attributes") {
        findings.append(validate_attributes(attributes, &ctx.child("attributes")));
    }
    if let Some(relationships) = resource.get("relationships") {
        findings.append(validate_relationships(relationships, &ctx.child("relationships")));
    }
    if let (Some(Value::Object(attributes)), Some(Value::Object(relationships))) =
        (resource.get("attributes"), resource.get("relationships"))
    {
        findings.append(check_shared_namespace(attributes, relationships, ctx));
    }
    if let Some(links) = resource.get("links") {
        findings.append(validate_links_object(links, None, &ctx.child("links")));
    }
    if let Some(meta) = resource.get("meta") {
        findings.append(validate_meta(meta, &ctx.child("meta")));
    }

    findings
}

/// Validate a resource identifier object (relationship linkage entry)
pub fn validate_resource_identifier(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let identifier = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                IDENTIFIER_RULE,
                format!("Resource identifier must be an object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    findings.append(check_allowed_members(
        identifier,
        IDENTIFIER_MEMBERS,
        IDENTIFIER_RULE,
        "resource identifier",
        ctx,
    ));
    findings.append(check_type(identifier, IDENTIFIER_RULE, ctx));
    findings.append(check_id(identifier, IDENTIFIER_RULE, ctx));
    if let Some(meta) = identifier.get("meta") {
        findings.append(validate_meta(meta, &ctx.child("meta")));
    }

    findings
}

/// Validate an `attributes` object
pub fn validate_attributes(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let attributes = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                ATTRIBUTES_RULE,
                format!("'attributes' must be an object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    findings.append(validate_member_names(attributes.keys(), MemberKind::Attribute, ctx));

    for name in attributes.keys() {
        if name.ends_with("_id") || name.ends_with("-id") {
            findings.warn(
                ATTRIBUTES_RULE,
                format!(
                    "Attribute '{}' looks like a foreign key; related resources should be exposed as relationships",
                    name
                ),
                &ctx.child(name),
            );
        }
    }

    findings
}

/// Validate a `relationships` object
pub fn validate_relationships(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let relationships = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                RELATIONSHIP_RULE,
                format!("'relationships' must be an object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    findings.append(validate_member_names(relationships.keys(), MemberKind::Relationship, ctx));
    for (name, relationship) in relationships {
        findings.append(validate_relationship(name, relationship, &ctx.child(name)));
    }

    findings
}

/// Validate one relationship object
pub fn validate_relationship(name: &str, value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    let relationship = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                RELATIONSHIP_RULE,
                format!(
                    "Relationship '{}' must be an object, found {}",
                    name,
                    ValueKind::of(other)
                ),
                ctx,
            );
            return findings;
        }
    };

    if !RELATIONSHIP_MEMBERS.iter().any(|m| relationship.contains_key(*m)) {
        findings.fail(
            RELATIONSHIP_RULE,
            format!(
                "Relationship '{}' must contain at least one of 'data', 'links' or 'meta'",
                name
            ),
            ctx,
        );
    }
    findings.append(check_allowed_members(
        relationship,
        RELATIONSHIP_MEMBERS,
        RELATIONSHIP_RULE,
        "relationship object",
        ctx,
    ));

    if let Some(data) = relationship.get("data") {
        findings.append(validate_linkage(data, &ctx.child("data")));
    }

    if let Some(links) = relationship.get("links") {
        let links_ctx = ctx.child("links");
        findings.append(validate_links_object(links, None, &links_ctx));
        if let Value::Object(map) = links {
            if !map.contains_key("self") && !map.contains_key("related") {
                findings.fail(
                    RELATIONSHIP_LINKS_RULE,
                    format!(
                        "Relationship '{}' links must contain 'self' or 'related'",
                        name
                    ),
                    &links_ctx,
                );
            }
        }
    }

    if let Some(meta) = relationship.get("meta") {
        findings.append(validate_meta(meta, &ctx.child("meta")));
    }

    if !findings.has_failures() {
        findings.pass(RELATIONSHIP_RULE, format!("Relationship '{}' is well formed", name), ctx);
    }
    findings
}

/// Validate resource linkage (`null`, an identifier, or an array of identifiers)
pub fn validate_linkage(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    match Linkage::classify(value) {
        Linkage::Empty => {}
        Linkage::ToOne(identifier) => findings.append(validate_resource_identifier(identifier, ctx)),
        Linkage::ToMany(identifiers) => {
            for (i, identifier) in identifiers.iter().enumerate() {
                findings.append(validate_resource_identifier(identifier, &ctx.child_index(i)));
            }
        }
        Linkage::Invalid(other) => findings.fail(
            LINKAGE_RULE,
            format!(
                "Relationship 'data' must be null, a resource identifier or an array of identifiers, found {}",
                ValueKind::of(other)
            ),
            ctx,
        ),
    }

    findings
}

/// Validate a `meta` object: any contents, member-name keys
pub fn validate_meta(value: &Value, ctx: &ValidationContext) -> FindingSet {
    match value {
        Value::Object(meta) => validate_member_names(meta.keys(), MemberKind::Meta, ctx),
        other => {
            let mut findings = FindingSet::new();
            findings.fail(
                META_RULE,
                format!("'meta' must be an object, found {}", ValueKind::of(other)),
                ctx,
            );
            findings
        }
    }
}

pub(crate) fn check_allowed_members(
    map: &Map<String, Value>,
    allowed: &[&str],
    rule: &str,
    what: &str,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            findings.fail(
                rule,
                format!(
                    "Member '{}' is not allowed in a {} (allowed: {})",
                    key,
                    what,
                    allowed.join(", ")
                ),
                &ctx.child(key),
            );
        }
    }
    findings
}

fn check_type(map: &Map<String, Value>, rule: &str, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    let type_ctx = ctx.child("type");

    match map.get("type") {
        None => findings.fail(rule, "Missing required member 'type'", ctx),
        Some(Value::String(resource_type)) => {
            match check_member_name(resource_type, MemberKind::ResourceType) {
                Ok(()) => findings.pass(
                    rule,
                    format!("Resource type '{}' is valid", resource_type),
                    &type_ctx,
                ),
                Err(e) => findings.fail(rule, format!("Invalid 'type': {}", e), &type_ctx),
            }
        }
        Some(other) => findings.fail(
            rule,
            format!("'type' must be a string, found {}", ValueKind::of(other)),
            &type_ctx,
        ),
    }

    findings
}

fn check_id(map: &Map<String, Value>, rule: &str, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    let id_ctx = ctx.child("id");

    if let Some(lid) = map.get("lid") {
        if !lid.is_string() {
            findings.fail(
                rule,
                format!("'lid' must be a string, found {}", ValueKind::of(lid)),
                &ctx.child("lid"),
            );
        }
    }

    match map.get("id") {
        None if ctx.allow_missing_id() => {
            let message = if map.contains_key("lid") {
                "'id' omitted; resource is identified by its local id 'lid'"
            } else {
                "'id' omitted, which is permitted in this context"
            };
            findings.pass(rule, message, ctx);
        }
        None => findings.fail(rule, "Missing required member 'id'", ctx),
        Some(Value::String(id)) if id.is_empty() => {
            findings.fail(rule, "'id' must not be an empty string", &id_ctx)
        }
        Some(Value::String(id)) => {
            findings.pass(rule, format!("Resource id '{}' is present", id), &id_ctx)
        }
        Some(other) => findings.fail(
            rule,
            format!("'id' must be a string, found {}", ValueKind::of(other)),
            &id_ctx,
        ),
    }

    findings
}

fn check_shared_namespace(
    attributes: &Map<String, Value>,
    relationships: &Map<String, Value>,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();
    for name in attributes.keys().filter(|k| relationships.contains_key(*k)) {
        findings.fail(
            NAMESPACE_RULE,
            format!(
                "'{}' is used both as an attribute and as a relationship; fields share one namespace",
                name
            ),
            &ctx.child("relationships").child(name),
        );
    }
    findings
}
