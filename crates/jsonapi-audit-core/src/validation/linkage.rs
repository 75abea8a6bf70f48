//! Compound document linkage analysis
//!
//! Three independent passes over primary data and `included`, each linear
//! in resources plus relationship edges and built on hash maps scoped to
//! the call:
//!
//! 1. duplicates: each `(type,id)` may appear once across the document
//! 2. linkage: every included resource must be reachable from primary data
//!    (orphans fail); every identifier referenced by primary data should be
//!    included (unfulfilled linkage only warns, as omission is permitted)
//! 3. topology: edge and bidirectional-pair counts, informational only
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::FindingSet;
use crate::types::{relationship_targets, Linkage, PrimaryData, ResourceIdentifier};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::trace;

pub const DUPLICATE_RULE: &str = "Included Resource Uniqueness";
pub const ORPHAN_RULE: &str = "Included Resource Linkage";
pub const UNFULFILLED_RULE: &str = "Relationship Linkage Fulfillment";
pub const TOPOLOGY_RULE: &str = "Relationship Topology";

/// Run all three linkage passes
///
/// `sparse_fieldsets` downgrades orphans to warnings: a client that asked for
/// sparse fieldsets may have excluded the relationships that link them.
pub fn analyze_linkage(
    primary: &Value,
    included: &[Value],
    sparse_fieldsets: bool,
    ctx: &ValidationContext,
) -> FindingSet {
    check_duplicates(primary, included, ctx)
        .merge(check_full_linkage(primary, included, sparse_fieldsets, ctx))
        .merge(describe_topology(primary, included, ctx))
}

/// Primary resources paired with their context
fn primary_resources<'a>(
    primary: &'a Value,
    ctx: &ValidationContext,
) -> Vec<(&'a Value, ValidationContext)> {
    let data_ctx = ctx.child("data");
    match PrimaryData::classify(primary) {
        PrimaryData::Single(resource) => vec![(resource, data_ctx)],
        PrimaryData::Collection(items) => items
            .iter()
            .enumerate()
            .map(|(i, resource)| (resource, data_ctx.child_index(i)))
            .collect(),
        PrimaryData::Null | PrimaryData::Invalid(_) => Vec::new(),
    }
}

/// Identifiers referenced by one resource, with the pointer of each reference
fn located_targets(resource: &Value, ctx: &ValidationContext) -> Vec<(ResourceIdentifier, String)> {
    let Some(relationships) = resource.get("relationships").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut targets = Vec::new();
    for (name, relationship) in relationships {
        let Some(data) = relationship.get("data") else {
            continue;
        };
        let data_ctx = ctx.child("relationships").child(name).child("data");
        match Linkage::classify(data) {
            Linkage::ToOne(identifier) => {
                if let Some(key) = ResourceIdentifier::from_value(identifier) {
                    targets.push((key, data_ctx.pointer().to_string()));
                }
            }
            Linkage::ToMany(identifiers) => {
                for (i, identifier) in identifiers.iter().enumerate() {
                    if let Some(key) = ResourceIdentifier::from_value(identifier) {
                        targets.push((key, data_ctx.child_index(i).pointer().to_string()));
                    }
                }
            }
            Linkage::Empty | Linkage::Invalid(_) => {}
        }
    }
    targets
}

/// Pass 1: one failure per repeated `(type,id)` in `included`
pub fn check_duplicates(primary: &Value, included: &[Value], ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    let included_ctx = ctx.child("included");

    let primary_keys: HashMap<ResourceIdentifier, String> = primary_resources(primary, ctx)
        .into_iter()
        .filter_map(|(resource, rctx)| {
            ResourceIdentifier::from_value(resource).map(|key| (key, rctx.pointer().to_string()))
        })
        .collect();

    let mut seen: HashMap<ResourceIdentifier, usize> = HashMap::with_capacity(included.len());
    for (index, resource) in included.iter().enumerate() {
        let Some(key) = ResourceIdentifier::from_value(resource) else {
            continue;
        };
        let entry_ctx = included_ctx.child_index(index);

        if let Some(pointer) = primary_keys.get(&key) {
            findings.fail(
                DUPLICATE_RULE,
                format!(
                    "Included resource {} at index {} duplicates primary data at {}",
                    key, index, pointer
                ),
                &entry_ctx,
            );
        } else if let Some(first) = seen.get(&key) {
            findings.fail(
                DUPLICATE_RULE,
                format!(
                    "Included resource {} at index {} duplicates the resource at index {}",
                    key, index, first
                ),
                &entry_ctx,
            );
        } else {
            seen.insert(key, index);
        }
    }

    if findings.is_empty() {
        findings.pass(
            DUPLICATE_RULE,
            format!("All {} included resource(s) are unique", included.len()),
            &included_ctx,
        );
    }
    findings
}

/// Pass 2: orphaned included resources and unfulfilled primary linkage
pub fn check_full_linkage(
    primary: &Value,
    included: &[Value],
    sparse_fieldsets: bool,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();
    let included_ctx = ctx.child("included");
    let primaries = primary_resources(primary, ctx);

    let primary_keys: HashSet<ResourceIdentifier> = primaries
        .iter()
        .filter_map(|(resource, _)| ResourceIdentifier::from_value(resource))
        .collect();

    let included_index: HashMap<ResourceIdentifier, usize> = included
        .iter()
        .enumerate()
        .filter_map(|(i, resource)| ResourceIdentifier::from_value(resource).map(|key| (key, i)))
        .collect();

    // References from primary data, in document order, first occurrence wins
    let mut referenced: Vec<(ResourceIdentifier, String)> = Vec::new();
    let mut referenced_keys: HashSet<ResourceIdentifier> = HashSet::new();
    for (resource, rctx) in &primaries {
        for (key, pointer) in located_targets(resource, rctx) {
            if referenced_keys.insert(key.clone()) {
                referenced.push((key, pointer));
            }
        }
    }

    // Reachability through included resources, iterative worklist
    let mut reachable: HashSet<ResourceIdentifier> = referenced_keys.clone();
    let mut queue: VecDeque<ResourceIdentifier> = referenced_keys.iter().cloned().collect();
    while let Some(key) = queue.pop_front() {
        let Some(&index) = included_index.get(&key) else {
            continue;
        };
        for target in relationship_targets(&included[index]) {
            if reachable.insert(target.clone()) {
                queue.push_back(target);
            }
        }
    }
    trace!(reachable = reachable.len(), included = included.len(), "linkage reachability computed");

    for (index, resource) in included.iter().enumerate() {
        let Some(key) = ResourceIdentifier::from_value(resource) else {
            continue;
        };
        if reachable.contains(&key) {
            continue;
        }
        let entry_ctx = included_ctx.child_index(index);
        if sparse_fieldsets {
            findings.warn(
                ORPHAN_RULE,
                format!(
                    "Included resource {} is not reachable from primary data; full linkage is not required with sparse fieldsets",
                    key
                ),
                &entry_ctx,
            );
        } else {
            findings.fail(
                ORPHAN_RULE,
                format!(
                    "Included resource {} is not referenced by any relationship reachable from primary data",
                    key
                ),
                &entry_ctx,
            );
        }
    }

    for (key, pointer) in &referenced {
        if included_index.contains_key(key) || primary_keys.contains(key) {
            continue;
        }
        findings.warn(
            UNFULFILLED_RULE,
            format!(
                "Related resource {} is referenced by primary data but not included",
                key
            ),
            &ctx.with_prefix(pointer.clone()),
        );
    }

    if findings.is_empty() {
        findings.pass(
            ORPHAN_RULE,
            format!(
                "Full linkage: {} included resource(s), {} referenced identifier(s)",
                included.len(),
                referenced.len()
            ),
            &included_ctx,
        );
    }
    findings
}

/// Pass 3: relationship graph summary; never fails
pub fn describe_topology(primary: &Value, included: &[Value], ctx: &ValidationContext) -> FindingSet {
    let resources: Vec<&Value> = PrimaryData::classify(primary)
        .resources()
        .into_iter()
        .chain(included.iter())
        .collect();

    let nodes: HashSet<ResourceIdentifier> = resources
        .iter()
        .filter_map(|resource| ResourceIdentifier::from_value(resource))
        .collect();

    let mut edge_count = 0usize;
    let mut edges: HashSet<(ResourceIdentifier, ResourceIdentifier)> = HashSet::new();
    for resource in &resources {
        let Some(source) = ResourceIdentifier::from_value(resource) else {
            continue;
        };
        for target in relationship_targets(resource) {
            edge_count += 1;
            edges.insert((source.clone(), target));
        }
    }

    let bidirectional = edges
        .iter()
        .filter(|(from, to)| from != to && edges.contains(&(to.clone(), from.clone())))
        .count()
        / 2;
    let external = edges.iter().filter(|(_, to)| !nodes.contains(to)).count();

    let mut findings = FindingSet::new();
    findings.pass(
        TOPOLOGY_RULE,
        format!(
            "{} resource(s), {} relationship edge(s), {} bidirectional pair(s), {} edge(s) to resources outside the document",
            nodes.len(),
            edge_count,
            bidirectional,
            external
        ),
        ctx,
    );
    findings
}
