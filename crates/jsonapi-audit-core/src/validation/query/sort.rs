//! Sort order verification
//!
//! The declared `sort` is compared against the order the server actually
//! returned, one adjacent pair at a time. Nothing is ever re-sorted; a pair
//! is decided by the first sort field whose values are comparable.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::{Finding, FindingSet};
use crate::validation::member_name::{check_member_path, MemberNameError};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;
use tracing::trace;

pub const SORT_ORDER_RULE: &str = "Sort Order";
pub const SORT_STABILITY_RULE: &str = "Sort Stability";

/// One field of a `sort` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub path: String,
    pub descending: bool,
}

impl SortField {
    fn direction(&self) -> &'static str {
        if self.descending {
            "descending"
        } else {
            "ascending"
        }
    }
}

/// Why a `sort` value was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    #[error("sort field at position {0} is empty")]
    EmptyField(usize),

    #[error("invalid sort field '{field}': {source}")]
    InvalidField {
        field: String,
        #[source]
        source: MemberNameError,
    },
}

/// Parse a `sort` value such as `-created,title`
pub fn parse_sort(value: &str) -> Result<Vec<SortField>, SortError> {
    value
        .split(',')
        .enumerate()
        .map(|(position, raw)| {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(SortError::EmptyField(position));
            }
            let (path, descending) = match raw.strip_prefix('-') {
                Some(path) => (path, true),
                None => (raw, false),
            };
            check_member_path(path).map_err(|source| SortError::InvalidField {
                field: raw.to_string(),
                source,
            })?;
            Ok(SortField {
                path: path.to_string(),
                descending,
            })
        })
        .collect()
}

/// Comparable form of a sort value
#[derive(Debug, Clone)]
enum SortKey {
    Number(f64),
    Timestamp(DateTime<FixedOffset>),
    Text(String),
    Bool(bool),
}

impl SortKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(SortKey::Number),
            Value::Bool(b) => Some(SortKey::Bool(*b)),
            Value::String(s) => Some(Self::from_text(s)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn from_text(s: &str) -> Self {
        if let Ok(n) = s.trim().parse::<f64>() {
            if n.is_finite() {
                return SortKey::Number(n);
            }
        }
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
            return SortKey::Timestamp(timestamp);
        }
        SortKey::Text(s.to_lowercase())
    }

    /// `None` when the two keys are of different kinds
    fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b),
            (SortKey::Timestamp(a), SortKey::Timestamp(b)) => Some(a.cmp(b)),
            (SortKey::Text(a), SortKey::Text(b)) => Some(a.cmp(b)),
            (SortKey::Bool(a), SortKey::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Resolve a sort path on a resource: `id`/`type` are resource members,
/// anything else lives under `attributes`
fn resolve<'a>(resource: &'a Value, path: &str) -> Option<&'a Value> {
    if path == "id" || path == "type" {
        return resource.get(path);
    }
    path.split('.')
        .try_fold(resource.get("attributes")?, |current, segment| current.get(segment))
}

/// How one adjacent pair compares under the declared sort
enum PairOutcome<'f> {
    InOrder,
    OutOfOrder(&'f SortField),
    Tied,
}

fn compare_pair<'f>(fields: &'f [SortField], a: &Value, b: &Value) -> PairOutcome<'f> {
    for field in fields {
        let left = resolve(a, &field.path).and_then(SortKey::from_value);
        let right = resolve(b, &field.path).and_then(SortKey::from_value);
        let (Some(left), Some(right)) = (left, right) else {
            continue;
        };
        let ordering = match left.compare(&right) {
            Some(Ordering::Equal) | None => continue,
            Some(ordering) => ordering,
        };
        let expected = if field.descending {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        return if ordering == expected {
            PairOutcome::InOrder
        } else {
            PairOutcome::OutOfOrder(field)
        };
    }
    PairOutcome::Tied
}

/// Verify that `resources` respect the declared sort
///
/// Each out-of-order adjacent pair is one failure located at the second
/// resource. Fully tied pairs produce a single warning when the sort has no
/// `id` tiebreaker.
pub fn verify_sort_order(
    fields: &[SortField],
    resources: &[Value],
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();
    if fields.is_empty() {
        return findings;
    }

    let has_tiebreaker = fields.iter().any(|f| f.path == "id");
    let mut ties = 0usize;

    for (index, pair) in resources.windows(2).enumerate() {
        match compare_pair(fields, &pair[0], &pair[1]) {
            PairOutcome::InOrder => {}
            PairOutcome::Tied => ties += 1,
            PairOutcome::OutOfOrder(field) => findings.push(
                Finding::failed(
                    SORT_ORDER_RULE,
                    format!(
                        "Resources at positions {} and {} violate {} order on '{}'",
                        index,
                        index + 1,
                        field.direction(),
                        field.path
                    ),
                )
                .within(&ctx.child_index(index + 1)),
            ),
        }
    }
    trace!(pairs = resources.len().saturating_sub(1), ties, "sort order compared");

    if ties > 0 && !has_tiebreaker {
        findings.warn(
            SORT_STABILITY_RULE,
            format!(
                "{} adjacent pair(s) tie on every sort field; add 'id' as a tiebreaker for a stable order",
                ties
            ),
            ctx,
        );
    }

    if !findings.has_failures() {
        let declared: Vec<String> = fields
            .iter()
            .map(|f| format!("{}{}", if f.descending { "-" } else { "" }, f.path))
            .collect();
        findings.pass(
            SORT_ORDER_RULE,
            format!("{} resource(s) follow sort={}", resources.len(), declared.join(",")),
            ctx,
        );
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verify(sort: &str, resources: Value) -> FindingSet {
        let fields = parse_sort(sort).unwrap();
        let resources = resources.as_array().cloned().unwrap_or_default();
        verify_sort_order(&fields, &resources, &ValidationContext::new().child("data"))
    }

    #[test]
    fn test_parse_sort() {
        let fields = parse_sort("-created,author.name").unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields[0].descending);
        assert_eq!(fields[1].path, "author.name");
        assert_eq!(parse_sort("a,,b"), Err(SortError::EmptyField(1)));
    }

    #[test]
    fn test_id_ascending_violation() {
        let findings = verify("id", json!([{"id": "2"}, {"id": "1"}]));
        let failures: Vec<_> = findings.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("positions 0 and 1"));
        assert_eq!(failures[0].pointer(), "/data/1");
    }

    #[test]
    fn test_id_descending_passes() {
        let findings = verify("-id", json!([{"id": "2"}, {"id": "1"}]));
        assert_eq!(findings.failures().count(), 0);
    }

    #[test]
    fn test_numeric_strings_compare_numerically() {
        let findings = verify("id", json!([{"id": "9"}, {"id": "10"}]));
        assert!(!findings.has_failures());
    }

    #[test]
    fn test_missing_field_falls_through_to_tiebreaker() {
        let resources = json!([
            {"id": "1", "attributes": {"title": "a"}},
            {"id": "3", "attributes": {}},
            {"id": "2", "attributes": {"title": "b"}}
        ]);
        let findings = verify("title,id", resources);
        assert_eq!(findings.failures().count(), 1);
    }

    #[test]
    fn test_timestamps_and_case_insensitive_text() {
        let dates = json!([
            {"attributes": {"created": "2024-01-01T10:00:00+02:00"}},
            {"attributes": {"created": "2024-01-01T09:30:00Z"}}
        ]);
        assert!(!verify("created", dates).has_failures());

        let names = json!([
            {"id": "1", "attributes": {"name": "alpha"}},
            {"id": "2", "attributes": {"name": "Beta"}}
        ]);
        assert!(!verify("name", names).has_failures());
    }

    #[test]
    fn test_ties_without_tiebreaker_warn_once() {
        let resources = json!([
            {"attributes": {"rank": 1}},
            {"attributes": {"rank": 1}},
            {"attributes": {"rank": 1}}
        ]);
        let findings = verify("rank", resources);
        assert_eq!(findings.with_rule(SORT_STABILITY_RULE).count(), 1);
        assert!(!findings.has_failures());
    }
}
