//! Regrouping of findings for consumers
//!
//! Findings are bucketed by keyword matches on their rule name and counted
//! into a severity histogram (`passed` is reported as `info`, `failed` as
//! `error`). Rendering the groups is left to the caller.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::finding::{Finding, FindingSet, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Report bucket of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    ContentType,
    DocumentStructure,
    Resource,
    Relationship,
    Error,
    Query,
    Fieldset,
    Pagination,
    #[serde(rename = "request format")]
    RequestFormat,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::ContentType => "content-type",
            Category::DocumentStructure => "document-structure",
            Category::Resource => "resource",
            Category::Relationship => "relationship",
            Category::Error => "error",
            Category::Query => "query",
            Category::Fieldset => "fieldset",
            Category::Pagination => "pagination",
            Category::RequestFormat => "request format",
        };
        f.write_str(name)
    }
}

/// Keyword table, first match wins
const KEYWORDS: &[(&[&str], Category)] = &[
    (&["content-type", "accept", "vary", "media type"], Category::ContentType),
    (&["fieldset"], Category::Fieldset),
    (&["pagination"], Category::Pagination),
    (&["request "], Category::RequestFormat),
    (
        &["exclusivity", "document", "top-level", "primary data", "json:api", "body"],
        Category::DocumentStructure,
    ),
    (&["error"], Category::Error),
    (&["relationship", "linkage"], Category::Relationship),
    (&["query", "sort"], Category::Query),
    (&["resource", "attribute", "meta", "identifier"], Category::Resource),
    (&["link", "member"], Category::DocumentStructure),
];

/// Bucket a rule name
///
/// ```rust
/// use jsonapi_audit_core::report::{categorize, Category};
///
/// assert_eq!(categorize("Data and Errors Exclusivity"), Category::DocumentStructure);
/// assert_eq!(categorize("Error Status"), Category::Error);
/// assert_eq!(categorize("HTTP Status Code"), Category::RequestFormat);
/// ```
pub fn categorize(rule: &str) -> Category {
    let rule = rule.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| rule.contains(k)))
        .map(|(_, category)| *category)
        .unwrap_or(Category::RequestFormat)
}

/// Findings grouped by category, each group in original order
pub fn group_by_category(findings: &FindingSet) -> BTreeMap<Category, Vec<&Finding>> {
    let mut groups: BTreeMap<Category, Vec<&Finding>> = BTreeMap::new();
    for finding in findings {
        groups.entry(categorize(&finding.rule)).or_default().push(finding);
    }
    groups
}

/// Counts per reporting level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityHistogram {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
}

pub fn severity_histogram(findings: &FindingSet) -> SeverityHistogram {
    findings
        .iter()
        .fold(SeverityHistogram::default(), |mut histogram, finding| {
            match finding.severity {
                Severity::Passed => histogram.info += 1,
                Severity::Warning => histogram.warning += 1,
                Severity::Failed => histogram.error += 1,
            }
            histogram
        })
}
