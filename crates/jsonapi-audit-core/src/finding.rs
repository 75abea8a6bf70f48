//! Findings: the uniform output of every rule
//!
//! Each check produces exactly one [`Finding`]. Validators return a
//! [`FindingSet`], and sets from sub-validators are combined with
//! [`FindingSet::merge`] (or `extend`) rather than per-validator aggregation
//! logic.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::pointer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The check succeeded
    Passed,
    /// Permitted but discouraged, or not verifiable
    Warning,
    /// A conformance violation
    Failed,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Passed => write!(f, "passed"),
            Severity::Warning => write!(f, "warning"),
            Severity::Failed => write!(f, "failed"),
        }
    }
}

/// Where in the validated value a finding applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// RFC 6901 pointer
    pub pointer: String,
    /// Human-readable rendering of the pointer
    pub description: String,
}

impl Location {
    /// Build a location from a pointer, deriving the description
    pub fn new(pointer: impl Into<String>) -> Self {
        let pointer = pointer.into();
        let description = pointer::describe(&pointer);
        Self {
            pointer,
            description,
        }
    }

    /// Build a location with an explicit description
    pub fn described(pointer: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            description: description.into(),
        }
    }
}

/// A single, immutable rule outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Name of the rule that produced this finding
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Finding {
    pub fn new(rule: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity,
            message: message.into(),
            location: None,
        }
    }

    pub fn passed(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Passed, message)
    }

    pub fn warning(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Warning, message)
    }

    pub fn failed(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Failed, message)
    }

    /// Attach a location derived from a pointer
    pub fn at(mut self, pointer: impl Into<String>) -> Self {
        self.location = Some(Location::new(pointer));
        self
    }

    /// Attach the location of a validation context
    pub fn within(self, ctx: &ValidationContext) -> Self {
        self.at(ctx.pointer())
    }

    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failed
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Pointer of the location, or `""` when the finding has none
    pub fn pointer(&self) -> &str {
        self.location.as_ref().map(|l| l.pointer.as_str()).unwrap_or("")
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.rule, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " (at {})", location.description)?;
        }
        Ok(())
    }
}

/// Counters over a finding set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
}

/// Ordered, append-only sequence of findings for one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FindingSet {
    findings: Vec<Finding>,
}

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Record a passed finding located at the context
    pub fn pass(&mut self, rule: &str, message: impl Into<String>, ctx: &ValidationContext) {
        self.push(Finding::passed(rule, message).within(ctx));
    }

    /// Record a warning located at the context
    pub fn warn(&mut self, rule: &str, message: impl Into<String>, ctx: &ValidationContext) {
        self.push(Finding::warning(rule, message).within(ctx));
    }

    /// Record a failure located at the context
    pub fn fail(&mut self, rule: &str, message: impl Into<String>, ctx: &ValidationContext) {
        self.push(Finding::failed(rule, message).within(ctx));
    }

    /// Append every finding of another set
    pub fn append(&mut self, other: FindingSet) {
        self.findings.extend(other.findings);
    }

    /// Concatenate two sets, preserving order
    pub fn merge(mut self, other: FindingSet) -> FindingSet {
        self.findings.extend(other.findings);
        self
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.findings.iter()
    }

    pub fn as_slice(&self) -> &[Finding] {
        &self.findings
    }

    pub fn into_vec(self) -> Vec<Finding> {
        self.findings
    }

    /// Findings produced by the named rule
    pub fn with_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.rule == rule)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_failure())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_warning())
    }

    pub fn has_failures(&self) -> bool {
        self.findings.iter().any(Finding::is_failure)
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.findings.len(),
            ..Summary::default()
        };
        for finding in &self.findings {
            match finding.severity {
                Severity::Passed => summary.passed += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

impl Extend<Finding> for FindingSet {
    fn extend<T: IntoIterator<Item = Finding>>(&mut self, iter: T) {
        self.findings.extend(iter);
    }
}

impl Extend<FindingSet> for FindingSet {
    fn extend<T: IntoIterator<Item = FindingSet>>(&mut self, iter: T) {
        for set in iter {
            self.findings.extend(set.findings);
        }
    }
}

impl FromIterator<Finding> for FindingSet {
    fn from_iter<T: IntoIterator<Item = Finding>>(iter: T) -> Self {
        Self {
            findings: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<FindingSet> for FindingSet {
    fn from_iter<T: IntoIterator<Item = FindingSet>>(iter: T) -> Self {
        iter.into_iter().fold(FindingSet::new(), FindingSet::merge)
    }
}

impl From<Finding> for FindingSet {
    fn from(finding: Finding) -> Self {
        Self {
            findings: vec![finding],
        }
    }
}

impl IntoIterator for FindingSet {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.into_iter()
    }
}

impl<'a> IntoIterator for &'a FindingSet {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}
