//! Member-name grammar
//!
//! A member name is valid when it matches `^[a-z0-9]([a-z0-9-_]*[a-z0-9])?$`
//! and has no run of two or more `-`/`_` characters. Attribute and
//! relationship names additionally may not use a reserved word.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::{Finding, FindingSet};
use crate::rules::{consecutive_separator_pattern, member_name_pattern, RESERVED_FIELD_NAMES};
use thiserror::Error;

/// Where a member name appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Attribute,
    Relationship,
    Meta,
    ResourceType,
    /// Any other member name (query fields, fieldset types, ...)
    General,
}

impl MemberKind {
    fn reserves_field_names(self) -> bool {
        matches!(self, MemberKind::Attribute | MemberKind::Relationship)
    }

    /// Rule name used for findings about this kind of name
    pub fn rule(self) -> &'static str {
        match self {
            MemberKind::Attribute => "Attribute Names",
            MemberKind::Relationship => "Relationship Names",
            MemberKind::Meta => "Meta Member Names",
            MemberKind::ResourceType => "Resource Type",
            MemberKind::General => "Member Names",
        }
    }

    fn label(self) -> &'static str {
        match self {
            MemberKind::Attribute => "attribute name",
            MemberKind::Relationship => "relationship name",
            MemberKind::Meta => "meta member name",
            MemberKind::ResourceType => "resource type",
            MemberKind::General => "member name",
        }
    }
}

/// Why a member name was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberNameError {
    #[error("member name must not be empty")]
    Empty,

    #[error("'{0}' must use lowercase letters, digits, '-' or '_' and start and end with a letter or digit")]
    InvalidCharacters(String),

    #[error("'{0}' contains consecutive '-' or '_' characters")]
    ConsecutiveSeparators(String),

    #[error("'{0}' is a reserved name")]
    Reserved(String),
}

/// Pure predicate over a member name
pub fn check_member_name(name: &str, kind: MemberKind) -> Result<(), MemberNameError> {
    if name.is_empty() {
        return Err(MemberNameError::Empty);
    }
    if !member_name_pattern().is_match(name) {
        return Err(MemberNameError::InvalidCharacters(name.to_string()));
    }
    if consecutive_separator_pattern().is_match(name) {
        return Err(MemberNameError::ConsecutiveSeparators(name.to_string()));
    }
    if kind.reserves_field_names() && RESERVED_FIELD_NAMES.contains(&name) {
        return Err(MemberNameError::Reserved(name.to_string()));
    }
    Ok(())
}

/// Validate one name, producing exactly one finding
pub fn validate_member_name(name: &str, kind: MemberKind, ctx: &ValidationContext) -> Finding {
    match check_member_name(name, kind) {
        Ok(()) => Finding::passed(kind.rule(), format!("Valid {}: '{}'", kind.label(), name)),
        Err(err) => Finding::failed(kind.rule(), format!("Invalid {}: {}", kind.label(), err)),
    }
    .within(ctx)
}

/// Validate the keys of a map
///
/// Each rejected key yields a failure located at that key; when every key
/// is valid a single passed finding is emitted for the map.
pub fn validate_member_names<'a, I>(names: I, kind: MemberKind, ctx: &ValidationContext) -> FindingSet
where
    I: IntoIterator<Item = &'a String>,
{
    let mut findings = FindingSet::new();
    let mut count = 0usize;

    for name in names {
        count += 1;
        if let Err(err) = check_member_name(name, kind) {
            findings.fail(
                kind.rule(),
                format!("Invalid {}: {}", kind.label(), err),
                &ctx.child(name),
            );
        }
    }

    if findings.is_empty() {
        findings.pass(
            kind.rule(),
            format!("All {} {} name(s) are valid", count, kind.label().trim_end_matches(" name")),
            ctx,
        );
    }
    findings
}

/// Validate a dot-separated path of member names (`author.name`)
pub fn check_member_path(path: &str) -> Result<(), MemberNameError> {
    if path.is_empty() {
        return Err(MemberNameError::Empty);
    }
    path.split('.')
        .try_for_each(|segment| check_member_name(segment, MemberKind::General))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["articles", "a", "first-name", "first_name", "x1", "9lives"] {
            assert!(check_member_name(name, MemberKind::General).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(check_member_name("", MemberKind::General), Err(MemberNameError::Empty));
        assert!(matches!(
            check_member_name("Title", MemberKind::General),
            Err(MemberNameError::InvalidCharacters(_))
        ));
        assert!(matches!(
            check_member_name("-x", MemberKind::General),
            Err(MemberNameError::InvalidCharacters(_))
        ));
        assert!(matches!(
            check_member_name("first--name", MemberKind::General),
            Err(MemberNameError::ConsecutiveSeparators(_))
        ));
        assert!(matches!(
            check_member_name("a_-b", MemberKind::General),
            Err(MemberNameError::ConsecutiveSeparators(_))
        ));
    }

    #[test]
    fn test_reserved_only_in_field_contexts() {
        assert_eq!(
            check_member_name("links", MemberKind::Attribute),
            Err(MemberNameError::Reserved("links".to_string()))
        );
        assert!(check_member_name("type", MemberKind::Relationship).is_err());
        assert!(check_member_name("links", MemberKind::Meta).is_ok());
        assert!(check_member_name("id", MemberKind::General).is_ok());
    }

    #[test]
    fn test_validate_member_names_reports_each_bad_key() {
        let ctx = ValidationContext::new().child("data").child("attributes");
        let keys = vec!["title".to_string(), "Body".to_string(), "id".to_string()];
        let findings = validate_member_names(keys.iter(), MemberKind::Attribute, &ctx);
        assert_eq!(findings.failures().count(), 2);
        let pointers: Vec<_> = findings.iter().map(|f| f.pointer().to_string()).collect();
        assert_eq!(pointers, vec!["/data/attributes/Body", "/data/attributes/id"]);
    }

    #[test]
    fn test_validate_member_names_single_pass() {
        let ctx = ValidationContext::new().child("meta");
        let keys = vec!["count".to_string(), "page-size".to_string()];
        let findings = validate_member_names(keys.iter(), MemberKind::Meta, &ctx);
        assert_eq!(findings.len(), 1);
        assert!(!findings.has_failures());
    }

    #[test]
    fn test_member_path() {
        assert!(check_member_path("author.name").is_ok());
        assert!(check_member_path("author..name").is_err());
        assert!(check_member_path("").is_err());
    }
}
