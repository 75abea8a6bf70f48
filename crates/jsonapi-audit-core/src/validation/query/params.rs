//! Query parameter syntax
//!
//! Parameter names follow the bracket grammar `family[segment][segment]`.
//! Families defined by JSON:API (`include`, `fields`, `sort`, `page`,
//! `filter`) have their values checked; any other family is
//! implementation-specific and must contain a character outside `a-z`.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use super::sort::parse_sort;
use super::QueryParameters;
use crate::error::{Error, Result};
use crate::finding::{Finding, FindingSet};
use crate::rules::QUERY_FAMILIES;
use crate::validation::member_name::{check_member_name, check_member_path, MemberKind};
use std::collections::HashSet;

pub const PARAMETER_NAME_RULE: &str = "Query Parameter Names";
pub const INCLUDE_RULE: &str = "Query Include Parameter";
pub const FIELDS_RULE: &str = "Fieldset Parameter Syntax";
pub const SORT_RULE: &str = "Query Sort Parameter";
pub const PAGE_RULE: &str = "Pagination Parameters";
pub const FILTER_RULE: &str = "Query Filter Parameter";

/// A parameter name split into its family and bracketed segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterName {
    pub family: String,
    pub segments: Vec<String>,
}

impl ParameterName {
    /// Parse `family[seg][seg]`
    ///
    /// ```rust
    /// use jsonapi_audit_core::validation::query::ParameterName;
    ///
    /// let name = ParameterName::parse("fields[articles]").unwrap();
    /// assert_eq!(name.family, "fields");
    /// assert_eq!(name.segments, vec!["articles".to_string()]);
    /// assert!(ParameterName::parse("page[size").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self> {
        let malformed = |message: &str| Error::QueryParameter {
            name: name.to_string(),
            message: message.to_string(),
        };

        let (family, mut rest) = match name.find('[') {
            Some(index) => (&name[..index], &name[index..]),
            None => (name, ""),
        };
        if family.is_empty() {
            return Err(malformed("parameter family is empty"));
        }
        if family.contains(']') {
            return Err(malformed("unbalanced ']'"));
        }

        let mut segments = Vec::new();
        while !rest.is_empty() {
            let Some(inner) = rest.strip_prefix('[') else {
                return Err(malformed("expected '[' after a bracketed segment"));
            };
            let Some(close) = inner.find(']') else {
                return Err(malformed("unbalanced '['"));
            };
            let segment = &inner[..close];
            if segment.contains('[') {
                return Err(malformed("nested '[' inside a segment"));
            }
            if segment.is_empty() {
                return Err(malformed("empty bracketed segment"));
            }
            segments.push(segment.to_string());
            rest = &inner[close + 1..];
        }

        Ok(Self {
            family: family.to_string(),
            segments,
        })
    }
}

/// Syntax checks for every parameter of a request
pub fn validate_query_syntax(params: &QueryParameters) -> FindingSet {
    let mut findings = FindingSet::new();

    for (name, value) in params.pairs() {
        let parsed = match ParameterName::parse(name) {
            Ok(parsed) => parsed,
            Err(e) => {
                findings.push(Finding::failed(PARAMETER_NAME_RULE, e.to_string()));
                continue;
            }
        };

        let checked = match parsed.family.as_str() {
            "include" => check_include(&parsed, value),
            "fields" => check_fields(&parsed, value),
            "sort" => check_sort(&parsed, value),
            "page" => check_page(&parsed, value),
            "filter" => {
                let mut set = FindingSet::new();
                set.push(Finding::passed(
                    FILTER_RULE,
                    format!("'{}' uses the implementation-defined filter family", name),
                ));
                set
            }
            _ => check_implementation_specific(&parsed, name),
        };
        findings.append(checked);
    }

    findings
}

fn check_include(parsed: &ParameterName, value: &str) -> FindingSet {
    if !parsed.segments.is_empty() {
        return FindingSet::from(Finding::failed(
            INCLUDE_RULE,
            "'include' does not take bracketed segments",
        ));
    }

    let mut findings = FindingSet::new();
    for path in value.split(',') {
        if let Err(e) = check_member_path(path.trim()) {
            findings.push(Finding::failed(
                INCLUDE_RULE,
                format!("Invalid include path '{}': {}", path, e),
            ));
        }
    }
    if findings.is_empty() {
        findings.push(Finding::passed(INCLUDE_RULE, format!("include={} is well formed", value)));
    }
    findings
}

fn check_fields(parsed: &ParameterName, value: &str) -> FindingSet {
    let [resource_type] = parsed.segments.as_slice() else {
        return FindingSet::from(Finding::failed(
            FIELDS_RULE,
            "'fields' requires exactly one resource type: fields[type]",
        ));
    };

    let mut findings = FindingSet::new();
    if let Err(e) = check_member_name(resource_type, MemberKind::ResourceType) {
        findings.push(Finding::failed(
            FIELDS_RULE,
            format!("Invalid resource type in fields[{}]: {}", resource_type, e),
        ));
    }
    for field in value.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if let Err(e) = check_member_name(field, MemberKind::General) {
            findings.push(Finding::failed(
                FIELDS_RULE,
                format!("Invalid field '{}' in fields[{}]: {}", field, resource_type, e),
            ));
        }
    }
    if findings.is_empty() {
        findings.push(Finding::passed(
            FIELDS_RULE,
            format!("fields[{}]={} is well formed", resource_type, value),
        ));
    }
    findings
}

fn check_sort(parsed: &ParameterName, value: &str) -> FindingSet {
    if !parsed.segments.is_empty() {
        return FindingSet::from(Finding::failed(
            SORT_RULE,
            "'sort' does not take bracketed segments",
        ));
    }

    let fields = match parse_sort(value) {
        Ok(fields) => fields,
        Err(e) => return FindingSet::from(Finding::failed(SORT_RULE, e.to_string())),
    };

    let mut findings = FindingSet::new();
    let mut seen = HashSet::new();
    for field in &fields {
        if !seen.insert(field.path.as_str()) {
            findings.push(Finding::warning(
                SORT_RULE,
                format!("Sort field '{}' is listed more than once", field.path),
            ));
        }
    }
    findings.push(Finding::passed(SORT_RULE, format!("sort={} is well formed", value)));
    findings
}

fn check_page(parsed: &ParameterName, value: &str) -> FindingSet {
    let [key] = parsed.segments.as_slice() else {
        return FindingSet::from(Finding::failed(
            PAGE_RULE,
            "'page' parameters take exactly one segment: page[key]",
        ));
    };

    let finding = match key.as_str() {
        "number" | "size" | "limit" => match value.parse::<u64>() {
            Ok(n) if n > 0 => Finding::passed(PAGE_RULE, format!("page[{}]={} is valid", key, n)),
            _ => Finding::failed(
                PAGE_RULE,
                format!("page[{}] must be a positive integer, found '{}'", key, value),
            ),
        },
        "offset" => match value.parse::<u64>() {
            Ok(n) => Finding::passed(PAGE_RULE, format!("page[offset]={} is valid", n)),
            Err(_) => Finding::failed(
                PAGE_RULE,
                format!("page[offset] must be a non-negative integer, found '{}'", value),
            ),
        },
        cursor if is_cursor_key(cursor) => {
            if value.is_empty() {
                Finding::failed(PAGE_RULE, format!("page[{}] cursor must not be empty", cursor))
            } else {
                Finding::passed(PAGE_RULE, format!("page[{}] carries a cursor", cursor))
            }
        }
        other => Finding::passed(
            PAGE_RULE,
            format!("page[{}] is an implementation-defined pagination parameter", other),
        ),
    };
    FindingSet::from(finding)
}

/// `page[cursor]`, `page[before]`, `page[after]` and variants
pub(crate) fn is_cursor_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("cursor") || key.contains("before") || key.contains("after")
}

fn check_implementation_specific(parsed: &ParameterName, name: &str) -> FindingSet {
    let family = parsed.family.as_str();
    let finding = if family.chars().all(|c| c.is_ascii_lowercase()) {
        Finding::failed(
            PARAMETER_NAME_RULE,
            format!(
                "'{}' is reserved for JSON:API (families: {}); implementation-specific parameters must contain a character outside a-z",
                name,
                QUERY_FAMILIES.join(", ")
            ),
        )
    } else {
        Finding::passed(
            PARAMETER_NAME_RULE,
            format!("'{}' is an implementation-specific parameter", name),
        )
    };
    FindingSet::from(finding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax(query: &str) -> FindingSet {
        validate_query_syntax(&QueryParameters::parse(query))
    }

    #[test]
    fn test_parse_parameter_names() {
        let name = ParameterName::parse("page[number]").unwrap();
        assert_eq!(name.family, "page");
        assert_eq!(name.segments, vec!["number".to_string()]);

        let nested = ParameterName::parse("filter[author][name]").unwrap();
        assert_eq!(nested.segments.len(), 2);

        assert!(ParameterName::parse("[x]").is_err());
        assert!(ParameterName::parse("page]").is_err());
        assert!(ParameterName::parse("page[a]b").is_err());
        assert!(ParameterName::parse("page[]").is_err());
    }

    #[test]
    fn test_include_paths() {
        assert!(!syntax("include=author,comments.author").has_failures());
        assert!(syntax("include=author,,comments").has_failures());
        assert!(syntax("include=Author").has_failures());
    }

    #[test]
    fn test_fields_require_type_segment() {
        assert!(!syntax("fields[articles]=title,body").has_failures());
        assert!(syntax("fields=title").has_failures());
        assert!(!syntax("fields[people]=").has_failures());
    }

    #[test]
    fn test_sort_duplicates_warn() {
        let findings = syntax("sort=title,-title");
        assert!(!findings.has_failures());
        assert_eq!(findings.warnings().count(), 1);
        assert!(syntax("sort=--title").has_failures());
    }

    #[test]
    fn test_page_values() {
        assert!(!syntax("page[number]=2&page[size]=10&page[offset]=0").has_failures());
        assert!(syntax("page[size]=0").has_failures());
        assert!(syntax("page[number]=abc").has_failures());
        assert!(syntax("page[cursor]=").has_failures());
        assert!(!syntax("page[after]=abc123").has_failures());
    }

    #[test]
    fn test_implementation_specific_names() {
        assert!(!syntax("camelCase=1").has_failures());
        assert!(!syntax("x_debug=1").has_failures());
        assert!(syntax("debug=1").has_failures());
        assert!(!syntax("filter[tag]=rust").has_failures());
    }
}
