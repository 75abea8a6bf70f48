//! Query parameter validation
//!
//! The request URL's query string is parsed once into [`QueryParameters`];
//! syntax checks live in [`params`], the ordering engine in [`sort`] and
//! sparse fieldset compliance in [`fieldsets`].
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod fieldsets;
pub mod params;
pub mod sort;

pub use fieldsets::check_sparse_fieldsets;
pub use params::{validate_query_syntax, ParameterName};
pub use sort::{parse_sort, verify_sort_order, SortField};

use crate::context::ValidationContext;
use crate::error::{Error, Result};
use crate::finding::{Finding, FindingSet};
use crate::rules::SYNTHETIC_BASE_URL;
use crate::types::{relationship_targets, PrimaryData};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

pub const INCLUDE_COMPLIANCE_RULE: &str = "Query Include Compliance";

/// Resolve a request URL, relative references against a synthetic base
pub fn resolve_request_url(request_url: &str) -> Result<Url> {
    match Url::parse(request_url) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(SYNTHETIC_BASE_URL)
            .and_then(|base| base.join(request_url))
            .map_err(|e| Error::url(request_url, e)),
        Err(e) => Err(Error::url(request_url, e)),
    }
}

/// Decoded query parameters in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    pairs: Vec<(String, String)>,
}

impl QueryParameters {
    /// Parse an `application/x-www-form-urlencoded` query string
    pub fn parse(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::parse(url.query().unwrap_or_default())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// First value of a parameter
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Relationship paths requested with `include`
    pub fn include(&self) -> Vec<String> {
        self.get("include")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|path| !path.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn sort(&self) -> Option<&str> {
        self.get("sort")
    }

    /// `fields[type]` parameters keyed by resource type
    pub fn fieldsets(&self) -> BTreeMap<String, Vec<String>> {
        self.bracketed("fields")
            .map(|(resource_type, value)| {
                let fields = value
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect();
                (resource_type, fields)
            })
            .collect()
    }

    pub fn has_sparse_fieldsets(&self) -> bool {
        self.bracketed("fields").next().is_some()
    }

    /// `page[key]` parameters keyed by `key`
    pub fn page(&self) -> BTreeMap<String, String> {
        self.bracketed("page")
            .map(|(key, value)| (key, value.to_string()))
            .collect()
    }

    /// Parameters outside the `page` family
    pub fn non_page(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .filter(|(name, _)| {
                ParameterName::parse(name)
                    .map(|parsed| parsed.family != "page")
                    .unwrap_or(true)
            })
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Single-segment parameters of one family, as `(segment, value)`
    fn bracketed<'a>(&'a self, family: &'a str) -> impl Iterator<Item = (String, &'a str)> + 'a {
        self.pairs.iter().filter_map(move |(name, value)| {
            let parsed = ParameterName::parse(name).ok()?;
            match parsed.segments.as_slice() {
                [segment] if parsed.family == family => Some((segment.clone(), value.as_str())),
                _ => None,
            }
        })
    }
}

/// Run every query check against the request and its response document
pub fn validate_query(
    params: &QueryParameters,
    document: Option<&Value>,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = validate_query_syntax(params);

    let Some(document) = document else {
        return findings;
    };
    let data = document.get("data");

    if let (Some(sort), Some(Value::Array(resources))) = (params.sort(), data) {
        if let Ok(fields) = parse_sort(sort) {
            findings.append(verify_sort_order(&fields, resources, &ctx.child("data")));
        }
    }

    let fieldsets = params.fieldsets();
    if !fieldsets.is_empty() {
        findings.append(check_sparse_fieldsets(&fieldsets, document, ctx));
    }

    let include = params.include();
    if !include.is_empty() {
        findings.append(check_include_compliance(&include, document, ctx));
    }

    findings
}

/// `include` was requested: related resources with linkage should be included
pub fn check_include_compliance(
    include: &[String],
    document: &Value,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();

    let has_linkage = document
        .get("data")
        .map(|data| {
            PrimaryData::classify(data)
                .resources()
                .into_iter()
                .any(|resource| !relationship_targets(resource).is_empty())
        })
        .unwrap_or(false);

    if has_linkage && document.get("included").is_none() {
        findings.push(
            Finding::warning(
                INCLUDE_COMPLIANCE_RULE,
                format!(
                    "include={} was requested but the response has no 'included' member",
                    include.join(",")
                ),
            )
            .within(ctx),
        );
    } else {
        findings.push(Finding::passed(
            INCLUDE_COMPLIANCE_RULE,
            format!("include={} is honored", include.join(",")),
        ));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_decodes_brackets() {
        let params =
            QueryParameters::parse("include=author&fields%5Barticles%5D=title,body&page[number]=2");
        assert_eq!(params.include(), vec!["author".to_string()]);
        assert_eq!(
            params.fieldsets().get("articles"),
            Some(&vec!["title".to_string(), "body".to_string()])
        );
        assert_eq!(params.page().get("number").map(String::as_str), Some("2"));
        assert!(params.has_sparse_fieldsets());
    }

    #[test]
    fn test_non_page_parameters() {
        let params = QueryParameters::parse("sort=-created&page[size]=10&filter[tag]=rust");
        let rest: Vec<_> = params.non_page().collect();
        assert_eq!(rest, vec![("sort", "-created"), ("filter[tag]", "rust")]);
    }

    #[test]
    fn test_resolve_relative_url() {
        let url = resolve_request_url("/articles?page[number]=1").unwrap();
        assert_eq!(url.path(), "/articles");
        assert!(resolve_request_url("http://[::1").is_err());
    }

    #[test]
    fn test_include_without_included_warns() {
        let params = QueryParameters::parse("include=author");
        let document = json!({
            "data": {"type": "articles", "id": "1",
                "relationships": {"author": {"data": {"type": "people", "id": "9"}}}}
        });
        let findings = validate_query(&params, Some(&document), &ValidationContext::new());
        let warnings = findings
            .with_rule(INCLUDE_COMPLIANCE_RULE)
            .filter(|f| f.is_warning())
            .count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_sort_checked_against_response() {
        let params = QueryParameters::parse("sort=id");
        let document = json!({"data": [{"id": "2"}, {"id": "1"}]});
        let findings = validate_query(&params, Some(&document), &ValidationContext::new());
        assert_eq!(findings.failures().count(), 1);
    }
}
