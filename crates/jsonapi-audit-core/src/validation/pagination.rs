//! Pagination validation
//!
//! Applies to collection responses. The request's `page[...]` parameters
//! select a mode (page number, offset, or cursor); boundary and adjacency
//! rules only make sense for the numeric modes, while every mode must keep
//! its links on the request's endpoint with the request's other query
//! parameters intact.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::FindingSet;
use crate::rules::PAGINATION_LINKS;
use crate::validation::links::link_href;
use crate::validation::query::params::is_cursor_key;
use crate::validation::query::QueryParameters;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

pub const PAGINATION_LINKS_RULE: &str = "Pagination Links";
pub const PAGINATION_BOUNDARY_RULE: &str = "Pagination Boundaries";
pub const PAGINATION_ADJACENCY_RULE: &str = "Pagination Link Targets";
pub const PAGINATION_CONSISTENCY_RULE: &str = "Pagination Link Consistency";
pub const PAGINATION_SIZE_RULE: &str = "Pagination Page Size";
pub const PAGINATION_META_RULE: &str = "Pagination Meta Consistency";
pub const PAGINATION_TOTAL_RULE: &str = "Pagination Total Count";

/// Keys under `meta` or `meta.page` that report a total
const TOTAL_COUNT_KEYS: &[&str] = &[
    "total",
    "count",
    "total-count",
    "total_count",
    "totalCount",
    "total-pages",
    "total_pages",
    "totalPages",
    "last-page",
    "lastPage",
];

/// Pagination strategy selected by the request's `page` parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationMode {
    /// `page[number]` / `page[size]`
    Number,
    /// `page[offset]` / `page[limit]`
    Offset,
    /// `page[cursor]`, `page[before]`, `page[after]` and variants
    Cursor,
    Unpaginated,
}

impl PaginationMode {
    pub fn detect(page: &BTreeMap<String, String>) -> Self {
        if page.keys().any(|key| is_cursor_key(key)) {
            PaginationMode::Cursor
        } else if page.contains_key("offset") || page.contains_key("limit") {
            PaginationMode::Offset
        } else if page.contains_key("number") || page.contains_key("size") {
            PaginationMode::Number
        } else {
            PaginationMode::Unpaginated
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, PaginationMode::Number | PaginationMode::Offset)
    }
}

/// Numeric page window requested by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PageWindow {
    number: Option<u64>,
    size: Option<u64>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl PageWindow {
    fn from_params(page: &BTreeMap<String, String>) -> Self {
        let read = |key: &str| page.get(key).and_then(|v| v.parse::<u64>().ok());
        Self {
            number: read("number"),
            size: read("size"),
            offset: read("offset"),
            limit: read("limit"),
        }
    }

    fn page_size(&self) -> Option<u64> {
        self.size.or(self.limit)
    }

    fn is_first_page(&self, mode: PaginationMode) -> bool {
        match mode {
            PaginationMode::Number => self.number.unwrap_or(1) == 1,
            PaginationMode::Offset => self.offset.unwrap_or(0) == 0,
            PaginationMode::Cursor | PaginationMode::Unpaginated => false,
        }
    }
}

/// Pagination links that are present and not null
fn present_links(links: Option<&Value>) -> BTreeMap<&'static str, &str> {
    let mut present = BTreeMap::new();
    let Some(Value::Object(links)) = links else {
        return present;
    };
    for name in PAGINATION_LINKS {
        if let Some(href) = links.get(*name).and_then(link_href) {
            present.insert(*name, href);
        }
    }
    present
}

/// Validate pagination of a collection response
pub fn validate_pagination(
    request_url: &Url,
    params: &QueryParameters,
    document: &Value,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();

    let Some(Value::Array(data)) = document.get("data") else {
        return findings;
    };

    let page = params.page();
    let mode = PaginationMode::detect(&page);
    let links = present_links(document.get("links"));
    let has_pagination_links = !links.is_empty();

    if mode == PaginationMode::Unpaginated && !has_pagination_links {
        return findings;
    }
    debug!(?mode, links = links.len(), resources = data.len(), "validating pagination");

    let links_ctx = ctx.child("links");
    let window = PageWindow::from_params(&page);

    findings.append(check_link_set(&links, &links_ctx));
    if mode.is_numeric() {
        findings.append(check_boundaries(mode, window, data.len(), &links, &links_ctx));
        findings.append(check_adjacency(mode, window, &links, request_url, &links_ctx));
        findings.append(check_total_count(document.get("meta"), ctx));
    }
    findings.append(check_link_consistency(&links, request_url, params, &links_ctx));
    findings.append(check_meta_consistency(window, document.get("meta"), ctx));

    if !findings.has_failures() && findings.warnings().next().is_none() {
        findings.pass(
            PAGINATION_LINKS_RULE,
            format!("{:?} pagination is consistent", mode),
            &links_ctx,
        );
    }
    findings
}

/// `first` and `last` should accompany `prev`/`next`
fn check_link_set(links: &BTreeMap<&'static str, &str>, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    let navigates = links.contains_key("prev") || links.contains_key("next");
    if !navigates {
        return findings;
    }
    for required in ["first", "last"] {
        if !links.contains_key(required) {
            findings.warn(
                PAGINATION_LINKS_RULE,
                format!("Paginated response has prev/next links but no '{}' link", required),
                ctx,
            );
        }
    }
    findings
}

fn check_boundaries(
    mode: PaginationMode,
    window: PageWindow,
    returned: usize,
    links: &BTreeMap<&'static str, &str>,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();

    if window.is_first_page(mode) && links.contains_key("prev") {
        findings.warn(
            PAGINATION_BOUNDARY_RULE,
            "The first page should not have a 'prev' link",
            &ctx.child("prev"),
        );
    }

    if let Some(size) = window.page_size() {
        let returned = returned as u64;
        if returned < size && links.contains_key("next") {
            findings.warn(
                PAGINATION_BOUNDARY_RULE,
                format!(
                    "Page holds {} of {} resources, so it is the last page, yet it has a 'next' link",
                    returned, size
                ),
                &ctx.child("next"),
            );
        }
        if returned > size {
            findings.fail(
                PAGINATION_SIZE_RULE,
                format!("Page holds {} resources, more than the requested size {}", returned, size),
                &ctx.with_prefix("/data"),
            );
        }
    }

    findings
}

/// Expected `page[...]` values of neighbouring links
fn check_adjacency(
    mode: PaginationMode,
    window: PageWindow,
    links: &BTreeMap<&'static str, &str>,
    request_url: &Url,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();

    let (key, expectations): (&str, Vec<(&str, Option<u64>)>) = match mode {
        PaginationMode::Number => {
            let number = window.number.unwrap_or(1);
            (
                "number",
                vec![
                    ("first", Some(1)),
                    ("prev", number.checked_sub(1).filter(|n| *n >= 1)),
                    ("next", number.checked_add(1)),
                ],
            )
        }
        PaginationMode::Offset => {
            let offset = window.offset.unwrap_or(0);
            let limit = window.limit.or(window.size);
            (
                "offset",
                vec![
                    ("first", Some(0)),
                    (
                        "prev",
                        limit.filter(|_| offset > 0).map(|l| offset.saturating_sub(l)),
                    ),
                    ("next", limit.and_then(|l| offset.checked_add(l))),
                ],
            )
        }
        PaginationMode::Cursor | PaginationMode::Unpaginated => return findings,
    };

    for (name, expected) in expectations {
        let (Some(href), Some(expected)) = (links.get(name), expected) else {
            continue;
        };
        let Ok(target) = request_url.join(href) else {
            continue;
        };
        let actual = QueryParameters::from_url(&target)
            .page()
            .get(key)
            .and_then(|v| v.parse::<u64>().ok());
        match actual {
            Some(actual) if actual == expected => {}
            Some(actual) => findings.warn(
                PAGINATION_ADJACENCY_RULE,
                format!(
                    "'{}' link targets page[{}]={}, expected {}",
                    name, key, actual, expected
                ),
                &ctx.child(name),
            ),
            None if name == "first" => {}
            None => findings.warn(
                PAGINATION_ADJACENCY_RULE,
                format!("'{}' link does not carry page[{}]", name, key),
                &ctx.child(name),
            ),
        }
    }

    findings
}

/// Links stay on the request endpoint and keep its non-page parameters
fn check_link_consistency(
    links: &BTreeMap<&'static str, &str>,
    request_url: &Url,
    params: &QueryParameters,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();

    for (name, href) in links {
        let link_ctx = ctx.child(name);
        let target = match request_url.join(href) {
            Ok(target) => target,
            Err(e) => {
                findings.fail(
                    PAGINATION_CONSISTENCY_RULE,
                    format!("'{}' link '{}' is not a valid URL: {}", name, href, e),
                    &link_ctx,
                );
                continue;
            }
        };

        if target.scheme() != request_url.scheme()
            || target.host_str() != request_url.host_str()
            || target.port_or_known_default() != request_url.port_or_known_default()
            || target.path() != request_url.path()
        {
            findings.fail(
                PAGINATION_CONSISTENCY_RULE,
                format!(
                    "'{}' link points to {}://{}{}, not the requested endpoint {}://{}{}",
                    name,
                    target.scheme(),
                    target.host_str().unwrap_or_default(),
                    target.path(),
                    request_url.scheme(),
                    request_url.host_str().unwrap_or_default(),
                    request_url.path()
                ),
                &link_ctx,
            );
        }

        let link_params = QueryParameters::from_url(&target);
        for (param, value) in params.non_page() {
            match link_params.get(param) {
                None => findings.fail(
                    PAGINATION_CONSISTENCY_RULE,
                    format!("'{}' link drops query parameter '{}'", name, param),
                    &link_ctx,
                ),
                Some(actual) if actual != value => findings.warn(
                    PAGINATION_CONSISTENCY_RULE,
                    format!(
                        "'{}' link changes query parameter '{}' from '{}' to '{}'",
                        name, param, value, actual
                    ),
                    &link_ctx,
                ),
                Some(_) => {}
            }
        }
    }

    findings
}

/// `meta.page.number`/`size` must echo the request
fn check_meta_consistency(
    window: PageWindow,
    meta: Option<&Value>,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();
    let Some(meta_page) = meta.and_then(|m| m.get("page")) else {
        return findings;
    };
    let page_ctx = ctx.child("meta").child("page");

    for (key, requested) in [("number", window.number), ("size", window.size)] {
        let (Some(requested), Some(reported)) = (requested, meta_page.get(key)) else {
            continue;
        };
        let reported_number = reported
            .as_u64()
            .or_else(|| reported.as_str().and_then(|s| s.parse().ok()));
        if reported_number != Some(requested) {
            findings.fail(
                PAGINATION_META_RULE,
                format!(
                    "meta.page.{} is {}, but the request asked for page[{}]={}",
                    key, reported, key, requested
                ),
                &page_ctx.child(key),
            );
        }
    }

    findings
}

/// A total count is recommended so clients can render page controls
fn check_total_count(meta: Option<&Value>, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    let has_key = |value: Option<&Value>| {
        value
            .and_then(Value::as_object)
            .map(|map| TOTAL_COUNT_KEYS.iter().any(|key| map.contains_key(*key)))
            .unwrap_or(false)
    };

    if has_key(meta) || has_key(meta.and_then(|m| m.get("page"))) {
        findings.pass(
            PAGINATION_TOTAL_RULE,
            "Response reports a total count",
            &ctx.child("meta"),
        );
    } else {
        findings.warn(
            PAGINATION_TOTAL_RULE,
            "Paginated response does not report a total count in 'meta'",
            ctx,
        );
    }
    findings
}
