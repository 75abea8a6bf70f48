//! Constants shared by several validators
//!
//! Grammar patterns and reserved-word lists live here so that the resource,
//! query and document validators cannot drift apart.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use regex::Regex;
use std::sync::OnceLock;

/// The JSON:API media type
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Media type parameters a JSON:API media type may carry
pub const ALLOWED_MEDIA_TYPE_PARAMS: &[&str] = &["ext", "profile"];

/// Names that may not be used as attribute or relationship names
pub const RESERVED_FIELD_NAMES: &[&str] =
    &["id", "type", "links", "relationships", "attributes", "meta"];

/// Top-level members of a document
pub const TOP_LEVEL_MEMBERS: &[&str] = &["data", "errors", "meta", "links", "included", "jsonapi"];

/// Members of a resource object
pub const RESOURCE_MEMBERS: &[&str] =
    &["type", "id", "lid", "attributes", "relationships", "links", "meta"];

/// Members of a resource identifier object
pub const IDENTIFIER_MEMBERS: &[&str] = &["type", "id", "lid", "meta"];

/// Members of a relationship object
pub const RELATIONSHIP_MEMBERS: &[&str] = &["data", "links", "meta"];

/// Members of a link object
pub const LINK_OBJECT_MEMBERS: &[&str] =
    &["href", "rel", "describedby", "title", "type", "hreflang", "meta"];

/// Members of an error object
pub const ERROR_MEMBERS: &[&str] =
    &["id", "links", "status", "code", "title", "detail", "source", "meta"];

/// Members of an error object's `links`
pub const ERROR_LINK_MEMBERS: &[&str] = &["about", "type"];

/// Members of an error object's `source`
pub const ERROR_SOURCE_MEMBERS: &[&str] = &["pointer", "parameter", "header"];

/// JSON:API versions accepted in `jsonapi.version`
pub const SUPPORTED_VERSIONS: &[&str] = &["1.0", "1.1"];

/// Pagination link names
pub const PAGINATION_LINKS: &[&str] = &["first", "last", "prev", "next"];

/// Query parameter families defined by JSON:API
pub const QUERY_FAMILIES: &[&str] = &["include", "fields", "sort", "page", "filter"];

/// Base URL used to resolve relative links during syntax checks
pub const SYNTHETIC_BASE_URL: &str = "https://jsonapi.invalid/";

/// Member name grammar: lowercase alphanumerics, inner `-`/`_`
pub fn member_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([a-z0-9_-]*[a-z0-9])?$").expect("member name pattern is valid")
    })
}

/// Runs of two or more separators inside a member name
pub fn consecutive_separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[-_]{2,}").expect("separator pattern is valid"))
}

/// Characters never allowed in a relative reference
pub fn forbidden_url_chars_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[\s<>^`{|}\\"]"#).expect("forbidden url character pattern is valid")
    })
}

/// Simplified BCP 47 language tag
pub fn language_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("language tag pattern is valid")
    })
}

/// Three-digit HTTP status string
pub fn status_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{3}$").expect("status pattern is valid"))
}
