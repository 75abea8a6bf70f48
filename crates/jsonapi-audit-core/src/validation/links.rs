//! URL and link validation
//!
//! A link is `null`, a non-empty URL string, or a link object with a
//! required `href` and optional `rel`, `describedby`, `title`, `type`,
//! `hreflang` and `meta` members.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::FindingSet;
use crate::kind::ValueKind;
use crate::rules::{
    forbidden_url_chars_pattern, language_tag_pattern, LINK_OBJECT_MEMBERS, SYNTHETIC_BASE_URL,
};
use crate::validation::member_name::{validate_member_names, MemberKind};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

const LINK_RULE: &str = "Link Format";
const LINKS_OBJECT_RULE: &str = "Links Object";

/// Why a URL string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("URL must not be empty")]
    Empty,

    #[error("URL contains forbidden character {0:?}")]
    ForbiddenCharacter(char),

    #[error("URL cannot be parsed: {0}")]
    Unparseable(String),
}

/// Check that a string is an absolute URL or a relative reference
///
/// Absolute URLs are accepted whenever they parse. Relative references
/// must avoid the forbidden character class and are then resolved against
/// a synthetic base so that `/articles/1` and `?page[number]=2` are accepted.
pub fn check_url(candidate: &str) -> Result<Url, UrlError> {
    if candidate.is_empty() {
        return Err(UrlError::Empty);
    }

    match Url::parse(candidate) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if let Some(found) = forbidden_url_chars_pattern().find(candidate) {
                let c = found.as_str().chars().next().unwrap_or(' ');
                return Err(UrlError::ForbiddenCharacter(c));
            }
            Url::parse(SYNTHETIC_BASE_URL)
                .and_then(|base| base.join(candidate))
                .map_err(|e| UrlError::Unparseable(e.to_string()))
        }
        Err(e) => Err(UrlError::Unparseable(e.to_string())),
    }
}

/// Extract the target of a link value (string or object `href`)
pub fn link_href(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("href").and_then(Value::as_str),
        _ => None,
    }
}

/// Validate a single link value
pub fn validate_link(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    match value {
        Value::Null => findings.pass(LINK_RULE, "Link is null (unavailable)", ctx),
        Value::String(s) => match check_url(s) {
            Ok(_) => findings.pass(LINK_RULE, format!("Valid link '{}'", s), ctx),
            Err(e) => findings.fail(LINK_RULE, format!("Invalid link '{}': {}", s, e), ctx),
        },
        Value::Object(map) => findings.append(validate_link_object(map, ctx)),
        other => findings.fail(
            LINK_RULE,
            format!(
                "Link must be a string, a link object or null, found {}",
                ValueKind::of(other)
            ),
            ctx,
        ),
    }

    findings
}

fn validate_link_object(map: &Map<String, Value>, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    match map.get("href") {
        None => findings.fail(LINK_RULE, "Link object is missing required member 'href'", ctx),
        Some(Value::String(href)) => {
            if let Err(e) = check_url(href) {
                findings.fail(
                    LINK_RULE,
                    format!("Invalid href '{}': {}", href, e),
                    &ctx.child("href"),
                );
            }
        }
        Some(other) => findings.fail(
            LINK_RULE,
            format!("Link 'href' must be a string, found {}", ValueKind::of(other)),
            &ctx.child("href"),
        ),
    }

    for (key, value) in map {
        let member_ctx = ctx.child(key);
        match key.as_str() {
            "href" => {}
            "rel" | "title" => {
                if !value.is_string() {
                    findings.fail(
                        LINK_RULE,
                        format!("Link '{}' must be a string, found {}", key, ValueKind::of(value)),
                        &member_ctx,
                    );
                }
            }
            "type" => match value.as_str() {
                Some(media) if media.contains('/') => {}
                Some(media) => findings.fail(
                    LINK_RULE,
                    format!("Link 'type' must be a media type, found '{}'", media),
                    &member_ctx,
                ),
                None => findings.fail(
                    LINK_RULE,
                    format!("Link 'type' must be a string, found {}", ValueKind::of(value)),
                    &member_ctx,
                ),
            },
            "describedby" => {
                findings.extend(validate_link(value, &member_ctx).failures().cloned());
            }
            "hreflang" => findings.append(validate_hreflang(value, &member_ctx)),
            "meta" => match value {
                Value::Object(meta) => findings.extend(
                    validate_member_names(meta.keys(), MemberKind::Meta, &member_ctx)
                        .failures()
                        .cloned(),
                ),
                other => findings.fail(
                    LINK_RULE,
                    format!("Link 'meta' must be an object, found {}", ValueKind::of(other)),
                    &member_ctx,
                ),
            },
            unknown => findings.fail(
                LINK_RULE,
                format!(
                    "Link object member '{}' is not allowed (allowed: {})",
                    unknown,
                    LINK_OBJECT_MEMBERS.join(", ")
                ),
                &member_ctx,
            ),
        }
    }

    if findings.is_empty() {
        let href = map.get("href").and_then(Value::as_str).unwrap_or_default();
        findings.pass(LINK_RULE, format!("Valid link object for '{}'", href), ctx);
    }
    findings
}

fn validate_hreflang(value: &Value, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    let check = |tag: &str, ctx: &ValidationContext, findings: &mut FindingSet| {
        if !language_tag_pattern().is_match(tag) {
            findings.fail(
                LINK_RULE,
                format!("'{}' is not a valid language tag", tag),
                ctx,
            );
        }
    };

    match value {
        Value::String(tag) => check(tag, ctx, &mut findings),
        Value::Array(tags) => {
            for (i, tag) in tags.iter().enumerate() {
                match tag.as_str() {
                    Some(tag) => check(tag, &ctx.child_index(i), &mut findings),
                    None => findings.fail(
                        LINK_RULE,
                        format!("hreflang entries must be strings, found {}", ValueKind::of(tag)),
                        &ctx.child_index(i),
                    ),
                }
            }
        }
        other => findings.fail(
            LINK_RULE,
            format!(
                "hreflang must be a string or an array of strings, found {}",
                ValueKind::of(other)
            ),
            ctx,
        ),
    }
    findings
}

/// Validate a `links` object, optionally restricting its member names
pub fn validate_links_object(
    value: &Value,
    allowed: Option<&[&str]>,
    ctx: &ValidationContext,
) -> FindingSet {
    let mut findings = FindingSet::new();

    let map = match value {
        Value::Object(map) => map,
        other => {
            findings.fail(
                LINKS_OBJECT_RULE,
                format!("'links' must be an object, found {}", ValueKind::of(other)),
                ctx,
            );
            return findings;
        }
    };

    for (name, link) in map {
        let link_ctx = ctx.child(name);
        if let Some(allowed) = allowed {
            if !allowed.contains(&name.as_str()) {
                findings.fail(
                    LINKS_OBJECT_RULE,
                    format!(
                        "Link '{}' is not allowed here (allowed: {})",
                        name,
                        allowed.join(", ")
                    ),
                    &link_ctx,
                );
                continue;
            }
        }
        findings.append(validate_link(link, &link_ctx));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> ValidationContext {
        ValidationContext::new().child("links").child("self")
    }

    #[test]
    fn test_check_url() {
        assert!(check_url("https://example.com/articles/1").is_ok());
        assert!(check_url("/articles/1").is_ok());
        assert!(check_url("?page%5Bnumber%5D=2").is_ok());
        assert_eq!(check_url(""), Err(UrlError::Empty));
        assert_eq!(check_url("/a b"), Err(UrlError::ForbiddenCharacter(' ')));
        assert_eq!(check_url("/a{b}"), Err(UrlError::ForbiddenCharacter('{')));
        assert!(matches!(check_url("http://[::1"), Err(UrlError::Unparseable(_))));
    }

    #[test]
    fn test_absolute_url_skips_relative_character_class() {
        assert!(check_url("https://example.com/articles?filter[tags]=a|b").is_ok());
        assert!(check_url("http://example.com/a b").is_ok());
        assert!(check_url("https://example.com/search?q={x}").is_ok());
        assert_eq!(check_url("/search?q=a|b"), Err(UrlError::ForbiddenCharacter('|')));

        let link = json!("https://example.com/articles?filter[tags]=a|b");
        assert!(!validate_link(&link, &ctx()).has_failures());
    }

    #[test]
    fn test_null_and_string_links() {
        assert!(!validate_link(&json!(null), &ctx()).has_failures());
        assert!(!validate_link(&json!("http://example.com/a"), &ctx()).has_failures());
        assert!(validate_link(&json!(""), &ctx()).has_failures());
        assert!(validate_link(&json!(42), &ctx()).has_failures());
    }

    #[test]
    fn test_link_object_requires_href() {
        let findings = validate_link(&json!({"title": "x"}), &ctx());
        assert_eq!(findings.failures().count(), 1);
        assert!(findings.failures().next().unwrap().message.contains("href"));
    }

    #[test]
    fn test_link_object_full() {
        let link = json!({
            "href": "http://example.com/articles/1",
            "rel": "self",
            "describedby": "http://example.com/schemas/article",
            "title": "Article",
            "type": "application/vnd.api+json",
            "hreflang": ["en", "de-CH"],
            "meta": {"count": 1}
        });
        let findings = validate_link(&link, &ctx());
        assert!(!findings.has_failures(), "{:?}", findings);
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_link_object_rejects_unknown_member() {
        let findings = validate_link(&json!({"href": "/a", "method": "GET"}), &ctx());
        let failure = findings.failures().next().unwrap();
        assert_eq!(failure.pointer(), "/links/self/method");
    }

    #[test]
    fn test_hreflang_invalid() {
        let findings = validate_link(&json!({"href": "/a", "hreflang": "not a tag"}), &ctx());
        assert_eq!(findings.failures().count(), 1);
    }

    #[test]
    fn test_links_object_allowed_names() {
        let links = json!({"about": "/docs", "self": "/x"});
        let findings = validate_links_object(&links, Some(&["about", "type"]), &ValidationContext::new());
        assert_eq!(findings.failures().count(), 1);
    }

    #[test]
    fn test_link_href() {
        assert_eq!(link_href(&json!("/a")), Some("/a"));
        assert_eq!(link_href(&json!({"href": "/b"})), Some("/b"));
        assert_eq!(link_href(&json!(null)), None);
    }
}
