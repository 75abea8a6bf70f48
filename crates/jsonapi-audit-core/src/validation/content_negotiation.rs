//! Content negotiation: `Content-Type`, `Accept` and `Vary`
//!
//! The JSON:API media type may only carry the `ext` and `profile`
//! parameters, each a space-separated list of absolute URIs. Violations in
//! the request headers determine which status (406 or 415) the server was
//! obliged to answer with; that expectation is handed to the status
//! validator.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::finding::{Finding, FindingSet};
use crate::rules::{ALLOWED_MEDIA_TYPE_PARAMS, JSONAPI_MEDIA_TYPE};
use crate::types::{header, Headers};
use thiserror::Error;
use url::Url;

pub const CONTENT_TYPE_RULE: &str = "Content-Type Header";
pub const MEDIA_TYPE_PARAMS_RULE: &str = "Content-Type Media Type Parameters";
pub const ACCEPT_RULE: &str = "Accept Header";
pub const VARY_RULE: &str = "Vary Header";

/// Parameters that belong to `Accept` itself rather than to the media type
const ACCEPT_EXTENSION_PARAMS: &[&str] = &["q"];

/// A parsed media type such as `application/vnd.api+json; ext="..."`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// `type/subtype`, lowercased
    pub essence: String,
    /// Parameter names lowercased, values unquoted
    pub params: Vec<(String, String)>,
}

/// Why a media type string could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaTypeError {
    #[error("media type is empty")]
    Empty,

    #[error("'{0}' is not of the form type/subtype")]
    MissingSubtype(String),

    #[error("malformed media type parameter '{0}'")]
    MalformedParameter(String),
}

impl MediaType {
    pub fn parse(raw: &str) -> Result<Self, MediaTypeError> {
        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        if essence.is_empty() {
            return Err(MediaTypeError::Empty);
        }
        match essence.split_once('/') {
            Some((t, s)) if !t.is_empty() && !s.is_empty() => {}
            _ => return Err(MediaTypeError::MissingSubtype(essence)),
        }

        let mut params = Vec::new();
        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| MediaTypeError::MalformedParameter(part.to_string()))?;
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                return Err(MediaTypeError::MalformedParameter(part.to_string()));
            }
            let value = value.trim().trim_matches('"').to_string();
            params.push((name, value));
        }

        Ok(Self { essence, params })
    }

    pub fn is_jsonapi(&self) -> bool {
        self.essence == JSONAPI_MEDIA_TYPE
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parameters other than `ext`/`profile`, ignoring the given extras
    fn forbidden_params<'a>(&'a self, ignored: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        self.params
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(move |name| !ALLOWED_MEDIA_TYPE_PARAMS.contains(name) && !ignored.contains(name))
    }
}

/// Result of the negotiation checks
#[derive(Debug, Clone, Default)]
pub struct NegotiationOutcome {
    pub findings: FindingSet,
    /// Status the server should have answered with, when the request forced one
    pub expected_status: Option<u16>,
}

/// Inputs of the negotiation checks
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    pub response_headers: &'a Headers,
    pub request_headers: &'a Headers,
    pub response_has_body: bool,
    pub request_has_body: bool,
    pub require_vary_accept: bool,
}

/// Run every content negotiation check for one exchange
pub fn validate_content_negotiation(exchange: Exchange<'_>) -> NegotiationOutcome {
    let mut outcome = NegotiationOutcome::default();

    if exchange.response_has_body {
        outcome
            .findings
            .append(validate_response_content_type(exchange.response_headers));
    }

    if exchange.request_has_body {
        let (findings, expected) = validate_request_content_type(exchange.request_headers);
        outcome.findings.append(findings);
        outcome.expected_status = outcome.expected_status.or(expected);
    }

    let (findings, expected) = validate_accept(exchange.request_headers);
    outcome.findings.append(findings);
    outcome.expected_status = outcome.expected_status.or(expected);

    if exchange.require_vary_accept {
        outcome.findings.append(check_vary(exchange.response_headers));
    }

    outcome
}

/// The response `Content-Type` must be the JSON:API media type
pub fn validate_response_content_type(headers: &Headers) -> FindingSet {
    let mut findings = FindingSet::new();

    let Some(raw) = header(headers, "content-type") else {
        findings.push(Finding::failed(
            CONTENT_TYPE_RULE,
            "Response has a body but no Content-Type header",
        ));
        return findings;
    };

    match MediaType::parse(raw) {
        Ok(media_type) if media_type.is_jsonapi() => {
            findings.push(Finding::passed(
                CONTENT_TYPE_RULE,
                format!("Response Content-Type is {}", JSONAPI_MEDIA_TYPE),
            ));
            findings.append(check_params(&media_type, &[], "Response Content-Type"));
        }
        Ok(media_type) => findings.push(Finding::failed(
            CONTENT_TYPE_RULE,
            format!(
                "Response Content-Type must be {}, found '{}'",
                JSONAPI_MEDIA_TYPE, media_type.essence
            ),
        )),
        Err(e) => findings.push(Finding::failed(
            CONTENT_TYPE_RULE,
            format!("Response Content-Type '{}' is malformed: {}", raw, e),
        )),
    }

    findings
}

/// The request `Content-Type`; forbidden parameters oblige a 415
pub fn validate_request_content_type(headers: &Headers) -> (FindingSet, Option<u16>) {
    let mut findings = FindingSet::new();

    let Some(raw) = header(headers, "content-type") else {
        findings.push(Finding::warning(
            CONTENT_TYPE_RULE,
            "Request carries a body but no Content-Type header",
        ));
        return (findings, None);
    };

    let media_type = match MediaType::parse(raw) {
        Ok(media_type) => media_type,
        Err(e) => {
            findings.push(Finding::warning(
                CONTENT_TYPE_RULE,
                format!("Request Content-Type '{}' is malformed: {}", raw, e),
            ));
            return (findings, None);
        }
    };

    if !media_type.is_jsonapi() {
        findings.push(Finding::warning(
            CONTENT_TYPE_RULE,
            format!(
                "Request Content-Type is '{}' rather than {}",
                media_type.essence, JSONAPI_MEDIA_TYPE
            ),
        ));
        return (findings, None);
    }

    // Forbidden parameters oblige the server to answer 415
    let params = check_params(&media_type, &[], "Request Content-Type");
    if params.has_failures() {
        let problems: Vec<String> = params.iter().map(|f| f.message.clone()).collect();
        findings.push(Finding::passed(
            CONTENT_TYPE_RULE,
            format!("{}; the server must respond 415", problems.join("; ")),
        ));
        return (findings, Some(415));
    }

    findings.push(Finding::passed(
        CONTENT_TYPE_RULE,
        format!("Request Content-Type is {}", JSONAPI_MEDIA_TYPE),
    ));
    (findings, None)
}

/// The request `Accept` header; if every JSON:API instance carries
/// forbidden parameters the server must answer 406
pub fn validate_accept(headers: &Headers) -> (FindingSet, Option<u16>) {
    let mut findings = FindingSet::new();

    let Some(raw) = header(headers, "accept") else {
        return (findings, None);
    };

    let mut jsonapi_instances = 0;
    let mut acceptable_instances = 0;
    for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
        match MediaType::parse(entry) {
            Ok(media_type) if media_type.is_jsonapi() => {
                jsonapi_instances += 1;
                let params = check_params(&media_type, ACCEPT_EXTENSION_PARAMS, "Accept");
                if !params.has_failures() {
                    acceptable_instances += 1;
                }
            }
            Ok(_) => {}
            Err(e) => findings.push(Finding::warning(
                ACCEPT_RULE,
                format!("Accept entry '{}' is malformed: {}", entry.trim(), e),
            )),
        }
    }

    if jsonapi_instances > 0 && acceptable_instances == 0 {
        findings.push(Finding::passed(
            ACCEPT_RULE,
            "Every JSON:API media type in Accept carries parameters other than ext/profile; the server must respond 406",
        ));
        return (findings, Some(406));
    }

    if jsonapi_instances > 0 {
        findings.push(Finding::passed(
            ACCEPT_RULE,
            format!("Accept lists {} acceptable JSON:API media type(s)", acceptable_instances),
        ));
    }
    (findings, None)
}

/// Only `ext`/`profile` are allowed, each a list of absolute URIs
fn check_params(media_type: &MediaType, ignored: &[&str], label: &str) -> FindingSet {
    let mut findings = FindingSet::new();

    for name in media_type.forbidden_params(ignored) {
        findings.push(Finding::failed(
            MEDIA_TYPE_PARAMS_RULE,
            format!(
                "{} carries media type parameter '{}'; only {} are allowed",
                label,
                name,
                ALLOWED_MEDIA_TYPE_PARAMS.join(" and ")
            ),
        ));
    }

    for name in ALLOWED_MEDIA_TYPE_PARAMS {
        let Some(value) = media_type.param(name) else {
            continue;
        };
        let uris: Vec<&str> = value.split_whitespace().collect();
        if uris.is_empty() {
            findings.push(Finding::failed(
                MEDIA_TYPE_PARAMS_RULE,
                format!("{} parameter '{}' is empty", label, name),
            ));
        }
        for uri in uris.into_iter().filter(|uri| Url::parse(uri).is_err()) {
            findings.push(Finding::failed(
                MEDIA_TYPE_PARAMS_RULE,
                format!(
                    "{} parameter '{}' contains '{}', which is not an absolute URI",
                    label, name, uri
                ),
            ));
        }
    }

    findings
}

fn check_vary(headers: &Headers) -> FindingSet {
    let mut findings = FindingSet::new();
    let varies_on_accept = header(headers, "vary")
        .map(|vary| {
            vary.split(',')
                .map(str::trim)
                .any(|v| v == "*" || v.eq_ignore_ascii_case("accept"))
        })
        .unwrap_or(false);

    if varies_on_accept {
        findings.push(Finding::passed(VARY_RULE, "Response varies on Accept"));
    } else {
        findings.push(Finding::warning(
            VARY_RULE,
            "Response should include 'Vary: Accept' since its representation depends on Accept",
        ));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_media_type() {
        let raw = r#"application/vnd.api+json; ext="https://jsonapi.org/ext/atomic""#;
        let media_type = MediaType::parse(raw).unwrap();
        assert!(media_type.is_jsonapi());
        assert_eq!(media_type.param("ext"), Some("https://jsonapi.org/ext/atomic"));
        assert!(MediaType::parse("json").is_err());
        assert!(MediaType::parse("application/json; charset").is_err());
    }

    #[test]
    fn test_response_content_type() {
        let ok = validate_response_content_type(&headers(&[("Content-Type", JSONAPI_MEDIA_TYPE)]));
        assert!(!ok.has_failures());

        let wrong = validate_response_content_type(&headers(&[("content-type", "application/json")]));
        assert!(wrong.has_failures());

        let charset = validate_response_content_type(&headers(&[(
            "Content-Type",
            "application/vnd.api+json; charset=utf-8",
        )]));
        assert_eq!(charset.with_rule(MEDIA_TYPE_PARAMS_RULE).count(), 1);
    }

    #[test]
    fn test_profile_must_be_uris() {
        let findings = validate_response_content_type(&headers(&[(
            "Content-Type",
            r#"application/vnd.api+json; profile="https://example.com/a relative/b""#,
        )]));
        assert_eq!(findings.failures().count(), 1);
    }

    #[test]
    fn test_accept_all_instances_forbidden_expects_406() {
        let (_, expected) =
            validate_accept(&headers(&[("Accept", "application/vnd.api+json; charset=utf-8")]));
        assert_eq!(expected, Some(406));

        let (_, expected) = validate_accept(&headers(&[(
            "Accept",
            "application/vnd.api+json; charset=utf-8, application/vnd.api+json",
        )]));
        assert_eq!(expected, None);

        let (_, expected) = validate_accept(&headers(&[("Accept", "application/vnd.api+json;q=0.9")]));
        assert_eq!(expected, None);
    }

    #[test]
    fn test_request_content_type_expects_415() {
        let (findings, expected) = validate_request_content_type(&headers(&[(
            "Content-Type",
            "application/vnd.api+json; version=1",
        )]));
        assert!(!findings.has_failures());
        assert_eq!(expected, Some(415));
    }

    #[test]
    fn test_vary_warning() {
        let response = headers(&[("Content-Type", JSONAPI_MEDIA_TYPE)]);
        let request = Headers::new();
        let outcome = validate_content_negotiation(Exchange {
            response_headers: &response,
            request_headers: &request,
            response_has_body: true,
            request_has_body: false,
            require_vary_accept: true,
        });
        assert_eq!(outcome.findings.with_rule(VARY_RULE).filter(|f| f.is_warning()).count(), 1);
        assert_eq!(outcome.expected_status, None);
    }
}
