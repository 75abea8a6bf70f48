//! Validation orchestrator
//!
//! Runs every validator for one captured HTTP exchange in dependency order
//! and merges their findings into one ordered stream: header-level checks,
//! then the response document, the request document, the status matrix,
//! and finally the query and pagination checks that need both the response
//! body and the original query string.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::config::ValidationOptions;
use crate::context::ValidationContext;
use crate::error::{Error, Result};
use crate::finding::{Finding, FindingSet, Summary};
use crate::types::{Headers, Method};
use crate::validation::content_negotiation::{validate_content_negotiation, Exchange};
use crate::validation::document::{validate_document_with, LinkagePolicy};
use crate::validation::links::check_url;
use crate::validation::pagination::validate_pagination;
use crate::validation::query::{resolve_request_url, validate_query, QueryParameters};
use crate::validation::request::validate_request_document;
use crate::validation::status::{validate_status, StatusInput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

pub const URL_STRUCTURE_RULE: &str = "Request URL Structure";
pub const BODY_PARSING_RULE: &str = "Response Body Parsing";
pub const STAGE_FAILURE_RULE: &str = "Validation Stage";

/// One captured request/response exchange to audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub http_status: u16,
    /// Response headers
    #[serde(default)]
    pub headers: Headers,
    /// Response body, already parsed; `None` when there was no body
    #[serde(default)]
    pub parsed_body: Option<Value>,
    /// Why the response body could not be parsed, if it could not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    pub request_url: String,
    pub request_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default)]
    pub request_headers: Headers,
    #[serde(default)]
    pub options: ValidationOptions,
}

impl ValidationRequest {
    /// Create a request for a bodiless exchange
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        http_status: u16,
    ) -> Self {
        Self {
            http_status,
            headers: Headers::new(),
            parsed_body: None,
            parse_error: None,
            request_url: url.into(),
            request_method: method.into(),
            request_body: None,
            request_headers: Headers::new(),
            options: ValidationOptions::default(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.parsed_body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_request_body(mut self, body: Value) -> Self {
        self.request_body = Some(body);
        self
    }

    pub fn with_request_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Deserialize and sanity-check an input envelope
    pub fn from_json_str(json: &str) -> Result<Self> {
        let request: Self = serde_json::from_str(json)?;
        request.check()?;
        Ok(request)
    }

    fn check(&self) -> Result<()> {
        if self.request_url.trim().is_empty() {
            return Err(Error::invalid_input("requestUrl", "must not be empty"));
        }
        if self.request_method.trim().is_empty() {
            return Err(Error::invalid_input("requestMethod", "must not be empty"));
        }
        Ok(())
    }

    pub fn method(&self) -> Method {
        Method::from(self.request_method.as_str())
    }

    fn response_has_body(&self) -> bool {
        self.parsed_body.is_some() || self.parse_error.is_some()
    }
}

/// The request line a report refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedRequest {
    pub method: String,
    pub url: String,
    pub http_status: u16,
}

/// Findings of one validation pass with their counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub request: ReportedRequest,
    pub findings: FindingSet,
    pub summary: Summary,
    pub generated_at: DateTime<Utc>,
}

impl ValidationReport {
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.summary.warnings > 0
    }
}

/// Run one stage, turning an internal error into a single failed finding
fn run_stage<F>(findings: &mut FindingSet, stage: &str, failure_rule: &str, f: F)
where
    F: FnOnce() -> Result<FindingSet>,
{
    match f() {
        Ok(stage_findings) => {
            let summary = stage_findings.summary();
            debug!(
                stage,
                total = summary.total,
                failed = summary.failed,
                warnings = summary.warnings,
                "stage complete"
            );
            findings.append(stage_findings);
        }
        Err(e) => {
            debug!(stage, error = %e, "stage aborted");
            findings.push(Finding::failed(failure_rule, format!("{} stage failed: {}", stage, e)));
        }
    }
}

/// Validate one exchange and return the ordered findings
///
/// The result is a pure function of the request: validating the same
/// exchange twice yields identical findings.
///
/// # Arguments
///
/// * `request` - The captured exchange and its validation options
///
/// # Example
///
/// ```rust
/// use jsonapi_audit_core::orchestrator::{validate_exchange, ValidationRequest};
/// use serde_json::json;
///
/// let request = ValidationRequest::new("GET", "http://example.com/articles/1", 200)
///     .with_header("Content-Type", "application/vnd.api+json")
///     .with_header("Vary", "Accept")
///     .with_body(json!({"data": {"type": "articles", "id": "1"}}));
///
/// let findings = validate_exchange(&request);
/// assert!(!findings.has_failures());
/// ```
#[instrument(
    skip(request),
    fields(method = %request.request_method, url = %request.request_url, status = request.http_status)
)]
pub fn validate_exchange(request: &ValidationRequest) -> FindingSet {
    let mut findings = FindingSet::new();
    let method = request.method();
    let ctx = ValidationContext::from_options(&request.options);
    let body = request.parsed_body.as_ref();

    let url = resolve_request_url(&request.request_url);
    let params = url.as_ref().map(QueryParameters::from_url).unwrap_or_default();

    let negotiation = validate_content_negotiation(Exchange {
        response_headers: &request.headers,
        request_headers: &request.request_headers,
        response_has_body: request.response_has_body(),
        request_has_body: request.request_body.is_some(),
        require_vary_accept: request.options.require_vary_accept,
    });
    let expected_status = negotiation.expected_status;
    run_stage(&mut findings, "content negotiation", STAGE_FAILURE_RULE, || {
        Ok(negotiation.findings)
    });

    run_stage(&mut findings, "request url", URL_STRUCTURE_RULE, || {
        check_url(&request.request_url)
            .map_err(|e| Error::invalid_input("requestUrl", e.to_string()))?;
        let url = url.as_ref().map_err(|e| Error::invalid_input("requestUrl", e.to_string()))?;
        Ok(FindingSet::from(Finding::passed(
            URL_STRUCTURE_RULE,
            format!("Request URL path '{}' is well formed", url.path()),
        )))
    });

    run_stage(&mut findings, "response document", BODY_PARSING_RULE, || {
        if let Some(parse_error) = &request.parse_error {
            return Err(Error::invalid_input("parsedBody", parse_error.clone()));
        }
        let policy = if params.has_sparse_fieldsets() {
            LinkagePolicy::SparseFieldsets
        } else {
            LinkagePolicy::Full
        };
        Ok(body
            .map(|document| validate_document_with(document, policy, &ctx))
            .unwrap_or_default())
    });

    run_stage(&mut findings, "request document", STAGE_FAILURE_RULE, || {
        Ok(request
            .request_body
            .as_ref()
            .map(|document| {
                validate_request_document(
                    &method,
                    &request.request_url,
                    document,
                    request.options.client_generated_ids,
                    &ctx,
                )
            })
            .unwrap_or_default())
    });

    run_stage(&mut findings, "http status", STAGE_FAILURE_RULE, || {
        Ok(validate_status(
            StatusInput {
                method: &method,
                status: request.http_status,
                body,
                headers: &request.headers,
                expected_status,
            },
            &ctx,
        ))
    });

    if let Ok(url) = &url {
        run_stage(&mut findings, "query parameters", STAGE_FAILURE_RULE, || {
            Ok(validate_query(&params, body, &ctx))
        });
        if let Some(document) = body {
            run_stage(&mut findings, "pagination", STAGE_FAILURE_RULE, || {
                Ok(validate_pagination(url, &params, document, &ctx))
            });
        }
    }

    findings
}

/// Validate one exchange and attach a timestamp
pub fn run(request: &ValidationRequest) -> ValidationReport {
    let findings = validate_exchange(request);
    let summary = findings.summary();
    ValidationReport {
        request: ReportedRequest {
            method: request.request_method.clone(),
            url: request.request_url.clone(),
            http_status: request.http_status,
        },
        findings,
        summary,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jsonapi_get(url: &str, body: Value) -> ValidationRequest {
        ValidationRequest::new("GET", url, 200)
            .with_header("Content-Type", "application/vnd.api+json")
            .with_header("Vary", "Accept")
            .with_body(body)
    }

    #[test]
    fn test_from_json_str_camel_case() {
        let request = ValidationRequest::from_json_str(
            r#"{
                "httpStatus": 200,
                "headers": {"Content-Type": "application/vnd.api+json"},
                "parsedBody": {"data": null},
                "requestUrl": "http://example.com/articles/1",
                "requestMethod": "GET",
                "options": {"allowMissingId": true, "readOnlyFields": ["created"]}
            }"#,
        )
        .unwrap();
        assert_eq!(request.http_status, 200);
        assert!(request.options.allow_missing_id);
        assert_eq!(request.method(), Method::Get);
    }

    #[test]
    fn test_from_json_str_rejects_empty_url() {
        let err = ValidationRequest::from_json_str(
            r#"{"httpStatus": 200, "requestUrl": "", "requestMethod": "GET"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
        assert!(ValidationRequest::from_json_str("{").is_err());
    }

    #[test]
    fn test_parse_error_becomes_single_failure() {
        let mut request = ValidationRequest::new("GET", "http://example.com/articles", 200)
            .with_header("Content-Type", "application/vnd.api+json")
            .with_header("Vary", "Accept");
        request.parse_error = Some("expected value at line 1 column 1".to_string());

        let findings = validate_exchange(&request);
        let failures: Vec<_> = findings.with_rule(BODY_PARSING_RULE).collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].is_failure());
    }

    #[test]
    fn test_stages_continue_after_bad_url() {
        let request = jsonapi_get("http://[::1", json!({"data": null}));
        let findings = validate_exchange(&request);
        assert!(findings.with_rule(URL_STRUCTURE_RULE).any(|f| f.is_failure()));
        assert!(findings.with_rule("Data and Errors Exclusivity").next().is_some());
    }

    #[test]
    fn test_sparse_fieldsets_relax_linkage() {
        let body = json!({
            "data": [{"type": "articles", "id": "1", "attributes": {"title": "x"}}],
            "included": [{"type": "people", "id": "9", "attributes": {"name": "Dan"}}]
        });
        let strict = validate_exchange(&jsonapi_get("http://example.com/articles", body.clone()));
        assert!(strict.has_failures());

        let sparse = validate_exchange(&jsonapi_get(
            "http://example.com/articles?fields[articles]=title",
            body,
        ));
        assert!(!sparse.has_failures(), "{:#?}", sparse);
    }

    #[test]
    fn test_report_summary_matches_findings() {
        let report = run(&jsonapi_get(
            "http://example.com/articles/1",
            json!({"data": {"type": "articles", "id": "1"}}),
        ));
        assert_eq!(report.summary, report.findings.summary());
        assert!(!report.has_failures());
        assert_eq!(report.request.method, "GET");
    }
}
