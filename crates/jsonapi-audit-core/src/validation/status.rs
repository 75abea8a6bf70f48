//! HTTP status matrix
//!
//! Which status codes a server may answer with depends on the method and on
//! the shape of the returned document; error statuses must agree with the
//! `status` members of the error objects they carry.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::context::ValidationContext;
use crate::finding::{Finding, FindingSet};
use crate::types::{header, Headers, Method};
use serde_json::Value;

pub const STATUS_RULE: &str = "HTTP Status Code";
pub const BODY_SHAPE_RULE: &str = "HTTP Status Payload";
pub const ERROR_STATUS_CONSISTENCY_RULE: &str = "Error Status Consistency";
pub const LOCATION_HEADER_RULE: &str = "Location Header";

/// Response facts the status matrix is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct StatusInput<'a> {
    pub method: &'a Method,
    pub status: u16,
    pub body: Option<&'a Value>,
    pub headers: &'a Headers,
    /// Status forced by content negotiation, if any
    pub expected_status: Option<u16>,
}

impl StatusInput<'_> {
    fn has_member(&self, member: &str) -> bool {
        self.body.map(|b| b.get(member).is_some()).unwrap_or(false)
    }
}

/// Validate the status code of one response
pub fn validate_status(input: StatusInput<'_>, ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();

    if !(100..=599).contains(&input.status) {
        findings.push(Finding::failed(
            STATUS_RULE,
            format!("{} is not a valid HTTP status code", input.status),
        ));
        return findings;
    }

    if let Some(expected) = input.expected_status {
        if expected == input.status {
            findings.push(Finding::passed(
                STATUS_RULE,
                format!("Server answered {} as content negotiation requires", expected),
            ));
        } else {
            findings.push(Finding::failed(
                STATUS_RULE,
                format!(
                    "Content negotiation requires status {}, but the server answered {}",
                    expected, input.status
                ),
            ));
        }
    }

    findings.append(check_body_shape(&input));
    if (200..300).contains(&input.status) {
        findings.append(check_success_matrix(&input));
    }
    if let Some(Value::Array(errors)) = input.body.and_then(|b| b.get("errors")) {
        findings.append(check_error_statuses(input.status, errors, &ctx.child("errors")));
    }

    findings
}

fn check_body_shape(input: &StatusInput<'_>) -> FindingSet {
    let mut findings = FindingSet::new();
    let status = input.status;

    if status == 204 {
        if input.body.is_some() {
            findings.push(Finding::failed(BODY_SHAPE_RULE, "204 No Content must not include a body"));
        } else {
            findings.push(Finding::passed(BODY_SHAPE_RULE, "204 No Content has no body"));
        }
        return findings;
    }

    if (200..300).contains(&status) && input.has_member("errors") {
        findings.push(Finding::failed(
            BODY_SHAPE_RULE,
            format!("Successful response {} must not contain 'errors'", status),
        ));
    }

    if status >= 400 {
        match input.body {
            None => findings.push(Finding::warning(
                BODY_SHAPE_RULE,
                format!("Error response {} should include an 'errors' document", status),
            )),
            Some(_) => {
                if !input.has_member("errors") {
                    findings.push(Finding::failed(
                        BODY_SHAPE_RULE,
                        format!("Error response {} must contain 'errors'", status),
                    ));
                }
                if input.has_member("data") {
                    findings.push(Finding::failed(
                        BODY_SHAPE_RULE,
                        format!("Error response {} must not contain 'data'", status),
                    ));
                }
            }
        }
    }

    findings
}

fn check_success_matrix(input: &StatusInput<'_>) -> FindingSet {
    let mut findings = FindingSet::new();
    let status = input.status;
    let method = input.method;

    let allowed: &[u16] = match method {
        Method::Get | Method::Head => &[200],
        Method::Post => &[201, 202, 204],
        Method::Patch | Method::Put => &[200, 202, 204],
        Method::Delete => &[200, 202, 204],
        Method::Options | Method::Other(_) => return findings,
    };

    if !allowed.contains(&status) {
        findings.push(Finding::failed(
            STATUS_RULE,
            format!(
                "{} {} is not a defined success status (expected one of {})",
                method,
                status,
                allowed.iter().map(u16::to_string).collect::<Vec<_>>().join(", ")
            ),
        ));
        return findings;
    }

    findings.push(Finding::passed(
        STATUS_RULE,
        format!("{} {} is a defined success status", method, status),
    ));

    match (method, status) {
        (Method::Get, 200) if input.body.is_some() && !input.has_member("data") => {
            findings.push(Finding::failed(
                BODY_SHAPE_RULE,
                "Successful GET must return primary 'data'",
            ))
        }
        (Method::Post, 201) => {
            if !input.has_member("data") {
                findings.push(Finding::failed(
                    BODY_SHAPE_RULE,
                    "201 Created must return the created resource as 'data'",
                ));
            }
            if header(input.headers, "location").is_none() {
                findings.push(Finding::warning(
                    LOCATION_HEADER_RULE,
                    "201 Created should include a Location header for the new resource",
                ));
            }
        }
        (Method::Delete, 200) if input.has_member("data") => findings.push(Finding::warning(
            BODY_SHAPE_RULE,
            "200 OK after DELETE should carry only top-level 'meta'",
        )),
        _ => {}
    }

    findings
}

fn check_error_statuses(status: u16, errors: &[Value], ctx: &ValidationContext) -> FindingSet {
    let mut findings = FindingSet::new();
    let http = status.to_string();
    let single = errors.len() == 1;

    for (i, error) in errors.iter().enumerate() {
        let Some(error_status) = error.get("status").and_then(Value::as_str) else {
            continue;
        };
        let agrees = if single {
            error_status == http
        } else {
            error_status.get(..1) == http.get(..1)
        };
        if !agrees {
            let expectation = if single { "equal" } else { "share the class of" };
            findings.push(
                Finding::warning(
                    ERROR_STATUS_CONSISTENCY_RULE,
                    format!(
                        "Error status '{}' should {} the HTTP status {}",
                        error_status, expectation, status
                    ),
                )
                .within(&ctx.child_index(i).child("status")),
            );
        }
    }

    if findings.is_empty() {
        findings.pass(
            ERROR_STATUS_CONSISTENCY_RULE,
            format!("Error object statuses agree with HTTP status {}", status),
            ctx,
        );
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(method: Method, status: u16, body: Option<Value>, headers: Headers) -> FindingSet {
        validate_status(
            StatusInput {
                method: &method,
                status,
                body: body.as_ref(),
                headers: &headers,
                expected_status: None,
            },
            &ValidationContext::new(),
        )
    }

    #[test]
    fn test_204_without_body() {
        assert!(!check(Method::Delete, 204, None, Headers::new()).has_failures());
        let findings = check(Method::Delete, 204, Some(json!({"meta": {}})), Headers::new());
        assert!(findings.with_rule(BODY_SHAPE_RULE).any(|f| f.is_failure()));
    }

    #[test]
    fn test_error_response_requires_errors() {
        let findings = check(Method::Get, 404, Some(json!({"data": null})), Headers::new());
        assert_eq!(findings.failures().count(), 2);
    }

    #[test]
    fn test_post_201_location_warning() {
        let body = json!({"data": {"type": "photos", "id": "1"}});
        let findings = check(Method::Post, 201, Some(body.clone()), Headers::new());
        assert!(!findings.has_failures());
        assert_eq!(findings.with_rule(LOCATION_HEADER_RULE).count(), 1);

        let mut headers = Headers::new();
        headers.insert("Location".to_string(), "/photos/1".to_string());
        let findings = check(Method::Post, 201, Some(body), headers);
        assert_eq!(findings.warnings().count(), 0);
    }

    #[test]
    fn test_post_200_not_defined() {
        let findings = check(Method::Post, 200, Some(json!({"data": null})), Headers::new());
        assert!(findings.with_rule(STATUS_RULE).any(|f| f.is_failure()));
    }

    #[test]
    fn test_error_status_agreement() {
        let body = json!({"errors": [{"status": "422"}]});
        let findings = check(Method::Patch, 400, Some(body), Headers::new());
        let warning = findings.warnings().next().unwrap();
        assert_eq!(warning.pointer(), "/errors/0/status");

        let body = json!({"errors": [{"status": "422"}, {"status": "409"}]});
        let findings = check(Method::Patch, 400, Some(body), Headers::new());
        assert_eq!(findings.warnings().count(), 0);
    }

    #[test]
    fn test_expected_status_mismatch() {
        let method = Method::Get;
        let headers = Headers::new();
        let findings = validate_status(
            StatusInput {
                method: &method,
                status: 200,
                body: Some(&json!({"data": null})),
                headers: &headers,
                expected_status: Some(406),
            },
            &ValidationContext::new(),
        );
        assert!(findings.with_rule(STATUS_RULE).any(|f| f.is_failure()));
    }
}
