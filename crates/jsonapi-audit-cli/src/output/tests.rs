// Tests for report rendering

use super::*;
use jsonapi_audit_core::orchestrator::ReportedRequest;
use jsonapi_audit_core::{Finding, FindingSet};

fn report(findings: Vec<Finding>) -> ValidationReport {
    let findings: FindingSet = findings.into_iter().collect();
    ValidationReport {
        request: ReportedRequest {
            method: "GET".to_string(),
            url: "http://example.com/articles".to_string(),
            http_status: 200,
        },
        summary: findings.summary(),
        findings,
        generated_at: Default::default(),
    }
}

fn sample() -> ValidationReport {
    report(vec![
        Finding::passed("Content-Type Header", "Content-Type is application/vnd.api+json"),
        Finding::failed("Included Resource Linkage", "people/10 is not reachable").at("/included/1"),
        Finding::warning("Vary Header", "Response should include 'Vary: Accept'"),
    ])
}

#[test]
fn test_human_report_hides_passed_by_default() {
    let text = format_report_human("exchange.json", &sample(), ReportView::default(), false);
    assert!(text.starts_with("exchange.json GET http://example.com/articles -> 200\n"));
    assert!(!text.contains("PASS"));
    assert!(text.contains("FAIL Included Resource Linkage: people/10 is not reachable\n"));
    assert!(text.contains("    at /included/1\n"));
    assert!(text.contains("WARN Vary Header"));
    assert!(text.ends_with("1 passed, 1 warning(s), 1 failure(s)\n"));
}

#[test]
fn test_human_report_groups_by_category() {
    let view = ReportView {
        show_passed: true,
        group_by_category: true,
    };
    let text = format_report_human("exchange.json", &sample(), view, false);

    let content_type = text.find("[content-type]").unwrap();
    let relationship = text.find("[relationship]").unwrap();
    assert!(content_type < relationship);
    assert!(text.contains("    PASS Content-Type Header"));
}

#[test]
fn test_machine_formats() {
    let report = sample();
    let json = OutputFormat::Json.format(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["summary"]["failed"], 1);
    assert_eq!(value["findings"][1]["location"]["pointer"], "/included/1");

    let yaml = OutputFormat::Yaml.format(&report).unwrap();
    assert!(yaml.contains("rule: Vary Header"));
}
