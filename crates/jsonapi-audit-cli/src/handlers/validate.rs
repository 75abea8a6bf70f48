//! Validate command handler

use crate::cli::{OutputFormat, ValidateArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{redaction, timing::Timer};
use crate::output::{OutputWriter, ReportView};
use jsonapi_audit_core::{run, ValidationReport, ValidationRequest};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, instrument, trace, warn};

/// Handle the validate command
#[instrument(skip_all, fields(envelopes = args.envelopes.len()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("validate_command");

    let mut config = config.clone();
    config.apply_args(&args);
    let view = ReportView {
        show_passed: config.output.show_passed,
        group_by_category: config.output.group_by_category,
    };

    let mut reports = Vec::with_capacity(args.envelopes.len());
    for path in &args.envelopes {
        let mut request = load_envelope(path)?;
        request.options.merge(config.validation.clone());

        let report = {
            let _timer = Timer::with_details("validate_exchange", &path.display().to_string());
            run(&request)
        };
        info!(
            file = %path.display(),
            failed = report.summary.failed,
            warnings = report.summary.warnings,
            "Exchange validated"
        );

        if output.format() == OutputFormat::Human {
            output.report(&path.display().to_string(), &report, view)?;
        }
        reports.push(report);
    }

    if output.format() != OutputFormat::Human {
        output.data(&reports)?;
    }

    verdict(&reports, config.output.fail_on_warnings, output)
}

/// Read and parse one envelope file
fn load_envelope(path: &Path) -> Result<ValidationRequest> {
    if !path.exists() {
        error!("File not found: {}", path.display());
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    debug!(bytes = content.len(), file = %path.display(), "Envelope read");

    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    let json = if is_yaml {
        let value: serde_json::Value =
            serde_yaml::from_str(&content).map_err(|e| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "a YAML envelope".to_string(),
                reason: e.to_string(),
            })?;
        serde_json::to_string(&value)?
    } else {
        content
    };

    let request = ValidationRequest::from_json_str(&json).map_err(|e| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: "a request/response envelope".to_string(),
        reason: e.to_string(),
    })?;

    trace!(exchange = ?redaction::redacted_exchange(&request), "Envelope parsed");
    Ok(request)
}

/// Pick the exit status for a batch of reports
fn verdict(reports: &[ValidationReport], fail_on_warnings: bool, output: &mut OutputWriter) -> Result<()> {
    let failing: Vec<&ValidationReport> = reports
        .iter()
        .filter(|r| r.has_failures() || (fail_on_warnings && r.has_warnings()))
        .collect();

    if failing.is_empty() {
        output.success(&format!("✓ {} exchange(s) conform", reports.len()))?;
        return Ok(());
    }

    let failed: usize = failing.iter().map(|r| r.summary.failed).sum();
    let warnings: usize = failing.iter().map(|r| r.summary.warnings).sum();
    warn!(exchanges = failing.len(), failed, warnings, "Non-conforming exchanges");
    Err(Error::ValidationFailed {
        exchanges: failing.len(),
        failed,
        warnings,
    })
}
