//! Output formatting and writing utilities
//!
//! Reports go to stdout either as machine-readable data (JSON, YAML) or as
//! a plain-text listing for people. Diagnostics go through `tracing` on
//! stderr and never mix with the report.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use jsonapi_audit_core::{group_by_category, severity_histogram, Finding, Severity, ValidationReport};
use serde::Serialize;
use std::io::{self, Write};
use tracing::trace;

/// What the human rendering includes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportView {
    pub show_passed: bool,
    pub group_by_category: bool,
}

/// Trait for formatting serializable output
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => {
                Ok(serde_json::to_string_pretty(value)?)
            }
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a success message (human format only)
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Writing data");
        self.writeln(formatted.trim_end())
    }

    /// Write one report in human form
    pub fn report(&mut self, label: &str, report: &ValidationReport, view: ReportView) -> Result<()> {
        if self.quiet && !report.has_failures() {
            return Ok(());
        }
        let rendered = format_report_human(label, report, view, self.use_color);
        self.writeln(rendered.trim_end())
    }
}

fn severity_marker(severity: Severity, use_color: bool) -> String {
    let (marker, plain) = match severity {
        Severity::Passed => ("✓".green(), "PASS"),
        Severity::Warning => ("!".yellow(), "WARN"),
        Severity::Failed => ("✗".red(), "FAIL"),
    };
    if use_color {
        marker.to_string()
    } else {
        plain.to_string()
    }
}

fn push_finding(out: &mut String, finding: &Finding, indent: &str, use_color: bool) {
    out.push_str(&format!(
        "{}{} {}: {}\n",
        indent,
        severity_marker(finding.severity, use_color),
        finding.rule,
        finding.message
    ));
    if let Some(location) = &finding.location {
        if location.pointer.is_empty() {
            out.push_str(&format!("{}    at the document root\n", indent));
        } else {
            out.push_str(&format!("{}    at {}\n", indent, location.pointer));
        }
    }
}

/// Render a report as text
pub fn format_report_human(
    label: &str,
    report: &ValidationReport,
    view: ReportView,
    use_color: bool,
) -> String {
    let mut out = String::new();
    let heading = format!(
        "{} {} {} -> {}",
        label, report.request.method, report.request.url, report.request.http_status
    );
    if use_color {
        out.push_str(&format!("{}\n", heading.bold()));
    } else {
        out.push_str(&format!("{}\n", heading));
    }

    let visible = |finding: &&Finding| view.show_passed || finding.severity != Severity::Passed;

    if view.group_by_category {
        for (category, findings) in group_by_category(&report.findings) {
            let shown: Vec<&Finding> = findings.into_iter().filter(|f| visible(f)).collect();
            if shown.is_empty() {
                continue;
            }
            out.push_str(&format!("  [{}]\n", category));
            for finding in shown {
                push_finding(&mut out, finding, "    ", use_color);
            }
        }
    } else {
        for finding in report.findings.iter().filter(visible) {
            push_finding(&mut out, finding, "  ", use_color);
        }
    }

    let histogram = severity_histogram(&report.findings);
    out.push_str(&format!(
        "  {} passed, {} warning(s), {} failure(s)\n",
        histogram.info, histogram.warning, histogram.error
    ));
    out
}

#[cfg(test)]
mod tests;
