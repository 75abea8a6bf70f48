//! JSON:API Audit Core - conformance validation engine
//!
//! This crate checks captured HTTP exchanges against the JSON:API
//! specification. Validators traverse arbitrarily shaped JSON, emit
//! severity-tagged [`Finding`]s located by RFC 6901 JSON Pointers, and run
//! whole-document analyses: linkage across compound documents, duplicate
//! detection, sort order against the declared `sort`, and pagination link
//! consistency.
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonapi_audit_core::{validate_document, ValidationContext};
//! use serde_json::json;
//!
//! let document = json!({
//!     "data": {"type": "articles", "id": "1", "attributes": {"title": "Hello"}},
//!     "errors": [{"status": "500"}]
//! });
//!
//! let findings = validate_document(&document, &ValidationContext::new());
//! let failure = findings.failures().next().unwrap();
//! assert_eq!(failure.rule, "Data and Errors Exclusivity");
//! ```
//!
//! ## Validating an exchange
//!
//! [`orchestrator::run`] takes a [`ValidationRequest`] (status, headers,
//! parsed body, request line and options) and returns a
//! [`ValidationReport`] with every finding and the summary counters.
//! Problems in the audited API are findings, never errors; [`Error`] only
//! covers input envelopes the engine cannot read.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod config;
pub mod context;
pub mod error;
pub mod finding;
pub mod kind;
pub mod orchestrator;
pub mod pointer;
pub mod report;
pub mod rules;
pub mod types;
pub mod validation;

// Re-export commonly used types for convenience
pub use config::{ClientIdPolicy, ValidationOptions};
pub use context::ValidationContext;
pub use error::{Error, Result};
pub use finding::{Finding, FindingSet, Location, Severity, Summary};
pub use kind::ValueKind;
pub use orchestrator::{run, validate_exchange, ValidationReport, ValidationRequest};
pub use report::{categorize, group_by_category, severity_histogram, Category, SeverityHistogram};
pub use types::{Headers, Method, ResourceIdentifier};
pub use validation::{validate_document, validate_resource};
