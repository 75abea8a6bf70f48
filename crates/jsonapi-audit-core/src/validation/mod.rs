//! Rule checkers for JSON:API documents and exchanges
//!
//! Every validator is a pure function of `(value, context) -> FindingSet`.
//! Leaf validators (member names, links) are composed by the resource,
//! error and document validators; request, negotiation, status, query and
//! pagination validators look at the surrounding HTTP exchange.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

pub mod content_negotiation;
pub mod document;
pub mod error_object;
pub mod linkage;
pub mod links;
pub mod member_name;
pub mod pagination;
pub mod query;
pub mod request;
pub mod resource;
pub mod status;

// Re-export commonly used entry points
pub use content_negotiation::{
    validate_content_negotiation, Exchange, MediaType, NegotiationOutcome,
};
pub use document::{validate_document, validate_document_with, LinkagePolicy};
pub use error_object::{validate_error_object, validate_errors};
pub use linkage::analyze_linkage;
pub use links::{check_url, validate_link, validate_links_object};
pub use member_name::{check_member_name, validate_member_name, MemberKind};
pub use pagination::{validate_pagination, PaginationMode};
pub use query::{validate_query, QueryParameters};
pub use request::validate_request_document;
pub use resource::{validate_resource, validate_resource_identifier};
pub use status::{validate_status, StatusInput};

/// Validate a document with a fresh root context
///
/// # Examples
///
/// ```rust
/// use jsonapi_audit_core::validation::validate_root_document;
/// use serde_json::json;
///
/// let findings = validate_root_document(&json!({
///     "data": {"type": "articles", "id": "1", "attributes": {"title": "Hello"}}
/// }));
/// assert!(!findings.has_failures());
/// ```
pub fn validate_root_document(document: &serde_json::Value) -> crate::finding::FindingSet {
    validate_document(document, &crate::context::ValidationContext::new())
}
