//! Immutable validation context threaded through every validator
//!
//! Recursive calls derive a child context with an extended pointer; a
//! context is never mutated in place.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::config::ValidationOptions;
use crate::pointer;
use std::sync::Arc;

/// Validation context for passing location and policy information
#[derive(Debug, Clone)]
pub struct ValidationContext {
    allow_missing_id: bool,
    read_only_fields: Arc<[String]>,
    pointer: String,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationContext {
    /// Create a root context with default options
    pub fn new() -> Self {
        Self {
            allow_missing_id: false,
            read_only_fields: Arc::from(Vec::new()),
            pointer: String::new(),
        }
    }

    /// Create a root context from envelope options
    pub fn from_options(options: &ValidationOptions) -> Self {
        Self {
            allow_missing_id: options.allow_missing_id,
            read_only_fields: Arc::from(options.read_only_fields.clone()),
            pointer: String::new(),
        }
    }

    /// Create a child context with an appended pointer token
    pub fn child<S: AsRef<str>>(&self, segment: S) -> Self {
        Self {
            allow_missing_id: self.allow_missing_id,
            read_only_fields: Arc::clone(&self.read_only_fields),
            pointer: pointer::join(&self.pointer, segment.as_ref()),
        }
    }

    /// Create a child context for an array index
    pub fn child_index(&self, index: usize) -> Self {
        self.child(index.to_string())
    }

    /// Derive a copy with a different missing-id policy
    pub fn with_allow_missing_id(&self, allow: bool) -> Self {
        Self {
            allow_missing_id: allow,
            ..self.clone()
        }
    }

    /// Derive a copy rooted at a different pointer prefix
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        Self {
            pointer: prefix.into(),
            ..self.clone()
        }
    }

    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn allow_missing_id(&self) -> bool {
        self.allow_missing_id
    }

    pub fn read_only_fields(&self) -> &[String] {
        &self.read_only_fields
    }

    pub fn is_read_only(&self, field: &str) -> bool {
        self.read_only_fields.iter().any(|f| f == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_extends_pointer() {
        let ctx = ValidationContext::new();
        let child = ctx.child("data").child_index(0).child("attributes");
        assert_eq!(child.pointer(), "/data/0/attributes");
        assert_eq!(ctx.pointer(), "");
    }

    #[test]
    fn test_child_escapes_tokens() {
        let ctx = ValidationContext::new().child("meta").child("a/b~c");
        assert_eq!(ctx.pointer(), "/meta/a~1b~0c");
    }

    #[test]
    fn test_derived_copy_keeps_parent() {
        let options = ValidationOptions::default().with_read_only_fields(["created"]);
        let root = ValidationContext::from_options(&options);
        let relaxed = root.with_allow_missing_id(true);
        assert!(!root.allow_missing_id());
        assert!(relaxed.allow_missing_id());
        assert!(relaxed.is_read_only("created"));
    }
}
