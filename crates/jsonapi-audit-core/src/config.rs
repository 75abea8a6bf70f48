//! Per-call validation options
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};

/// Whether clients may supply their own resource ids on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientIdPolicy {
    /// Client-generated ids are accepted
    #[default]
    Allowed,
    /// The server rejects client-generated ids
    Forbidden,
}

/// Options carried by the input envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationOptions {
    /// Accept resource objects without an `id` in the response body
    pub allow_missing_id: bool,
    /// Fields a client must never send in a request document
    pub read_only_fields: Vec<String>,
    /// Client-generated id policy for POST requests
    pub client_generated_ids: ClientIdPolicy,
    /// Warn when a response omits `Vary: Accept`
    pub require_vary_accept: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            allow_missing_id: false,
            read_only_fields: Vec::new(),
            client_generated_ids: ClientIdPolicy::Allowed,
            require_vary_accept: true,
        }
    }
}

impl ValidationOptions {
    pub fn with_allow_missing_id(mut self, allow: bool) -> Self {
        self.allow_missing_id = allow;
        self
    }

    pub fn with_read_only_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read_only_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_client_generated_ids(mut self, policy: ClientIdPolicy) -> Self {
        self.client_generated_ids = policy;
        self
    }

    /// Overlay another set of options; list fields are unioned
    pub fn merge(&mut self, other: ValidationOptions) {
        self.allow_missing_id |= other.allow_missing_id;
        for field in other.read_only_fields {
            if !self.read_only_fields.contains(&field) {
                self.read_only_fields.push(field);
            }
        }
        if other.client_generated_ids == ClientIdPolicy::Forbidden {
            self.client_generated_ids = ClientIdPolicy::Forbidden;
        }
        self.require_vary_accept &= other.require_vary_accept;
    }
}
