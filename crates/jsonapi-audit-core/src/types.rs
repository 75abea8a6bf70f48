//! Read-only views over the shapes of a JSON:API document
//!
//! A parsed body is a `serde_json::Value`; these types classify the parts
//! whose shape decides how they are validated, once, so validators can
//! match exhaustively instead of re-probing the value.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP headers as captured; names keep their original case
pub type Headers = BTreeMap<String, String>;

/// Case-insensitive header lookup
pub fn header<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// `(type, id)` pair identifying a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Read the identifier of a resource or identifier object
    ///
    /// Returns `None` unless both `type` and `id` are strings.
    pub fn from_value(value: &Value) -> Option<Self> {
        let resource_type = value.get("type")?.as_str()?;
        let id = value.get("id")?.as_str()?;
        Some(Self::new(resource_type, id))
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.id)
    }
}

/// Shape of a document's primary `data`
#[derive(Debug, Clone, Copy)]
pub enum PrimaryData<'a> {
    Null,
    Single(&'a Value),
    Collection(&'a [Value]),
    /// A value that is neither null, an object nor an array
    Invalid(&'a Value),
}

impl<'a> PrimaryData<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Null => PrimaryData::Null,
            Value::Object(_) => PrimaryData::Single(value),
            Value::Array(items) => PrimaryData::Collection(items),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => PrimaryData::Invalid(value),
        }
    }

    /// The resource values contained in the primary data
    pub fn resources(&self) -> Vec<&'a Value> {
        match *self {
            PrimaryData::Single(value) => vec![value],
            PrimaryData::Collection(items) => items.iter().collect(),
            PrimaryData::Null | PrimaryData::Invalid(_) => Vec::new(),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, PrimaryData::Collection(_))
    }
}

/// Shape of a relationship's `data` (resource linkage)
#[derive(Debug, Clone, Copy)]
pub enum Linkage<'a> {
    /// Empty to-one relationship
    Empty,
    ToOne(&'a Value),
    ToMany(&'a [Value]),
    Invalid(&'a Value),
}

impl<'a> Linkage<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Null => Linkage::Empty,
            Value::Object(_) => Linkage::ToOne(value),
            Value::Array(items) => Linkage::ToMany(items),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => Linkage::Invalid(value),
        }
    }

    /// Identifier objects carried by the linkage
    pub fn identifiers(&self) -> Vec<&'a Value> {
        match *self {
            Linkage::ToOne(value) => vec![value],
            Linkage::ToMany(items) => items.iter().collect(),
            Linkage::Empty | Linkage::Invalid(_) => Vec::new(),
        }
    }
}

/// HTTP method of the request under audit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
    Head,
    Options,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Other(other) => other,
        }
    }

    /// Whether the method may carry a request document
    pub fn sends_document(&self) -> bool {
        matches!(self, Method::Post | Method::Patch | Method::Put | Method::Delete)
    }
}

impl From<&str> for Method {
    fn from(method: &str) -> Self {
        match method.trim().to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PATCH" => Method::Patch,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every `(type,id)` referenced through a resource's relationships
pub fn relationship_targets(resource: &Value) -> Vec<ResourceIdentifier> {
    let Some(relationships) = resource.get("relationships").and_then(Value::as_object) else {
        return Vec::new();
    };
    relationships
        .values()
        .filter_map(|rel| rel.get("data"))
        .flat_map(|data| Linkage::classify(data).identifiers())
        .filter_map(ResourceIdentifier::from_value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_from_value() {
        let id = ResourceIdentifier::from_value(&json!({"type": "people", "id": "9"}));
        assert_eq!(id, Some(ResourceIdentifier::new("people", "9")));
        assert_eq!(ResourceIdentifier::from_value(&json!({"type": "people", "id": 9})), None);
        assert_eq!(id.unwrap().to_string(), "people:9");
    }

    #[test]
    fn test_primary_data_classify() {
        let data = json!([{"type": "a", "id": "1"}, {"type": "a", "id": "2"}]);
        let primary = PrimaryData::classify(&data);
        assert!(primary.is_collection());
        assert_eq!(primary.resources().len(), 2);
        assert!(matches!(PrimaryData::classify(&json!("x")), PrimaryData::Invalid(_)));
    }

    #[test]
    fn test_relationship_targets() {
        let resource = json!({
            "type": "articles",
            "id": "1",
            "relationships": {
                "author": {"data": {"type": "people", "id": "9"}},
                "comments": {"data": [{"type": "comments", "id": "5"}, {"type": "comments", "id": "12"}]},
                "editor": {"data": null}
            }
        });
        let targets = relationship_targets(&resource);
        assert_eq!(targets.len(), 3);
        assert!(targets.contains(&ResourceIdentifier::new("comments", "12")));
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/vnd.api+json".to_string());
        assert_eq!(header(&headers, "content-type"), Some("application/vnd.api+json"));
        assert_eq!(header(&headers, "accept"), None);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::from("patch"), Method::Patch);
        assert_eq!(Method::from(" GET "), Method::Get);
        assert_eq!(Method::from("PURGE"), Method::Other("PURGE".to_string()));
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
