//! RFC 6901 JSON Pointer helpers
//!
//! Finding locations are expressed as JSON Pointers, and error objects carry
//! `source.pointer` values that must be syntactically well-formed. Only syntax
//! is checked here; whether a pointer resolves inside a document is not.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Syntax violations of an RFC 6901 JSON Pointer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    /// Non-empty pointer that does not begin with `/`
    #[error("JSON Pointer must be empty or start with '/'")]
    MissingLeadingSlash,

    /// A `~` not followed by `0` or `1`
    #[error("invalid escape '~{found}' at byte {position}; '~' must be followed by '0' or '1'")]
    InvalidEscape { position: usize, found: String },
}

/// Escape a single reference token (`~` → `~0`, `/` → `~1`)
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverse [`escape_segment`]
pub fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Append an unescaped token to an existing pointer
pub fn join(pointer: &str, segment: &str) -> String {
    format!("{}/{}", pointer, escape_segment(segment))
}

/// Check a string against the RFC 6901 grammar
///
/// ```rust
/// use jsonapi_audit_core::pointer::check_pointer;
///
/// assert!(check_pointer("/a/b~0c").is_ok());
/// assert!(check_pointer("").is_ok());
/// assert!(check_pointer("/a/~2").is_err());
/// assert!(check_pointer("no-leading-slash").is_err());
/// ```
pub fn check_pointer(pointer: &str) -> Result<(), PointerError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::MissingLeadingSlash);
    }

    let mut chars = pointer.char_indices().peekable();
    while let Some((position, c)) = chars.next() {
        if c != '~' {
            continue;
        }
        match chars.peek() {
            Some((_, '0')) | Some((_, '1')) => {
                chars.next();
            }
            Some((_, other)) => {
                return Err(PointerError::InvalidEscape {
                    position,
                    found: other.to_string(),
                })
            }
            None => {
                return Err(PointerError::InvalidEscape {
                    position,
                    found: String::new(),
                })
            }
        }
    }

    Ok(())
}

/// Split a well-formed pointer into its unescaped reference tokens
pub fn segments(pointer: &str) -> Vec<String> {
    let Some(tokens) = pointer.strip_prefix('/') else {
        return Vec::new();
    };
    tokens.split('/').map(unescape_segment).collect()
}

/// Render a pointer as a human-readable path such as `data[0].attributes.title`
pub fn describe(pointer: &str) -> String {
    let tokens = segments(pointer);
    if tokens.is_empty() {
        return "document root".to_string();
    }

    let mut out = String::new();
    for token in tokens {
        if !out.is_empty() && token.chars().all(|c| c.is_ascii_digit()) && !token.is_empty() {
            out.push_str(&format!("[{}]", token));
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(&token);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_pointer_valid() {
        assert!(check_pointer("").is_ok());
        assert!(check_pointer("/").is_ok());
        assert!(check_pointer("/data/attributes/title").is_ok());
        assert!(check_pointer("/a/b~0c").is_ok());
        assert!(check_pointer("/a~1b/0").is_ok());
    }

    #[test]
    fn test_check_pointer_bad_escape() {
        let err = check_pointer("/a/~2").unwrap_err();
        assert_eq!(
            err,
            PointerError::InvalidEscape {
                position: 3,
                found: "2".to_string()
            }
        );
        assert!(check_pointer("/a/~").is_err());
    }

    #[test]
    fn test_check_pointer_missing_slash() {
        assert_eq!(
            check_pointer("no-leading-slash"),
            Err(PointerError::MissingLeadingSlash)
        );
    }

    #[test]
    fn test_escape_round_trip() {
        let raw = "a/b~c";
        assert_eq!(escape_segment(raw), "a~1b~0c");
        assert_eq!(unescape_segment(&escape_segment(raw)), raw);
    }

    #[test]
    fn test_segments_keep_empty_tokens() {
        assert!(segments("").is_empty());
        assert_eq!(segments("/"), vec![""]);
        assert_eq!(segments("//a"), vec!["", "a"]);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(""), "document root");
        assert_eq!(describe("/data/0/attributes/title"), "data[0].attributes.title");
        assert_eq!(describe("/included/3"), "included[3]");
        assert_eq!(describe("/meta/a~1b"), "meta.a/b");
    }
}
