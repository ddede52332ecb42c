//! Route template parsing and path matching
//!
//! A route template is a path made of `/`-separated segments. Each segment is
//! either a literal or a placeholder written as `{name}`:
//!
//! - `/home` - literal only
//! - `/hello/{name}` - one placeholder
//! - `/users/{user_id}/posts/{post_id}` - several placeholders
//!
//! Matching is exact and positional. The path must have the same number of
//! segments as the template; literal segments compare byte-for-byte and every
//! placeholder consumes exactly one non-empty segment. There is no prefix,
//! wildcard, or cross-segment matching.
//!
//! ```rust,ignore
//! use tomapi_core::router::template::match_path;
//!
//! let params = match_path("/hello/{name}", "/hello/Ada").unwrap();
//! assert_eq!(params.get("name"), Some("Ada"));
//!
//! assert!(match_path("/hello/{name}", "/hello/").is_none());
//! ```

use crate::error::{Error, Result};
use crate::path_params::PathParams;
use std::fmt;

/// One segment of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parse a template string.
    ///
    /// Fails with [`Error::InvalidTemplate`] when a placeholder has an empty
    /// name, braces are unbalanced, or a segment mixes literal text with a
    /// placeholder (e.g. `/file-{id}`).
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        for segment in template.split('/') {
            let opens = segment.matches('{').count();
            let closes = segment.matches('}').count();

            if opens == 0 && closes == 0 {
                segments.push(Segment::Literal(segment.to_string()));
                continue;
            }

            if opens != 1 || closes != 1 {
                return Err(invalid("unbalanced braces in segment"));
            }

            let name = segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
                .ok_or_else(|| invalid("a placeholder must span the whole segment"))?;

            if name.is_empty() {
                return Err(invalid("placeholder name is empty"));
            }

            segments.push(Segment::Param(name.to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// The template exactly as it was registered
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in template order (duplicates included)
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Number of `/`-separated segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Test `path` against this template, binding placeholders on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut parts = path.split('/');

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.as_str(), part);
                }
            }
        }

        // The path has more segments than the template.
        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}

impl fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Match a concrete path against a template string.
///
/// Returns `None` when the path does not match, or when the template itself
/// cannot be parsed.
pub fn match_path(template: &str, path: &str) -> Option<PathParams> {
    RouteTemplate::parse(template).ok()?.matches(path)
}
