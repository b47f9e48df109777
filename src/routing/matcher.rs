//! Path template matching.
//!
//! # Responsibilities
//! - Compile a route template into segments
//! - Match a request path against the compiled segments
//!
//! # Design Decisions
//! - Literal segments are case-sensitive
//! - `:name` and `{name}` match exactly one non-empty segment
//! - `*name` and `{*name}` match the remainder and must come last
//! - Trailing slashes are ignored on both sides
//! - No regex, O(segments) per match

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    CatchAll,
}

/// Error compiling a route template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("route template must start with '/': {0:?}")]
    NotAbsolute(String),

    #[error("catch-all must be the last segment: {0:?}")]
    CatchAllNotLast(String),
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        if !template.starts_with('/') {
            return Err(TemplateError::NotAbsolute(template.to_string()));
        }

        let parts: Vec<&str> = split(template).collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = if part.starts_with('*') || part.starts_with("{*") {
                if i + 1 != parts.len() {
                    return Err(TemplateError::CatchAllNotLast(template.to_string()));
                }
                Segment::CatchAll
            } else if part.starts_with(':') || (part.starts_with('{') && part.ends_with('}')) {
                Segment::Param
            } else {
                Segment::Literal((*part).to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the template has no parameters.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// True when both templates match exactly the same paths.
    pub fn same_shape(&self, other: &PathTemplate) -> bool {
        self.segments == other.segments
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut parts = split(path);
        for segment in &self.segments {
            match segment {
                Segment::CatchAll => return true,
                Segment::Param => {
                    if parts.next().is_none() {
                        return false;
                    }
                }
                Segment::Literal(lit) => {
                    if parts.next() != Some(lit.as_str()) {
                        return false;
                    }
                }
            }
        }
        parts.next().is_none()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match() {
        let t = PathTemplate::parse("/api/test1").unwrap();
        assert!(t.is_literal());
        assert!(t.matches("/api/test1"));
        assert!(t.matches("/api/test1/"));
        assert!(!t.matches("/api/test2"));
        assert!(!t.matches("/api/test1/extra"));
        assert!(!t.matches("/API/test1"));
    }

    #[test]
    fn root_template() {
        let t = PathTemplate::parse("/").unwrap();
        assert!(t.matches("/"));
        assert!(!t.matches("/x"));
    }

    #[test]
    fn params_match_one_segment() {
        for template in ["/users/:id", "/users/{id}"] {
            let t = PathTemplate::parse(template).unwrap();
            assert!(!t.is_literal());
            assert!(t.matches("/users/42"));
            assert!(!t.matches("/users"));
            assert!(!t.matches("/users/42/posts"));
        }
    }

    #[test]
    fn catch_all_matches_rest() {
        for template in ["/files/*rest", "/files/{*rest}"] {
            let t = PathTemplate::parse(template).unwrap();
            assert!(t.matches("/files/a/b/c"));
            assert!(t.matches("/files"));
            assert!(!t.matches("/other/a"));
        }
    }

    #[test]
    fn invalid_templates() {
        assert_eq!(
            PathTemplate::parse("api/test"),
            Err(TemplateError::NotAbsolute("api/test".into()))
        );
        assert!(matches!(
            PathTemplate::parse("/a/*rest/b"),
            Err(TemplateError::CatchAllNotLast(_))
        ));
    }
}
