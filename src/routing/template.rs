//! Uri templates
//!
//! A template is a `/`-separated path where a segment of the form `{name}`
//! binds exactly one non-empty request segment. Empty segments are ignored,
//! so `/items/` and `/items` are the same template.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parse a template, rejecting malformed `{...}` segments
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        for part in raw.split('/').filter(|s| !s.is_empty()) {
            if let Some(name) = part.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if name.is_empty() || !name.chars().all(is_word_char) {
                    return Err(format!("bad path parameter [{part}] in [{raw}]"));
                }
                segments.push(Segment::Param(name.to_string()));
            } else if part.contains('{') || part.contains('}') {
                return Err(format!("bad path segment [{part}] in [{raw}]"));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Parameters are shape-only: `/a/{id}` and `/a/{key}` share a shape
    pub fn shape(&self) -> String {
        let mut shape = String::new();
        for segment in &self.segments {
            shape.push('/');
            match segment {
                Segment::Literal(text) => shape.push_str(text),
                Segment::Param(_) => shape.push_str("{}"),
            }
        }
        if shape.is_empty() {
            shape.push('/');
        }
        shape
    }

    /// Bind a concrete request path, returning the captured parameters
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(text) if text == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(params)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Canonical form used for uri bookkeeping: leading `/`, no empty segments
pub fn normalize(uri: &str) -> String {
    let joined = uri
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// Shape of a raw uri for collision checks; unparseable uris compare as normalized text
pub fn shape_of(uri: &str) -> String {
    UriTemplate::parse(uri).map_or_else(|_| normalize(uri), |t| t.shape())
}

/// Ordered `{name}` parameters of a uri
pub fn id_params(uri: &str) -> Vec<String> {
    uri.split('/')
        .filter_map(|part| part.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// The uri up to its first parameter, e.g. `/items/{id}` -> `/items`
pub fn base_uri(uri: &str) -> String {
    let prefix = uri.find('{').map_or(uri, |idx| &uri[..idx]);
    normalize(prefix)
}
