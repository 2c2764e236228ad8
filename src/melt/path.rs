//! Dotted document paths with list expansion
//!
//! A path such as `info.participants[].units[]` is a sequence of segments.
//! A plain segment descends into an object key; a segment suffixed with `[]`
//! descends into a list and continues independently for every element.
//!
//! Resolution never fails: a missing key or a container of the wrong shape
//! simply drops that branch.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

static SEGMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^.\[\]]+)(\[\])?$").unwrap()
});

const EXPANSION_MARKER: &str = "[]";

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Descend into an object key
    Key(String),
    /// Descend into an object key holding a list, branching per element
    Expand(String),
}

impl Segment {
    pub fn key(&self) -> &str {
        match self {
            Segment::Key(k) | Segment::Expand(k) => k,
        }
    }

    pub fn is_expansion(&self) -> bool {
        matches!(self, Segment::Expand(_))
    }
}

/// A parsed, validated path. The empty path addresses the document itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocPath {
    segments: Vec<Segment>,
}

impl DocPath {
    pub fn root() -> Self {
        DocPath::default()
    }

    /// Parse a dotted path, validating every segment
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.is_empty() {
            return Ok(DocPath::root());
        }

        let mut segments = Vec::new();
        for part in raw.split('.') {
            let caps = SEGMENT_REGEX
                .captures(part)
                .ok_or_else(|| ConfigError::InvalidPath {
                    path: raw.to_string(),
                    segment: part.to_string(),
                })?;

            let key = caps[1].to_string();
            if caps.get(2).is_some() {
                segments.push(Segment::Expand(key));
            } else {
                segments.push(Segment::Key(key));
            }
        }

        Ok(DocPath { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_expansion(&self) -> bool {
        self.segments.iter().any(Segment::is_expansion)
    }

    pub fn ends_in_expansion(&self) -> bool {
        self.segments.last().map_or(false, Segment::is_expansion)
    }

    /// Whether every match of this path has an enclosing list element above it
    pub fn has_enclosing(&self) -> bool {
        let expansions = self.segments.iter().filter(|s| s.is_expansion()).count();
        if self.ends_in_expansion() {
            expansions >= 2
        } else {
            expansions >= 1
        }
    }
}

impl FromStr for DocPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocPath::parse(s)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment.key())?;
            if segment.is_expansion() {
                f.write_str(EXPANSION_MARKER)?;
            }
        }
        Ok(())
    }
}

/// One matched sub-structure together with its context
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    /// The matched node
    pub node: &'a Value,

    /// Nearest expanded list element strictly above `node`
    pub enclosing: Option<&'a Value>,

    /// Position of the most recently expanded element within its list
    pub ordinal: Option<usize>,
}

/// In-progress resolution branch
#[derive(Clone, Copy)]
struct Branch<'a> {
    node: &'a Value,
    frame: Option<&'a Value>,
    outer: Option<&'a Value>,
    ordinal: Option<usize>,
}

/// Resolve a path against a document, returning matches in document order
pub fn resolve<'a>(document: &'a Value, path: &DocPath) -> Vec<Match<'a>> {
    let mut branches = vec![Branch {
        node: document,
        frame: None,
        outer: None,
        ordinal: None,
    }];

    for segment in &path.segments {
        let mut next = Vec::new();

        for branch in &branches {
            let Some(child) = branch.node.as_object().and_then(|o| o.get(segment.key())) else {
                continue;
            };

            match segment {
                Segment::Key(_) => {
                    if child.is_null() {
                        continue;
                    }
                    next.push(Branch { node: child, ..*branch });
                }
                Segment::Expand(_) => {
                    let Value::Array(items) = child else {
                        continue;
                    };
                    for (idx, item) in items.iter().enumerate() {
                        next.push(Branch {
                            node: item,
                            frame: Some(item),
                            outer: branch.frame,
                            ordinal: Some(idx),
                        });
                    }
                }
            }
        }

        branches = next;
        if branches.is_empty() {
            break;
        }
    }

    let ends_in_expansion = path.ends_in_expansion();
    branches
        .into_iter()
        .map(|b| Match {
            node: b.node,
            enclosing: if ends_in_expansion { b.outer } else { b.frame },
            ordinal: b.ordinal,
        })
        .collect()
}

/// Follow a plain path (no expansion) from `value`
///
/// Returns `None` on any miss. An expansion segment is treated as a miss.
pub fn lookup<'a>(value: &'a Value, path: &DocPath) -> Option<&'a Value> {
    let mut current = value;
    for segment in &path.segments {
        match segment {
            Segment::Key(key) => {
                current = current.as_object()?.get(key)?;
            }
            Segment::Expand(_) => return None,
        }
    }
    Some(current)
}
