//! Configuration merging
//!
//! This module holds the merge strategy used to compose bundler
//! configurations, together with the path expressions used to address values
//! inside them.
//!
//! ## Merge Strategy
//!
//! Fragments are folded left to right onto a copy of the base:
//!
//! - Scalars: the last writer wins.
//! - Lists: concatenated in fragment order, without deduplication.
//! - Maps: merged recursively with the same rules.
//! - Mismatched shapes: the last writer wins.
//!
//! ## Path Expressions
//!
//! The `PathSegment` enum and `parse_path` turn expressions such as
//! `resolve.alias.foo` or `module.rules[0].test` into segments for navigating
//! nested configuration values.

mod deep;

pub use deep::{merge, merge_maps, merge_values};

/// Represents a segment in a path expression for navigating nested structures
///
/// Path expressions like "module.rules[0].test" or "resolve.alias.widget"
/// are parsed into a sequence of PathSegments for navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// A named key for accessing object/map members
    Key(String),
    /// A numeric index for accessing array/sequence elements
    Index(usize),
}

/// Parse a path expression into segments.
///
/// Accepts dotted keys (`resolve.alias.widget`), list indices
/// (`module.rules[1].use`), quoted keys for names with dots or slashes
/// (`alias["@scope/pkg"]`, `node['base64-js']`) and `\.` for a literal dot.
///
/// ```
/// use packweave::merge::parse_path;
///
/// let segments = parse_path("module.rules[0].test");
/// assert_eq!(segments.len(), 4);
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = path.trim().chars();

    let flush = |key: &mut String, segments: &mut Vec<PathSegment>| {
        if !key.is_empty() {
            segments.push(PathSegment::Key(std::mem::take(key)));
        }
    };

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => key.extend(chars.next()),
            '.' => flush(&mut key, &mut segments),
            '[' => {
                flush(&mut key, &mut segments);
                let inner: String = chars.by_ref().take_while(|c| *c != ']').collect();
                let inner = inner.trim();
                let unquoted = ['"', '\''].iter().find_map(|q| {
                    inner.strip_prefix(*q).and_then(|rest| rest.strip_suffix(*q))
                });
                match (unquoted, inner.parse::<usize>()) {
                    (Some(name), _) => segments.push(PathSegment::Key(name.to_string())),
                    (None, Ok(index)) => segments.push(PathSegment::Index(index)),
                    (None, Err(_)) if !inner.is_empty() => {
                        segments.push(PathSegment::Key(inner.to_string()))
                    }
                    _ => {}
                }
            }
            _ => key.push(ch),
        }
    }
    flush(&mut key, &mut segments);

    segments
}
