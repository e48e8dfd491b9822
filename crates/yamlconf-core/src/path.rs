//! Dotted path lookup
//!
//! A path like `servers.0.host` is split on `.`; each segment selects a
//! mapping key, or a sequence index when the current node is a sequence and
//! the segment is a non-negative integer.

use crate::value::Value;

/// A path segment as a sequence index, if it is a non-negative integer
pub fn as_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Look up `path` in `tree`
///
/// Returns `None` for missing keys, out-of-range indices and for paths that
/// try to descend into a scalar.
pub fn get<'v>(tree: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(tree, |current, segment| match current {
        Value::Mapping(map) => map.get(segment),
        Value::Sequence(seq) => as_index(segment).and_then(|idx| seq.get(idx)),
        _ => None,
    })
}

/// Check whether `path` exists in `tree`
pub fn has(tree: &Value, path: &str) -> bool {
    get(tree, path).is_some()
}

/// Whether `path` is `ancestor` itself or lies below it
pub fn is_within(path: &str, ancestor: &str) -> bool {
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Append a key or index to a dotted path prefix
pub(crate) fn join(prefix: &str, segment: impl std::fmt::Display) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}
