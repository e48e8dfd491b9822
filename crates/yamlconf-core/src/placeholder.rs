//! Placeholder matching
//!
//! Recognizes self-references of the form `${path.to.value}`. The path may
//! contain ASCII letters, digits, `_`, `.` and `-`. There is no escape
//! syntax and braces do not nest.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

const PLACEHOLDER_PATTERN: &str = r"\$\{([A-Za-z0-9_.\-]+)\}";

fn placeholder_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"))
}

/// A single `${...}` occurrence inside a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The full matched text, including `${` and `}`
    pub token: &'a str,
    /// The dotted path between the braces
    pub path: &'a str,
    /// Byte range of `token` in the searched string
    pub start: usize,
    pub end: usize,
}

impl Placeholder<'_> {
    /// Byte range of the token in the searched string
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Iterate over the placeholders in `input`, left to right
pub fn placeholders(input: &str) -> impl Iterator<Item = Placeholder<'_>> {
    placeholder_regex().captures_iter(input).filter_map(|caps| {
        let token = caps.get(0)?;
        let path = caps.get(1)?;
        Some(Placeholder {
            token: token.as_str(),
            path: path.as_str(),
            start: token.start(),
            end: token.end(),
        })
    })
}

/// Check if a string contains at least one placeholder
pub fn contains_placeholder(input: &str) -> bool {
    placeholder_regex().is_match(input)
}

/// The placeholder path if `input` is exactly one placeholder and nothing else
pub fn whole_placeholder(input: &str) -> Option<&str> {
    let first = placeholders(input).next()?;
    (first.start == 0 && first.end == input.len()).then_some(first.path)
}
