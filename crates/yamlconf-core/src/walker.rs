//! Whole-tree traversal
//!
//! Applies [`StringResolver`] to every string in a tree and builds a new
//! tree from the results. A sequence element that resolves to a sequence is
//! spliced into its parent; mapping keys are never touched.

use crate::error::{Error, ErrorKind};
use crate::path;
use crate::placeholder;
use crate::resolver::ResolutionContext;
use crate::substitute::StringResolver;
use crate::value::Value;

/// Walks a tree once, resolving strings against the context's root
pub struct TreeWalker<'a> {
    ctx: ResolutionContext<'a>,
    strings: StringResolver<'a>,
    replacements: usize,
    diagnostics: Vec<Error>,
    halted: bool,
}

impl<'a> TreeWalker<'a> {
    pub fn new(ctx: ResolutionContext<'a>) -> Self {
        Self {
            ctx,
            strings: StringResolver::new(ctx),
            replacements: 0,
            diagnostics: Vec::new(),
            halted: false,
        }
    }

    /// Resolve `node` (usually the root itself) into a new tree
    pub fn walk(&mut self, node: &Value) -> Value {
        self.walk_at(node, "")
    }

    /// Number of values replaced so far
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Errors for strings that were kept unresolved
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// True once the pass ran out of growth budget; later strings are left as is
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn into_diagnostics(self) -> Vec<Error> {
        self.diagnostics
    }

    fn walk_at(&mut self, node: &Value, at: &str) -> Value {
        match node {
            Value::String(s) => self.resolve_string(s, at),
            Value::Sequence(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let item_path = path::join(at, idx);
                    match item {
                        Value::String(s) => match self.resolve_string(s, &item_path) {
                            Value::Sequence(spliced) => resolved.extend(spliced),
                            other => resolved.push(other),
                        },
                        other => resolved.push(self.walk_at(other, &item_path)),
                    }
                }
                Value::Sequence(resolved)
            }
            Value::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(key, value)| (key.clone(), self.walk_at(value, &path::join(at, key))))
                    .collect(),
            ),
            Value::Null | Value::Bool(_) | Value::Integer(_) | Value::Float(_) => node.clone(),
        }
    }

    fn resolve_string(&mut self, input: &str, at: &str) -> Value {
        if self.halted {
            return Value::String(input.to_string());
        }
        match self.strings.resolve(input, at) {
            Ok(resolved) if resolved.succeeded => {
                if !matches!(&resolved.value, Value::String(s) if s == input) {
                    self.replacements += 1;
                }
                resolved.value
            }
            Ok(_) => Value::String(input.to_string()),
            Err(err) => {
                if matches!(err.kind, ErrorKind::GrowthLimitExceeded { .. }) {
                    self.halted = true;
                }
                self.ctx.observer.diagnostic(&err);
                self.diagnostics.push(err);
                Value::String(input.to_string())
            }
        }
    }
}

/// A placeholder still present in a resolved tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// Dotted location of the string holding the placeholder
    pub path: String,
    /// The placeholder text, e.g. `${missing.key}`
    pub token: String,
}

/// List every placeholder left in `tree`, in document order
pub fn unresolved_placeholders(tree: &Value) -> Vec<Unresolved> {
    let mut found = Vec::new();
    collect_unresolved(tree, "", &mut found);
    found
}

fn collect_unresolved(node: &Value, at: &str, found: &mut Vec<Unresolved>) {
    match node {
        Value::String(s) => {
            found.extend(placeholder::placeholders(s).map(|p| Unresolved {
                path: at.to_string(),
                token: p.token.to_string(),
            }));
        }
        Value::Sequence(items) => {
            for (idx, item) in items.iter().enumerate() {
                collect_unresolved(item, &path::join(at, idx), found);
            }
        }
        Value::Mapping(map) => {
            for (key, value) in map {
                collect_unresolved(value, &path::join(at, key), found);
            }
        }
        _ => {}
    }
}
