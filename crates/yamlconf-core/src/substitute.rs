//! Placeholder substitution within a single string
//!
//! A string that is exactly one placeholder may resolve to any value,
//! including mappings and sequences. Otherwise every placeholder is replaced
//! textually and the result stays a string, unless a numeric value took part
//! in the substitution and the final text is itself a number.
//!
//! When a substitution leaves new placeholders behind, the new string is
//! resolved again against the same root, up to `max_depth` times.

use std::cell::Cell;

use crate::error::{Error, Result};
use crate::path;
use crate::placeholder;
use crate::resolver::{ResolutionContext, SubstitutionPolicy};
use crate::value::Value;

/// Outcome of resolving one string
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// At least one placeholder in the chain was substituted
    pub succeeded: bool,
    /// The resolved value; the original string when nothing was substituted
    pub value: Value,
}

struct Outcome {
    value: Value,
    succeeded: bool,
    numeric: bool,
}

impl Outcome {
    fn unchanged(input: &str) -> Self {
        Self {
            value: Value::String(input.to_string()),
            succeeded: false,
            numeric: false,
        }
    }
}

/// Resolves the placeholders of individual strings against a root tree
///
/// Mappings and sequences substituted through one resolver share a budget of
/// `max_growth` copied values.
pub struct StringResolver<'a> {
    ctx: ResolutionContext<'a>,
    budget: Cell<usize>,
}

impl<'a> StringResolver<'a> {
    pub fn new(ctx: ResolutionContext<'a>) -> Self {
        Self {
            ctx,
            budget: Cell::new(ctx.options.max_growth),
        }
    }

    /// Resolve `input`, found at config path `at`, against the root tree
    ///
    /// Fails with `ResolutionDepthExceeded` when chained placeholders are
    /// still present after `max_depth` re-resolutions, or when a lone
    /// placeholder refers to `at` itself or to one of its parents. Fails with
    /// `GrowthLimitExceeded` once the growth budget is spent.
    pub fn resolve(&self, input: &str, at: &str) -> Result<Resolved> {
        let mut chain = vec![input.to_string()];
        let outcome = self.resolve_chain(input, at, &mut chain)?;
        Ok(Resolved {
            succeeded: outcome.succeeded,
            value: outcome.value,
        })
    }

    fn resolve_chain(&self, input: &str, at: &str, chain: &mut Vec<String>) -> Result<Outcome> {
        // A lone placeholder takes on the referenced value itself. Null is
        // kept as null regardless of policy; numbers keep their type.
        if let Some(whole) = placeholder::whole_placeholder(input) {
            if let Some(found) = path::get(self.ctx.root, whole) {
                if found.is_structural() || found.is_null() {
                    if found.is_structural() && path::is_within(at, whole) {
                        chain.push(input.to_string());
                        return Err(Error::depth_exceeded(self.ctx.options.max_depth, chain)
                            .with_path(at));
                    }
                    self.charge(found, at)?;
                    self.ctx.observer.substitution_hit(at, input, found);
                    return Ok(Outcome {
                        value: found.clone(),
                        succeeded: true,
                        numeric: false,
                    });
                }
                if found.is_number() {
                    if let Some(number) = self.lookup(whole) {
                        self.ctx.observer.substitution_hit(at, input, number);
                        return Ok(Outcome {
                            value: number.clone(),
                            succeeded: true,
                            numeric: true,
                        });
                    }
                }
            }
        }

        let mut text = String::with_capacity(input.len());
        let mut last = 0;
        let mut succeeded = false;
        let mut numeric = false;

        for found in placeholder::placeholders(input) {
            text.push_str(&input[last..found.start]);
            last = found.end;

            match self.lookup(found.path) {
                Some(value) => {
                    if value.is_structural() {
                        self.charge(value, at)?;
                    }
                    self.ctx.observer.substitution_hit(at, found.token, value);
                    succeeded = true;
                    numeric |= value.is_number();
                    text.push_str(&value.to_string());
                }
                None => {
                    self.ctx.observer.substitution_miss(at, found.token);
                    text.push_str(found.token);
                }
            }
        }
        text.push_str(&input[last..]);

        if !succeeded {
            return Ok(Outcome::unchanged(input));
        }

        if placeholder::contains_placeholder(&text) {
            if chain.len() > self.ctx.options.max_depth {
                chain.push(text);
                return Err(
                    Error::depth_exceeded(self.ctx.options.max_depth, chain).with_path(at)
                );
            }
            chain.push(text.clone());
            let inner = self.resolve_chain(&text, at, chain)?;
            numeric |= inner.numeric;
            match inner.value {
                Value::String(s) => text = s,
                other => {
                    return Ok(Outcome {
                        value: other,
                        succeeded: true,
                        numeric,
                    })
                }
            }
        }

        let value = match numeric.then(|| parse_number(&text)).flatten() {
            Some(number) => number,
            None => Value::String(text),
        };

        Ok(Outcome {
            value,
            succeeded: true,
            numeric,
        })
    }

    /// Take the size of a structural value out of the growth budget
    fn charge(&self, value: &Value, at: &str) -> Result<()> {
        let remaining = self.budget.get();
        match value.size_within(remaining) {
            Some(size) => {
                self.budget.set(remaining - size);
                Ok(())
            }
            None => {
                Err(Error::growth_exceeded(self.ctx.options.max_growth).with_path(at))
            }
        }
    }

    /// Look up a placeholder path, applying the substitution policy
    fn lookup(&self, path: &str) -> Option<&'a Value> {
        let found = path::get(self.ctx.root, path)?;
        match self.ctx.options.policy {
            SubstitutionPolicy::Presence => Some(found),
            SubstitutionPolicy::LegacyTruthy => found.is_truthy().then_some(found),
        }
    }
}

/// Parse text as a number: `i64` first, then a finite `f64`
///
/// Surrounding whitespace is ignored; empty text is not a number.
pub fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}
