//! Resolution driver
//!
//! Runs whole-tree passes until a pass replaces nothing (a fixpoint). Each
//! pass resolves against the tree as it was when the pass started, so the
//! order in which siblings are visited never matters. Chains that span
//! several values settle over successive passes; runaway chains inside a
//! single string are stopped by `max_depth`, runaway growth across passes by
//! `max_passes`. Mappings and sequences copied into the tree count against
//! `max_growth` per pass, so references that copy each other cannot blow up
//! the tree before the pass limit is reached.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::observer::{NoopObserver, ResolveObserver};
use crate::value::Value;
use crate::walker::TreeWalker;

/// Default limit on re-resolutions of a single string
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default limit on whole-tree passes
pub const DEFAULT_MAX_PASSES: usize = 10;

/// Default limit on values copied by structural substitutions in one pass
pub const DEFAULT_MAX_GROWTH: usize = 1_000_000;

/// Which looked-up values count as a substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionPolicy {
    /// Any value present at the path is substituted
    #[default]
    Presence,
    /// Present but falsy values (`""`, `0`, `false`, `null`) are treated as
    /// missing and the placeholder is left in place. A string that is exactly
    /// one placeholder still resolves to a mapping, sequence or `null`.
    LegacyTruthy,
}

/// Options controlling resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Maximum re-resolutions of one string before failing
    pub max_depth: usize,
    /// Maximum whole-tree passes before giving up on convergence
    pub max_passes: usize,
    /// Maximum values copied by structural substitutions in one pass
    pub max_growth: usize,
    /// Substitution criterion for looked-up values
    pub policy: SubstitutionPolicy,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_passes: DEFAULT_MAX_PASSES,
            max_growth: DEFAULT_MAX_GROWTH,
            policy: SubstitutionPolicy::default(),
        }
    }
}

impl ResolveOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn with_max_growth(mut self, max_growth: usize) -> Self {
        self.max_growth = max_growth;
        self
    }

    pub fn with_policy(mut self, policy: SubstitutionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Everything a pass needs besides the subtree being transformed
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Lookup source, fixed for the duration of a pass
    pub root: &'a Value,
    pub options: &'a ResolveOptions,
    pub observer: &'a dyn ResolveObserver,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(
        root: &'a Value,
        options: &'a ResolveOptions,
        observer: &'a dyn ResolveObserver,
    ) -> Self {
        Self {
            root,
            options,
            observer,
        }
    }
}

/// Best-effort result of resolving a tree
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved tree; strings that failed are kept verbatim
    pub value: Value,
    /// Problems found in the final pass, plus non-convergence if it occurred
    pub diagnostics: Vec<Error>,
    /// Number of passes run
    pub passes: usize,
    /// Whether the last pass changed nothing
    pub converged: bool,
}

impl Resolution {
    /// True when the tree converged without diagnostics
    pub fn is_clean(&self) -> bool {
        self.converged && self.diagnostics.is_empty()
    }

    /// The resolved tree, or the first diagnostic
    pub fn into_result(self) -> Result<Value> {
        match self.diagnostics.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

/// Resolves `${...}` placeholders across a whole tree
#[derive(Clone)]
pub struct Resolver {
    options: ResolveOptions,
    observer: Arc<dyn ResolveObserver>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Create a resolver with default options and no observer
    pub fn new() -> Self {
        Self::with_options(ResolveOptions::default())
    }

    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            options,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Report resolution events to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn ResolveObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve a tree, failing on the first unresolvable chain or on
    /// non-convergence
    pub fn resolve(&self, tree: Value) -> Result<Value> {
        self.resolve_with_report(tree).into_result()
    }

    /// Resolve a tree, keeping failed strings verbatim and reporting why
    pub fn resolve_with_report(&self, tree: Value) -> Resolution {
        let observer = self.observer.as_ref();
        let mut current = tree;
        let mut diagnostics = Vec::new();
        let mut passes = 0;
        let mut converged = false;

        while passes < self.options.max_passes {
            passes += 1;
            observer.pass_started(passes);

            let ctx = ResolutionContext::new(&current, &self.options, observer);
            let mut walker = TreeWalker::new(ctx);
            let next = walker.walk(&current);
            let replacements = walker.replacements();
            let halted = walker.is_halted();
            diagnostics = walker.into_diagnostics();

            observer.pass_finished(passes, replacements);

            // Keep the last complete tree when a pass outgrew its budget
            if halted {
                return Resolution {
                    value: current,
                    diagnostics,
                    passes,
                    converged: false,
                };
            }
            current = next;

            if replacements == 0 {
                converged = true;
                break;
            }
        }

        if !converged {
            let err = Error::not_converged(passes);
            observer.diagnostic(&err);
            diagnostics.push(err);
        }

        Resolution {
            value: current,
            diagnostics,
            passes,
            converged,
        }
    }
}
