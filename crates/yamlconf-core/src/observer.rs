//! Resolution observers
//!
//! The resolution engine performs no I/O of its own. Interesting events are
//! reported to a [`ResolveObserver`]; [`NoopObserver`] ignores them and
//! [`LogObserver`] forwards them to the `log` facade.

use crate::error::Error;
use crate::value::Value;

/// Receives events from the resolver
///
/// Every method has an empty default body, so implementors only override the
/// events they care about. `path` is the dotted location of the string being
/// resolved (empty for the root).
pub trait ResolveObserver: Send + Sync {
    /// A whole-tree pass is starting (passes count from 1)
    fn pass_started(&self, _pass: usize) {}

    /// A whole-tree pass finished after replacing `replacements` values
    fn pass_finished(&self, _pass: usize, _replacements: usize) {}

    /// A placeholder was found and substituted
    fn substitution_hit(&self, _path: &str, _token: &str, _value: &Value) {}

    /// A placeholder was left untouched because its path is not present
    fn substitution_miss(&self, _path: &str, _token: &str) {}

    /// A string could not be resolved and was kept as is
    fn diagnostic(&self, _error: &Error) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ResolveObserver for NoopObserver {}

/// Observer that reports events through the `log` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ResolveObserver for LogObserver {
    fn pass_started(&self, pass: usize) {
        log::debug!("Resolution pass {} started", pass);
    }

    fn pass_finished(&self, pass: usize, replacements: usize) {
        log::debug!(
            "Resolution pass {} finished with {} replacement(s)",
            pass,
            replacements
        );
    }

    fn substitution_hit(&self, path: &str, token: &str, value: &Value) {
        log::trace!("{}: {} -> {} ({})", path, token, value, value.type_name());
    }

    fn substitution_miss(&self, path: &str, token: &str) {
        log::trace!("{}: {} not found, left as is", path, token);
    }

    fn diagnostic(&self, error: &Error) {
        log::warn!("{}", error);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Observer that records events as strings, for assertions
    #[derive(Default)]
    pub struct RecordingObserver {
        pub events: Mutex<Vec<String>>,
    }

    impl RecordingObserver {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl ResolveObserver for RecordingObserver {
        fn pass_started(&self, pass: usize) {
            self.push(format!("start {}", pass));
        }

        fn pass_finished(&self, pass: usize, replacements: usize) {
            self.push(format!("finish {} {}", pass, replacements));
        }

        fn substitution_hit(&self, path: &str, token: &str, value: &Value) {
            self.push(format!("hit {} {} {}", path, token, value));
        }

        fn substitution_miss(&self, path: &str, token: &str) {
            self.push(format!("miss {} {}", path, token));
        }

        fn diagnostic(&self, error: &Error) {
            self.push(format!("diagnostic {}", error.kind));
        }
    }
}
