//! yamlconf-core: layered YAML configuration with `${path}` placeholders
//!
//! This crate loads and deep-merges YAML files, applies named overlays and
//! resolves `${dotted.path}` placeholders against the merged tree until it
//! reaches a fixpoint.
//!
//! # Example
//!
//! ```rust
//! use yamlconf_core::Config;
//!
//! let yaml = r#"
//! database:
//!   host: localhost
//!   port: 5432
//!   url: postgres://${database.host}:${database.port}/app
//! "#;
//!
//! let config = Config::from_yaml(yaml).unwrap();
//! assert_eq!(
//!     config.get("database.url").unwrap().as_str(),
//!     Some("postgres://localhost:5432/app")
//! );
//! ```

pub mod error;
pub mod loader;
pub mod observer;
pub mod path;
pub mod placeholder;
pub mod resolver;
pub mod substitute;
pub mod value;
pub mod walker;

mod config;

pub use config::{Config, ConfigOptions};
pub use error::{Error, ErrorKind, Result, SourceLocation};
pub use loader::{LoadOptions, Loaded};
pub use observer::{LogObserver, NoopObserver, ResolveObserver};
pub use resolver::{
    Resolution, ResolutionContext, ResolveOptions, Resolver, SubstitutionPolicy,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_GROWTH, DEFAULT_MAX_PASSES,
};
pub use substitute::{Resolved, StringResolver};
pub use value::{ArrayMerge, Value};
pub use walker::{unresolved_placeholders, TreeWalker, Unresolved};
