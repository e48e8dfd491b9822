//! Main Config type for yamlconf
//!
//! The Config type loads and merges configuration files, resolves every
//! placeholder eagerly and keeps both the raw and the resolved tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::loader::{self, LoadOptions};
use crate::observer::LogObserver;
use crate::resolver::{ResolveOptions, Resolver};
use crate::value::Value;
use crate::walker::{self, Unresolved};

/// Configuration options for loading and resolving configs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOptions {
    /// File merging and overlay selection
    pub load: LoadOptions,
    /// Placeholder resolution limits and policy
    pub resolve: ResolveOptions,
}

impl ConfigOptions {
    pub fn with_load(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    pub fn with_resolve(mut self, resolve: ResolveOptions) -> Self {
        self.resolve = resolve;
        self
    }
}

/// The main configuration container
///
/// Resolution is best-effort: strings whose placeholders could not be
/// resolved are kept verbatim and the reasons are available from
/// [`Config::diagnostics`]. Use [`Config::ensure_resolved`] to turn them
/// into an error.
#[derive(Debug, Clone)]
pub struct Config {
    /// The merged (unresolved) configuration data
    raw: Arc<Value>,
    /// The resolved configuration data
    resolved: Arc<Value>,
    /// Problems reported by the resolver
    diagnostics: Vec<Error>,
    converged: bool,
    passes: usize,
    /// Files merged into the raw tree, in merge order
    files: Vec<PathBuf>,
    options: ConfigOptions,
}

impl Config {
    /// Create a Config from an already merged Value
    pub fn from_value(value: Value) -> Self {
        Self::from_value_with_options(value, ConfigOptions::default())
    }

    /// Create a Config from a Value with custom options
    ///
    /// `value` is taken as already merged; overlays are not applied.
    pub fn from_value_with_options(value: Value, options: ConfigOptions) -> Self {
        Self::resolve_into(value, Vec::new(), options)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_yaml_with_options(yaml, ConfigOptions::default())
    }

    /// Load configuration from a YAML string with options
    pub fn from_yaml_with_options(yaml: &str, options: ConfigOptions) -> Result<Self> {
        let mut value = loader::parse_yaml(yaml, "<string>")?;
        loader::apply_overlays(&mut value, &options.load.overlays, options.load.array_merge);
        Ok(Self::resolve_into(value, Vec::new(), options))
    }

    /// Load configuration from a YAML file or a directory of YAML files
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_options(path, ConfigOptions::default())
    }

    /// Load configuration from a file or directory with options
    pub fn load_with_options(path: impl AsRef<Path>, options: ConfigOptions) -> Result<Self> {
        Self::load_merged_with_options(&[path], options)
    }

    /// Load and merge several files or directories
    ///
    /// Paths are merged in order, with later paths overriding earlier ones.
    /// Files inside a directory are merged in file-name order.
    pub fn load_merged<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        Self::load_merged_with_options(paths, ConfigOptions::default())
    }

    /// Load and merge several files or directories with options
    pub fn load_merged_with_options<P: AsRef<Path>>(
        paths: &[P],
        options: ConfigOptions,
    ) -> Result<Self> {
        let loaded = loader::load_paths(paths, &options.load)?;
        Ok(Self::resolve_into(loaded.value, loaded.files, options))
    }

    fn resolve_into(value: Value, files: Vec<PathBuf>, options: ConfigOptions) -> Self {
        let resolver =
            Resolver::with_options(options.resolve.clone()).with_observer(Arc::new(LogObserver));
        let raw = Arc::new(value);
        let resolution = resolver.resolve_with_report((*raw).clone());

        log::debug!(
            "Resolved config in {} pass(es), {} diagnostic(s)",
            resolution.passes,
            resolution.diagnostics.len()
        );

        Self {
            raw,
            resolved: Arc::new(resolution.value),
            diagnostics: resolution.diagnostics,
            converged: resolution.converged,
            passes: resolution.passes,
            files,
            options,
        }
    }

    /// Get a resolved value at a path
    pub fn get(&self, path: &str) -> Result<&Value> {
        self.resolved.get_path(path)
    }

    /// Get the raw (unresolved) value at a path
    pub fn get_raw(&self, path: &str) -> Result<&Value> {
        self.raw.get_path(path)
    }

    /// The whole resolved tree
    pub fn value(&self) -> &Value {
        &self.resolved
    }

    /// The whole merged tree before resolution
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Files merged into this config, in merge order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// Problems found while resolving
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// Whether resolution reached a fixpoint
    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Number of whole-tree passes resolution took
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Fail with the first diagnostic, if any
    pub fn ensure_resolved(&self) -> Result<()> {
        match self.diagnostics.first() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Placeholders still present in the resolved tree
    pub fn unresolved(&self) -> Vec<Unresolved> {
        walker::unresolved_placeholders(&self.resolved)
    }

    /// Export the configuration as YAML
    ///
    /// # Arguments
    /// * `resolve` - If true, export the resolved tree. If false, show placeholders.
    pub fn to_yaml(&self, resolve: bool) -> Result<String> {
        serde_yaml::to_string(self.tree(resolve)).map_err(|e| Error::serialize(e.to_string()))
    }

    /// Export the configuration as pretty-printed JSON
    ///
    /// # Arguments
    /// * `resolve` - If true, export the resolved tree. If false, show placeholders.
    pub fn to_json(&self, resolve: bool) -> Result<String> {
        serde_json::to_string_pretty(self.tree(resolve))
            .map_err(|e| Error::serialize(e.to_string()))
    }

    /// Consume the config, returning the resolved tree
    pub fn into_value(self) -> Value {
        Arc::unwrap_or_clone(self.resolved)
    }

    fn tree(&self, resolve: bool) -> &Value {
        if resolve {
            &self.resolved
        } else {
            &self.raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::resolver::SubstitutionPolicy;
    use crate::value::ArrayMerge;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_yaml() {
        let yaml = r#"
database:
  host: localhost
  port: 5432
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(
            config.get("database.host").unwrap().as_str(),
            Some("localhost")
        );
        assert_eq!(config.get("database.port").unwrap().as_i64(), Some(5432));
        assert!(config.is_converged());
        assert!(config.ensure_resolved().is_ok());
    }

    #[test]
    fn test_self_reference() {
        let yaml = r#"
defaults:
  host: localhost
database:
  host: ${defaults.host}
  url: postgres://${database.host}:${database.port}/app
  port: 5432
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(
            config.get("database.host").unwrap().as_str(),
            Some("localhost")
        );
        assert_eq!(
            config.get("database.url").unwrap().as_str(),
            Some("postgres://localhost:5432/app")
        );
        assert_eq!(
            config.get_raw("database.host").unwrap().as_str(),
            Some("${defaults.host}")
        );
    }

    #[test]
    fn test_whole_value_references() {
        let yaml = r#"
common:
  timeout: 30
  retries: 3
extra_hosts: [b.internal, c.internal]
service:
  settings: ${common}
  hosts:
    - a.internal
    - ${extra_hosts}
  timeout: ${common.timeout}
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(
            config.get("service.settings").unwrap(),
            config.get("common").unwrap()
        );
        let hosts: Vec<_> = config
            .get("service.hosts")
            .unwrap()
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(hosts, vec!["a.internal", "b.internal", "c.internal"]);
        assert_eq!(config.get("service.timeout").unwrap().as_i64(), Some(30));
    }

    #[test]
    fn test_path_not_found() {
        let config = Config::from_yaml("a: 1").unwrap();
        let err = config.get("b.c").unwrap_err();

        assert_eq!(err.kind, ErrorKind::PathNotFound);
    }

    #[test]
    fn test_unresolved_placeholders_listed() {
        let config = Config::from_yaml("a: ${missing}\nb: [ok, 'x-${gone}']").unwrap();

        let unresolved = config.unresolved();
        assert_eq!(unresolved.len(), 2);
        assert_eq!(unresolved[0].path, "a");
        assert_eq!(unresolved[1].path, "b.1");
        assert_eq!(unresolved[1].token, "${gone}");
        assert!(config.ensure_resolved().is_ok());
    }

    #[test]
    fn test_cycle_is_a_diagnostic() {
        let config = Config::from_yaml("a: ${b}\nb: ${a}\nc: fine").unwrap();

        assert_eq!(config.diagnostics().len(), 2);
        assert_eq!(config.get("c").unwrap().as_str(), Some("fine"));
        assert_eq!(config.get("a").unwrap().as_str(), Some("${b}"));
        let err = config.ensure_resolved().unwrap_err();
        assert!(err.is_depth_exceeded());
    }

    #[test]
    fn test_reference_to_parent_is_reported() {
        let config = Config::from_yaml("a:\n  x: ${a}\n  y: ${a}\nb: 1\n").unwrap();

        assert!(config.is_converged());
        assert_eq!(config.diagnostics().len(), 2);
        assert!(config.ensure_resolved().unwrap_err().is_depth_exceeded());
        assert_eq!(config.get("a.x").unwrap().as_str(), Some("${a}"));
    }

    #[test]
    fn test_float_reference_in_json() {
        let config = Config::from_yaml("ratio: 2.0\nscale: ${ratio}").unwrap();
        let json: serde_json::Value = serde_json::from_str(&config.to_json(true).unwrap()).unwrap();

        assert_eq!(json["scale"], serde_json::json!(2.0));
        assert_eq!(config.get("scale").unwrap(), &Value::Float(2.0));
    }

    #[test]
    fn test_legacy_policy_option() {
        let options = ConfigOptions::default().with_resolve(
            ResolveOptions::default().with_policy(SubstitutionPolicy::LegacyTruthy),
        );
        let config = Config::from_yaml_with_options("zero: 0\ns: ${zero}", options).unwrap();

        assert_eq!(config.get("s").unwrap().as_str(), Some("${zero}"));
    }

    #[test]
    fn test_overlays_from_yaml() {
        let yaml = r#"
url: http://${host}:${port}
host: localhost
port: 8080
production:
  host: example.com
  port: 443
"#;
        let options =
            ConfigOptions::default().with_load(LoadOptions::default().with_overlay("production"));
        let config = Config::from_yaml_with_options(yaml, options).unwrap();

        assert_eq!(
            config.get("url").unwrap().as_str(),
            Some("http://example.com:443")
        );
    }

    #[test]
    fn test_to_yaml_resolved_and_raw() {
        let config = Config::from_yaml("a: x\nb: ${a}\nn: 1\nm: ${n}").unwrap();

        let resolved: Value = serde_yaml::from_str(&config.to_yaml(true).unwrap()).unwrap();
        let raw: Value = serde_yaml::from_str(&config.to_yaml(false).unwrap()).unwrap();

        assert_eq!(resolved, serde_yaml::from_str::<Value>("a: x\nb: x\nn: 1\nm: 1").unwrap());
        assert_eq!(raw.get_path("b").unwrap().as_str(), Some("${a}"));
        assert_eq!(raw.get_path("m").unwrap().as_str(), Some("${n}"));
    }

    #[test]
    fn test_to_json() {
        let config = Config::from_yaml("list: [1, two]\nref: ${list}").unwrap();
        let json: serde_json::Value = serde_json::from_str(&config.to_json(true).unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"list": [1, "two"], "ref": [1, "two"]})
        );
    }

    #[test]
    fn test_from_yaml_invalid() {
        let err = Config::from_yaml("a: [1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.yaml"),
            "app:\n  name: demo\n  hosts: [a]\ngreeting: hello ${app.name}\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("override.yml"), "app:\n  name: prod\n  hosts: [b]\n")
            .unwrap();
        std::fs::write(dir.path().join("ignored.json"), "{\"app\": 1}").unwrap();

        let config = Config::load(dir.path()).unwrap();

        assert_eq!(config.files().len(), 2);
        assert_eq!(
            config.get("greeting").unwrap().as_str(),
            Some("hello prod")
        );
        assert_eq!(
            config.get("app.hosts").unwrap(),
            &Value::from(vec!["a", "b"])
        );

        let options = ConfigOptions::default()
            .with_load(LoadOptions::default().with_array_merge(ArrayMerge::Replace));
        let config = Config::load_with_options(dir.path(), options).unwrap();
        assert_eq!(config.get("app.hosts").unwrap(), &Value::from(vec!["b"]));
    }

    #[test]
    fn test_load_missing_path_is_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("does-not-exist")).unwrap();

        assert_eq!(config.value(), &Value::empty_mapping());
        assert!(config.files().is_empty());
    }

    #[test]
    fn test_load_merged_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.yaml");
        let local = dir.path().join("local.yaml");
        std::fs::write(&base, "port: 80\nurl: http://localhost:${port}\n").unwrap();
        std::fs::write(&local, "port: 8080\n").unwrap();

        let config = Config::load_merged(&[&base, &local]).unwrap();

        assert_eq!(
            config.get("url").unwrap().as_str(),
            Some("http://localhost:8080")
        );
        assert_eq!(config.files(), &[base, local]);
    }

    #[test]
    fn test_from_value() {
        let mut map = indexmap::IndexMap::new();
        map.insert("name".to_string(), Value::from("svc"));
        map.insert("greeting".to_string(), Value::from("hi ${name}"));
        let config = Config::from_value(Value::from(map));

        assert_eq!(config.get("greeting").unwrap().as_str(), Some("hi svc"));
        assert_eq!(config.passes(), 2);
    }

    #[test]
    fn test_into_value() {
        let config = Config::from_yaml("a: 1\nb: ${a}").unwrap();
        let clone = config.clone();

        assert_eq!(config.into_value(), clone.value().clone());
    }
}
