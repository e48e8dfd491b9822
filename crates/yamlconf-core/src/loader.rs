//! Loading and merging YAML files
//!
//! A load path is either a single file or a directory. Directories are read
//! one level deep; only `.yml` and `.yaml` files are used and they are merged
//! in file-name order. A path that does not exist contributes an empty tree.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result, SourceLocation};
use crate::value::{ArrayMerge, Value};

/// Options for loading and merging configuration files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// How sequences from later files combine with earlier ones
    pub array_merge: ArrayMerge,
    /// Top-level mappings merged over the root after loading, in order
    pub overlays: Vec<String>,
}

impl LoadOptions {
    pub fn with_array_merge(mut self, array_merge: ArrayMerge) -> Self {
        self.array_merge = array_merge;
        self
    }

    pub fn with_overlay(mut self, name: impl Into<String>) -> Self {
        self.overlays.push(name.into());
        self
    }
}

/// A merged tree and the files it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub value: Value,
    /// Files merged into `value`, in merge order
    pub files: Vec<PathBuf>,
}

/// Check whether a file has a YAML extension
pub fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// Load a single file or a directory of YAML files
pub fn load_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Loaded> {
    load_paths(&[path], options)
}

/// Load several files or directories, merged in argument order
pub fn load_paths<P: AsRef<Path>>(paths: &[P], options: &LoadOptions) -> Result<Loaded> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(discover(path.as_ref())?);
    }

    let mut value = Value::empty_mapping();
    for file in &files {
        log::debug!("Merging config: {}", file.display());
        value.merge_with(parse_file(file)?, options.array_merge);
    }

    apply_overlays(&mut value, &options.overlays, options.array_merge);

    Ok(Loaded { value, files })
}

/// Parse one YAML document; an empty document is an empty mapping
pub fn parse_yaml(content: &str, file: &str) -> Result<Value> {
    if content.trim().is_empty() {
        return Ok(Value::empty_mapping());
    }
    match serde_yaml::from_str::<Value>(content) {
        Ok(Value::Null) => Ok(Value::empty_mapping()),
        Ok(value) => Ok(value),
        Err(e) => {
            let location = e.location();
            Err(Error::parse(e.to_string()).with_source_location(SourceLocation {
                file: file.to_string(),
                line: location.as_ref().map(|l| l.line()),
                column: location.as_ref().map(|l| l.column()),
            }))
        }
    }
}

/// Merge each named top-level mapping over the root
pub fn apply_overlays(value: &mut Value, overlays: &[String], arrays: ArrayMerge) {
    for name in overlays {
        let overlay = match value.as_mapping().and_then(|m| m.get(name)) {
            Some(overlay @ Value::Mapping(_)) => overlay.clone(),
            Some(other) => {
                log::warn!(
                    "Overlay '{}' is a {}, not a mapping; ignored",
                    name,
                    other.type_name()
                );
                continue;
            }
            None => {
                log::debug!("Overlay '{}' not present; ignored", name);
                continue;
            }
        };
        log::debug!("Applying overlay '{}'", name);
        value.merge_with(overlay, arrays);
    }
}

/// Expand a load path into the YAML files it names
fn discover(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        log::warn!(
            "{} is not a path to an existing file or directory",
            path.display()
        );
        return Ok(Vec::new());
    }

    if !path.is_dir() {
        if is_yaml_file(path) {
            return Ok(vec![path.to_path_buf()]);
        }
        log::debug!("{} has a non-YAML extension and is ignored", path.display());
        return Ok(Vec::new());
    }

    log::debug!("Loading config directory {}", path.display());
    let entries =
        std::fs::read_dir(path).map_err(|e| Error::io(path.display().to_string(), e.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(path.display().to_string(), e.to_string()))?;
        let file = entry.path();
        if file.is_dir() {
            continue;
        }
        if is_yaml_file(&file) {
            files.push(file);
        } else {
            log::debug!("{} has a non-YAML extension and is ignored", file.display());
        }
    }
    files.sort();

    Ok(files)
}

fn parse_file(file: &Path) -> Result<Value> {
    log::debug!("Reading {}", file.display());
    let content = std::fs::read_to_string(file)
        .map_err(|e| Error::io(file.display().to_string(), e.to_string()))?;
    parse_yaml(&content, &file.display().to_string())
}
