//! Error types for yamlconf
//!
//! Errors are structured: a kind plus optional config path, source
//! location, underlying cause and an actionable help message.

use std::fmt;

/// Result type alias for yamlconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for yamlconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Path in the config where the error occurred (e.g., "database.port")
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Malformed YAML/JSON input
    #[error("Parse error")]
    Parse,
    /// I/O error while reading a config path
    #[error("I/O error")]
    Io,
    /// Lookup of a path that doesn't exist
    #[error("Path not found")]
    PathNotFound,
    /// A chained placeholder did not settle within the depth limit
    #[error("Resolution depth exceeded (limit {limit})")]
    ResolutionDepthExceeded { limit: usize },
    /// Whole-tree passes kept changing the tree up to the pass limit
    #[error("Resolution did not converge after {passes} passes")]
    NotConverged { passes: usize },
    /// A single pass copied more values than the growth limit allows
    #[error("Resolution growth limit exceeded (limit {limit} values per pass)")]
    GrowthLimitExceeded { limit: usize },
    /// Failure writing the tree out as YAML/JSON
    #[error("Serialization error")]
    Serialize,
}

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source_location: None,
            help: None,
            cause: None,
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Parse)
        }
    }

    /// Create an I/O error for a file or directory
    pub fn io(file: impl Into<String>, message: impl Into<String>) -> Self {
        let file = file.into();
        Self {
            source_location: Some(SourceLocation {
                file: file.clone(),
                line: None,
                column: None,
            }),
            help: Some(format!("Check that '{}' is readable", file)),
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Io)
        }
    }

    /// Create a path not found error
    pub fn path_not_found(path: impl Into<String>) -> Self {
        let path_str = path.into();
        Self {
            help: Some(format!(
                "Check that '{}' exists in the configuration",
                path_str
            )),
            path: Some(path_str),
            ..Self::from_kind(ErrorKind::PathNotFound)
        }
    }

    /// Create a depth exceeded error from the chain of intermediate strings
    pub fn depth_exceeded(limit: usize, chain: &[String]) -> Self {
        Self {
            help: Some(
                "Break the reference cycle or raise the depth limit (max_depth)".into(),
            ),
            cause: Some(format!("Chain: {}", chain.join(" → "))),
            ..Self::from_kind(ErrorKind::ResolutionDepthExceeded { limit })
        }
    }

    /// Create a non-convergence error
    pub fn not_converged(passes: usize) -> Self {
        Self {
            help: Some(
                "A placeholder probably references a value that contains itself".into(),
            ),
            ..Self::from_kind(ErrorKind::NotConverged { passes })
        }
    }

    /// Create a growth limit error
    pub fn growth_exceeded(limit: usize) -> Self {
        Self {
            help: Some(
                "Placeholders referencing each other's mappings or sequences keep \
                 copying themselves; break the cycle or raise max_growth"
                    .into(),
            ),
            ..Self::from_kind(ErrorKind::GrowthLimitExceeded { limit })
        }
    }

    /// Create a serialization error
    pub fn serialize(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Serialize)
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Whether a placeholder chain was cut off at the depth limit
    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self.kind, ErrorKind::ResolutionDepthExceeded { .. })
    }

    /// Whether resolution was stopped by any of its limits
    pub fn is_runaway(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ResolutionDepthExceeded { .. }
                | ErrorKind::NotConverged { .. }
                | ErrorKind::GrowthLimitExceeded { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{}", line)?;
                if let Some(column) = loc.column {
                    write!(f, ":{}", column)?;
                }
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
