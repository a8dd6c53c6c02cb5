//! Error types for configuration, filtering, and exposition parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Startup-time configuration failures. These are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to create new configuration file {path}: {source}")]
    WriteDefault {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unable to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A filter pattern that does not compile as a regular expression.
#[derive(Debug, Clone, Error)]
#[error("invalid filter pattern {pattern:?}: {source}")]
pub struct FilterError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Why a tracked value line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarningKind {
    #[error("metric line has no value")]
    MissingValue,

    #[error("label list is not terminated")]
    UnterminatedLabels,

    #[error("label {0:?} has no '='")]
    MalformedLabel(String),
}

/// One malformed tracked-metric line. Non-fatal: the line is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: {kind}: {line}")]
pub struct ParseWarning {
    /// 1-based line number within the scrape.
    pub line_number: usize,
    pub line: String,
    pub kind: ParseWarningKind,
}
