//! Error types for snakeutils.

use std::{collections::BTreeSet, fmt, path::PathBuf, string::FromUtf8Error};
use thiserror::Error;

/// The wrapper for the error kind, with an optional hint.
#[derive(Debug)]
pub struct SnakeError {
    kind: SnakeErrorKind,
    hint: Option<String>,
}

/// All types of errors than can occur in snakeutils.
#[derive(Error, Debug)]
pub enum SnakeErrorKind {
    #[error("Unexpected samplesheet section: '{header}'")]
    UnrecognizedSection { header: String },

    #[error("Duplicate sample names in samplesheet: {}", join(names))]
    DuplicateSamples { names: BTreeSet<String> },

    #[error("Invalid sample names (allowed characters: A-Z a-z 0-9 _ -): {}", join(names))]
    InvalidSampleName { names: BTreeSet<String> },

    #[error("No sample within samplesheet: {path}")]
    NoSamples { path: PathBuf },

    #[error("Malformed benchmark file {path}: {reason}")]
    MalformedBenchmark { path: PathBuf, reason: String },

    #[error("No directory named 'benchmarks' in {path}")]
    NoBenchmarksRoot { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Some characters in {path} could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("Line {line} of {path} appears before any [Section] header")]
    RowOutsideSection { path: PathBuf, line: usize },

    #[error("Malformed row {line} in section [{section}]: {reason}")]
    MalformedRow {
        section: String,
        line: usize,
        reason: String,
    },

    #[error("Missing column '{column}' in [Data] section")]
    MissingColumn { column: String },

    #[error("Couldn't parse value '{value}' of column '{column}' in {path}")]
    InvalidMetricValue {
        path: PathBuf,
        column: String,
        value: String,
    },

    #[error("{path} is not located under {root}")]
    NotUnderRoot { path: PathBuf, root: PathBuf },

    #[error("Cannot infer a rule name for {path}: it is the benchmarks root itself")]
    EmptyRelativePath { path: PathBuf },

    #[error("Benchmark directory does not exist: {path}")]
    BenchmarkDirectoryNotFound { path: PathBuf },

    #[error("No benchmark files found in {path}")]
    NoBenchmarkRecords { path: PathBuf },

    #[error("Unknown column '{column}'. Available columns: {}", available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("The {writer} writer cannot write this kind of data")]
    UnsupportedWriteData { writer: &'static str },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] Box<figment::Error>),

    #[error("Template render error: {0}")]
    TemplateRenderError(#[from] handlebars::RenderError),

    #[error("Template error: {0}")]
    TemplateError(#[from] handlebars::TemplateError),

    #[error("Progress bar template error: {0}")]
    ProgressBarError(#[from] indicatif::style::TemplateError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Directory walk error: {0}")]
    WalkDirError(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON Serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

fn join(names: &BTreeSet<String>) -> String {
    names
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SnakeError {
    /// Attaches a hint to the error
    pub fn with_hint(mut self, hint: Option<impl Into<String>>) -> Self {
        if let Some(hint) = hint {
            self.hint = Some(hint.into());
        }
        self
    }

    pub fn kind(&self) -> &SnakeErrorKind {
        &self.kind
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

impl fmt::Display for SnakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint_text) = &self.hint {
            write!(f, " ({hint_text})")?;
        }

        Ok(())
    }
}

impl std::error::Error for SnakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Convert Error into SnakeErrorKind
impl<E> From<E> for SnakeError
where
    SnakeErrorKind: From<E>,
{
    fn from(error: E) -> Self {
        SnakeError {
            kind: SnakeErrorKind::from(error),
            hint: None,
        }
    }
}

impl From<figment::Error> for SnakeErrorKind {
    fn from(error: figment::Error) -> Self {
        SnakeErrorKind::ConfigError(Box::new(error))
    }
}

/// A convenient result type for snakeutils
pub type Result<T> = std::result::Result<T, SnakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_is_appended_to_message() {
        let err = SnakeError::from(SnakeErrorKind::NoBenchmarksRoot {
            path: PathBuf::from("/data/out.tsv"),
        })
        .with_hint(Some("pass the benchmarks directory explicitly"));

        assert_eq!(
            err.to_string(),
            "No directory named 'benchmarks' in /data/out.tsv (pass the benchmarks directory explicitly)"
        );
    }

    #[test]
    fn offender_sets_are_listed_in_full() {
        let names: BTreeSet<String> = ["b.1", "a 2"].iter().map(|s| s.to_string()).collect();
        let err = SnakeError::from(SnakeErrorKind::InvalidSampleName { names });

        assert!(err.to_string().ends_with("a 2, b.1"));
        assert!(err.hint().is_none());
    }
}
