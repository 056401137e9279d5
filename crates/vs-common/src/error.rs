//! Error types for votescope.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Not Enough Elapsed Time
//!   Reason: total elapsed time must be positive, got 0
//!   Fix: Move --reference-date after the release dates in the dataset.
//! ```
//!
//! # Machine-Facing Output
//!
//! ```json
//! {
//!   "code": 31,
//!   "category": "domain",
//!   "message": "total elapsed time must be positive, got 0",
//!   "recoverable": true,
//!   "context": { "total_elapsed": 0.0 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for votescope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file and parameter errors.
    Config,
    /// Dataset open and query errors.
    Dataset,
    /// The data cannot define the requested distribution.
    Domain,
    /// Figure drawing and image output errors.
    Render,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Dataset => write!(f, "dataset"),
            ErrorCategory::Domain => write!(f, "domain"),
            ErrorCategory::Render => write!(f, "render"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for votescope.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid reference date '{value}': expected YYYY-MM-DD")]
    InvalidReferenceDate { value: String },

    #[error("invalid table name '{name}': expected a plain SQL identifier")]
    InvalidTable { name: String },

    // Dataset errors (20-29)
    #[error("failed to open dataset {path}: {reason}")]
    DatasetOpen { path: String, reason: String },

    #[error("dataset query failed: {0}")]
    Query(String),

    #[error("dataset not found: {path}")]
    DatasetNotFound { path: String },

    // Domain errors (30-39)
    #[error("no observations to model: {0}")]
    EmptyResult(String),

    #[error("total elapsed time must be positive, got {total}")]
    NonPositiveElapsed { total: f64 },

    #[error("column {column} needs at least {needed} values, got {got}")]
    InsufficientData {
        column: String,
        needed: usize,
        got: usize,
    },

    #[error("invalid distribution parameters: {0}")]
    InvalidParameters(String),

    // Render errors (40-49)
    #[error("rendering failed: {0}")]
    Render(String),

    #[error("cannot write output {path}: {reason}")]
    OutputPath { path: String, reason: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Dataset errors
    /// - 30-39: Domain errors
    /// - 40-49: Render errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidReferenceDate { .. } => 11,
            Error::InvalidTable { .. } => 12,
            Error::DatasetOpen { .. } => 20,
            Error::Query(_) => 21,
            Error::DatasetNotFound { .. } => 22,
            Error::EmptyResult(_) => 30,
            Error::NonPositiveElapsed { .. } => 31,
            Error::InsufficientData { .. } => 32,
            Error::InvalidParameters(_) => 33,
            Error::Render(_) => 40,
            Error::OutputPath { .. } => 41,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidReferenceDate { .. } | Error::InvalidTable { .. } => {
                ErrorCategory::Config
            }

            Error::DatasetOpen { .. } | Error::Query(_) | Error::DatasetNotFound { .. } => {
                ErrorCategory::Dataset
            }

            Error::EmptyResult(_)
            | Error::NonPositiveElapsed { .. }
            | Error::InsufficientData { .. }
            | Error::InvalidParameters(_) => ErrorCategory::Domain,

            Error::Render(_) | Error::OutputPath { .. } => ErrorCategory::Render,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the user can fix this by changing inputs.
    ///
    /// Nothing is retried automatically; this only drives the exit code and
    /// the `recoverable` flag in structured output.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidReferenceDate { .. } | Error::InvalidTable { .. } => {
                true
            }
            Error::DatasetOpen { .. } | Error::DatasetNotFound { .. } => true,
            Error::Query(_) => false,
            Error::EmptyResult(_)
            | Error::NonPositiveElapsed { .. }
            | Error::InsufficientData { .. }
            | Error::InvalidParameters(_) => true,
            Error::Render(_) => false,
            Error::OutputPath { .. } => true,
            Error::Io(_) => true,
            Error::Json(_) => false,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'votescope config validate' to check the configuration file."
            }
            Error::InvalidReferenceDate { .. } => {
                "Pass --reference-date as YYYY-MM-DD, e.g. --reference-date 2025-03-20."
            }
            Error::InvalidTable { .. } => {
                "Set dataset.table to a name made of letters, digits and underscores."
            }

            Error::DatasetOpen { .. } => {
                "Check that --db points to a readable SQLite file."
            }
            Error::Query(_) => {
                "Check that the table has vote_count, vote_average and release_date columns."
            }
            Error::DatasetNotFound { .. } => {
                "Pass --db or set VOTESCOPE_DB to the path of the movies database."
            }

            Error::EmptyResult(_) => {
                "No row survived filtering. Check the reference date and that release dates are YYYY-MM-DD."
            }
            Error::NonPositiveElapsed { .. } => {
                "Move --reference-date after the release dates in the dataset."
            }
            Error::InsufficientData { .. } => {
                "The dataset has too few non-null values for this statistic."
            }
            Error::InvalidParameters(_) => {
                "Check that vote_average is on a 0-10 scale and vote_count is non-negative."
            }

            Error::Render(_) => {
                "Try --image svg. If the problem persists, report it with the command line used."
            }
            Error::OutputPath { .. } => {
                "Check that --output-dir is writable, or choose another directory."
            }

            Error::Io(_) => "Check disk space and permissions, then rerun the command.",
            Error::Json(_) => "Report this as a bug together with the command line used.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidReferenceDate { .. } => "Invalid Reference Date",
            Error::InvalidTable { .. } => "Invalid Table Name",

            Error::DatasetOpen { .. } => "Dataset Unavailable",
            Error::Query(_) => "Query Failed",
            Error::DatasetNotFound { .. } => "Dataset Not Found",

            Error::EmptyResult(_) => "Nothing To Model",
            Error::NonPositiveElapsed { .. } => "Not Enough Elapsed Time",
            Error::InsufficientData { .. } => "Insufficient Data",
            Error::InvalidParameters(_) => "Invalid Distribution Parameters",

            Error::Render(_) => "Render Error",
            Error::OutputPath { .. } => "Output Not Writable",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the user can fix the error by changing inputs.
    pub recoverable: bool,

    /// Additional structured context (e.g., path, column).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidReferenceDate { value } => {
                context.insert("reference_date".to_string(), serde_json::json!(value));
            }
            Error::InvalidTable { name } => {
                context.insert("table".to_string(), serde_json::json!(name));
            }
            Error::DatasetOpen { path, .. } | Error::DatasetNotFound { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::NonPositiveElapsed { total } => {
                context.insert("total_elapsed".to_string(), serde_json::json!(total));
            }
            Error::InsufficientData { column, needed, got } => {
                context.insert("column".to_string(), serde_json::json!(column));
                context.insert("needed".to_string(), serde_json::json!(needed));
                context.insert("got".to_string(), serde_json::json!(got));
            }
            Error::OutputPath { path, .. } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(Error::NonPositiveElapsed { total: 0.0 }.code(), 31);
        assert_eq!(Error::Render("x".into()).code(), 40);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(Error::Config("test".into()).category(), ErrorCategory::Config);
        assert_eq!(Error::Query("q".into()).category(), ErrorCategory::Dataset);
        assert_eq!(Error::EmptyResult("e".into()).category(), ErrorCategory::Domain);
        assert_eq!(
            Error::OutputPath {
                path: "/x".into(),
                reason: "denied".into()
            }
            .category(),
            ErrorCategory::Render
        );
    }

    #[test]
    fn test_error_recoverable() {
        assert!(Error::InvalidReferenceDate { value: "x".into() }.is_recoverable());
        assert!(!Error::Query("boom".into()).is_recoverable());
        assert!(!Error::Render("boom".into()).is_recoverable());
    }

    #[test]
    fn test_structured_error_from_error() {
        let err = Error::InsufficientData {
            column: "popularity".into(),
            needed: 2,
            got: 1,
        };
        let structured = StructuredError::from(&err);

        assert_eq!(structured.code, 32);
        assert_eq!(structured.category, ErrorCategory::Domain);
        assert!(structured.recoverable);
        assert_eq!(
            structured.context.get("column"),
            Some(&serde_json::json!("popularity"))
        );
    }

    #[test]
    fn test_structured_error_json() {
        let err = Error::NonPositiveElapsed { total: 0.0 };
        let json = StructuredError::from(&err).with_context("unit", "days").to_json();

        assert!(json.contains(r#""code":31"#));
        assert!(json.contains(r#""category":"domain""#));
        assert!(json.contains(r#""unit":"days""#));
    }

    #[test]
    fn test_format_error_human() {
        let err = Error::DatasetNotFound {
            path: "movies.db".into(),
        };
        let formatted = format_error_human(&err, false);

        assert!(formatted.contains("Dataset Not Found"));
        assert!(formatted.contains("dataset not found: movies.db"));
        assert!(formatted.contains("VOTESCOPE_DB"));
        assert!(!formatted.contains('\x1b'));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Dataset.to_string(), "dataset");
        assert_eq!(ErrorCategory::Domain.to_string(), "domain");
    }
}
