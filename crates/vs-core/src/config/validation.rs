//! Semantic validation for configuration files.
//!
//! serde checks shape and types; this module checks that values make sense
//! together (parsable dates, safe identifiers, usable axis bounds).

use thiserror::Error;

use super::{AnalysisConfig, AxisMode};
use crate::timeline::parse_date;

/// Errors that can occur during semantic validation.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("analysis.reference_date must be YYYY-MM-DD (got '{value}')")]
    ReferenceDate { value: String },

    #[error("dataset.table must be a plain SQL identifier (got '{name}')")]
    TableName { name: String },

    #[error("axis.margin must be at least 1.0 (got {value})")]
    AxisMargin { value: f64 },

    #[error("axis.upper must be positive when axis.mode = \"fixed\" (got {value})")]
    AxisUpper { value: f64 },

    #[error("{field} must be at least 2 (got {value})")]
    TooFewSamples { field: String, value: usize },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Whether `name` can be spliced into SQL as a bare identifier.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate an analysis configuration semantically.
pub fn validate(config: &AnalysisConfig) -> Result<(), ValidationError> {
    if parse_date(&config.analysis.reference_date).is_none() {
        return Err(ValidationError::ReferenceDate {
            value: config.analysis.reference_date.clone(),
        });
    }

    if !is_plain_identifier(&config.dataset.table) {
        return Err(ValidationError::TableName {
            name: config.dataset.table.clone(),
        });
    }

    if config.dataset.path.as_os_str().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "dataset.path".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    let margin = config.axis.margin;
    if !margin.is_finite() || margin < 1.0 {
        return Err(ValidationError::AxisMargin { value: margin });
    }

    let upper = config.axis.upper;
    if config.axis.mode == AxisMode::Fixed && (!upper.is_finite() || upper <= 0.0) {
        return Err(ValidationError::AxisUpper {
            value: config.axis.upper,
        });
    }

    if config.axis.samples < 2 {
        return Err(ValidationError::TooFewSamples {
            field: "axis.samples".to_string(),
            value: config.axis.samples,
        });
    }

    if config.aggregate.samples < 2 {
        return Err(ValidationError::TooFewSamples {
            field: "aggregate.samples".to_string(),
            value: config.aggregate.samples,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_plain_identifier("movies"));
        assert!(is_plain_identifier("_movies_2024"));
        assert!(!is_plain_identifier("2024movies"));
        assert!(!is_plain_identifier("movies; DROP TABLE x"));
        assert!(!is_plain_identifier("\"movies\""));
        assert!(!is_plain_identifier(""));
    }

    #[test]
    fn test_bad_reference_date() {
        let mut config = AnalysisConfig::default();
        config.analysis.reference_date = "2025-02-30".into();
        assert_eq!(
            validate(&config),
            Err(ValidationError::ReferenceDate {
                value: "2025-02-30".into()
            })
        );
    }

    #[test]
    fn test_bad_table() {
        let mut config = AnalysisConfig::default();
        config.dataset.table = "movies where 1".into();
        assert!(matches!(validate(&config), Err(ValidationError::TableName { .. })));
    }

    #[test]
    fn test_axis_bounds() {
        let mut config = AnalysisConfig::default();
        config.axis.margin = 0.9;
        assert!(matches!(validate(&config), Err(ValidationError::AxisMargin { .. })));

        let mut config = AnalysisConfig::default();
        config.axis.margin = f64::NAN;
        assert!(matches!(validate(&config), Err(ValidationError::AxisMargin { .. })));

        let mut config = AnalysisConfig::default();
        config.axis.mode = AxisMode::Fixed;
        config.axis.upper = 0.0;
        assert!(matches!(validate(&config), Err(ValidationError::AxisUpper { .. })));

        // upper is ignored in observed mode
        let mut config = AnalysisConfig::default();
        config.axis.upper = -1.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_sample_counts() {
        let mut config = AnalysisConfig::default();
        config.axis.samples = 1;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::TooFewSamples { .. })
        ));

        let mut config = AnalysisConfig::default();
        config.aggregate.samples = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("aggregate.samples"));
    }
}
