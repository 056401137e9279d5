//! Exit codes for the votescope CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by changing inputs)
//! - 20-29: Internal and output errors

use vs_common::{Error, ErrorCategory};

/// Exit codes for votescope commands.
///
/// These codes are a stable contract for scripts. Changes require
/// a major version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success: report printed, figures written
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Configuration file or value rejected
    ConfigError = 11,

    /// Dataset missing, unreadable or not queryable
    DatasetError = 12,

    /// Data cannot define the requested distribution
    DomainError = 13,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,

    /// Figure could not be drawn or written
    RenderError = 22,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::DatasetError => "ERR_DATASET",
            ExitCode::DomainError => "ERR_DOMAIN",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
            ExitCode::RenderError => "ERR_RENDER",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Dataset => ExitCode::DatasetError,
            ErrorCategory::Domain => ExitCode::DomainError,
            ErrorCategory::Render => ExitCode::RenderError,
            ErrorCategory::Io => match err {
                Error::Json(_) => ExitCode::InternalError,
                _ => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::DomainError.as_i32(), 13);
        assert_eq!(ExitCode::RenderError.as_i32(), 22);
    }

    #[test]
    fn test_exit_code_ranges() {
        assert!(ExitCode::Clean.is_success());
        assert!(ExitCode::DatasetError.is_user_error());
        assert!(!ExitCode::IoError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
    }

    #[test]
    fn test_exit_code_from_error() {
        assert_eq!(
            ExitCode::from(&Error::InvalidReferenceDate { value: "x".into() }),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::from(&Error::DatasetNotFound { path: "/x".into() }),
            ExitCode::DatasetError
        );
        assert_eq!(
            ExitCode::from(&Error::NonPositiveElapsed { total: 0.0 }),
            ExitCode::DomainError
        );
        assert_eq!(
            ExitCode::from(&Error::Render("boom".into())),
            ExitCode::RenderError
        );
        assert_eq!(
            ExitCode::from(&Error::Io(std::io::Error::other("disk"))),
            ExitCode::IoError
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::DomainError.to_string(), "ERR_DOMAIN (13)");
    }
}
