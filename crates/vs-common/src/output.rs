//! Output formats.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported report formats on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text tables (default)
    #[default]
    Human,

    /// Pretty-printed JSON for machine consumption
    Json,

    /// One-line summary for quick checks
    Summary,
}

impl OutputFormat {
    /// Whether stdout carries a machine-readable payload.
    pub fn is_machine(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Human => write!(f, "human"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}
