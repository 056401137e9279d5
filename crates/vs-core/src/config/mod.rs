//! Configuration loading and validation.
//!
//! This module handles:
//! - Loading the TOML analysis configuration
//! - Config resolution order (CLI > env > XDG > defaults)
//! - Schema validation (shape/type checking via serde)
//! - Semantic validation (dates, identifiers, axis bounds)
//! - Applying command-line overrides on top of the file

pub mod validation;

pub use validation::{validate, ValidationError};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::render::ImageFormat;
use crate::timeline::TimeUnit;

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "votescope";

/// Config file name inside the config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "VOTESCOPE_CONFIG";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Semantic validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for vs_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(ValidationError::ReferenceDate { value }) => {
                vs_common::Error::InvalidReferenceDate { value }
            }
            ConfigError::ValidationError(ValidationError::TableName { name }) => {
                vs_common::Error::InvalidTable { name }
            }
            other => vs_common::Error::Config(other.to_string()),
        }
    }
}

/// `[dataset]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetSection {
    /// Path to the SQLite database.
    pub path: PathBuf,
    /// Table holding one row per movie.
    pub table: String,
}

impl Default for DatasetSection {
    fn default() -> Self {
        DatasetSection {
            path: PathBuf::from("movies.db"),
            table: "movies".to_string(),
        }
    }
}

/// `[analysis]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSection {
    /// Date elapsed time is measured to (`YYYY-MM-DD`).
    pub reference_date: String,
    pub unit: TimeUnit,
    /// Ranked subset size; zero or negative keeps every record.
    pub top_n: i64,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        AnalysisSection {
            reference_date: "2025-03-20".to_string(),
            unit: TimeUnit::Days,
            top_n: 15,
        }
    }
}

impl AnalysisSection {
    /// `top_n` as a truncation limit.
    pub fn limit(&self) -> Option<usize> {
        usize::try_from(self.top_n).ok().filter(|&n| n > 0)
    }
}

/// How the ranked-curve time axis is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AxisMode {
    /// Upper bound is the largest elapsed time times `margin`.
    #[default]
    Observed,
    /// Upper bound is `upper`.
    Fixed,
}

/// `[axis]` section: the ranked-curve time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AxisSection {
    pub mode: AxisMode,
    pub margin: f64,
    pub upper: f64,
    pub samples: usize,
}

impl Default for AxisSection {
    fn default() -> Self {
        AxisSection {
            mode: AxisMode::Observed,
            margin: 1.1,
            upper: 1.0,
            samples: 500,
        }
    }
}

/// `[aggregate]` section: the aggregate-curve time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregateSection {
    pub samples: usize,
}

impl Default for AggregateSection {
    fn default() -> Self {
        AggregateSection { samples: 1000 }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Directory figures are written to; created when missing.
    pub dir: PathBuf,
    pub image: ImageFormat,
}

impl Default for OutputSection {
    fn default() -> Self {
        OutputSection {
            dir: PathBuf::from("plots"),
            image: ImageFormat::Svg,
        }
    }
}

/// Complete analysis configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub dataset: DatasetSection,
    pub analysis: AnalysisSection,
    pub axis: AxisSection,
    pub aggregate: AggregateSection,
    pub output: OutputSection,
}

impl AnalysisConfig {
    /// Parse from TOML text without semantic validation.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Render as TOML, e.g. for `config show`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply command-line overrides in place.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(path) = &overrides.db {
            self.dataset.path = path.clone();
        }
        if let Some(date) = &overrides.reference_date {
            self.analysis.reference_date = date.clone();
        }
        if let Some(unit) = overrides.unit {
            self.analysis.unit = unit;
        }
        if let Some(top_n) = overrides.top_n {
            self.analysis.top_n = top_n;
        }
        if let Some(mode) = overrides.axis_mode {
            self.axis.mode = mode;
        }
        if let Some(upper) = overrides.axis_upper {
            self.axis.upper = upper;
        }
        if let Some(dir) = &overrides.output_dir {
            self.output.dir = dir.clone();
        }
        if let Some(image) = overrides.image {
            self.output.image = image;
        }
    }
}

/// Values given on the command line; `None` leaves the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db: Option<PathBuf>,
    pub reference_date: Option<String>,
    pub unit: Option<TimeUnit>,
    pub top_n: Option<i64>,
    pub axis_mode: Option<AxisMode>,
    pub axis_upper: Option<f64>,
    pub output_dir: Option<PathBuf>,
    pub image: Option<ImageFormat>,
}

/// Where the configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigResolution {
    CliFlag,
    EnvVar,
    XdgConfig,
    Default,
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: AnalysisConfig,
    /// Path to the config file (None if using defaults).
    pub path: Option<PathBuf>,
    /// SHA-256 hash of the config file content (None if using defaults).
    pub hash: Option<String>,
    pub resolution: ConfigResolution,
}

impl ResolvedConfig {
    /// Provenance summary for reports.
    pub fn source(&self) -> ConfigSource {
        ConfigSource {
            path: self.path.clone(),
            hash: self.hash.clone(),
            resolution: self.resolution,
        }
    }
}

/// Config provenance attached to reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSource {
    pub path: Option<PathBuf>,
    pub hash: Option<String>,
    pub resolution: ConfigResolution,
}

/// Configuration resolution options.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Explicit config file (highest priority).
    pub config_path: Option<PathBuf>,
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI flag (via ConfigOptions)
/// 2. Environment variable (VOTESCOPE_CONFIG)
/// 3. XDG config home (~/.config/votescope/config.toml), when present
/// 4. Built-in defaults
///
/// An explicit file (1 or 2) that does not exist is an error.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    load_config_with(options, |key| std::env::var(key).ok())
}

/// [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(options: &ConfigOptions, env: F) -> Result<ResolvedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some((path, resolution)) = resolve_config_path(options, &env) else {
        return Ok(ResolvedConfig {
            config: AnalysisConfig::default(),
            path: None,
            hash: None,
            resolution: ConfigResolution::Default,
        });
    };

    if resolution == ConfigResolution::XdgConfig && !path.exists() {
        return Ok(ResolvedConfig {
            config: AnalysisConfig::default(),
            path: None,
            hash: None,
            resolution: ConfigResolution::Default,
        });
    }

    let (config, hash) = load_config_from_file(&path)?;
    Ok(ResolvedConfig {
        config,
        path: Some(path),
        hash: Some(hash),
        resolution,
    })
}

/// Resolve the config file path using the standard resolution order.
fn resolve_config_path<F>(options: &ConfigOptions, env: &F) -> Option<(PathBuf, ConfigResolution)>
where
    F: Fn(&str) -> Option<String>,
{
    // 1. Explicit option
    if let Some(path) = &options.config_path {
        return Some((path.clone(), ConfigResolution::CliFlag));
    }

    // 2. Environment variable
    if let Some(path) = env(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some((PathBuf::from(path), ConfigResolution::EnvVar));
    }

    // 3. XDG config home
    let xdg_config = env("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)?;

    Some((
        xdg_config.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        ConfigResolution::XdgConfig,
    ))
}

/// Parse a config file and hash its content.
///
/// Only shape and types are checked here. Semantic [`validate`] runs on the
/// effective configuration, after command-line overrides are applied.
pub fn load_config_from_file(path: &Path) -> Result<(AnalysisConfig, String), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let hash = compute_hash(&content);

    let config = AnalysisConfig::from_toml(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok((config, hash))
}

/// Compute the SHA-256 hash of content as lowercase hex.
fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
