//! Command reports.
//!
//! Every command produces a serializable report that prints in one of three
//! formats:
//! - `human`: markdown-flavoured text for terminals
//! - `json`: the report inside a versioned envelope
//! - `summary`: a single line prefixed with the run ID

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;
use vs_common::{Error, OutputFormat, Result, SCHEMA_VERSION};
use vs_math::ColumnSummary;

use crate::config::{AnalysisConfig, ConfigSource};
use crate::evaluate::{AxisSpec, BinomialFit};
use crate::logging::LogContext;
use crate::rate::{AggregateRate, RankedRate};
use crate::stats::StatsSummary;
use crate::timeline::{ExclusionCounts, TimeUnit};

/// A printable command result.
pub trait Report: Serialize {
    /// Multi-line text for `--format human`.
    fn human(&self) -> String;

    /// One line for `--format summary`, without the run prefix.
    fn summary_line(&self) -> String;
}

/// JSON wrapper shared by every command.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub schema_version: &'static str,
    pub run_id: &'a str,
    pub generated_at: String,
    pub command: &'a str,
    pub config: &'a ConfigSource,
    pub result: &'a T,
}

/// Format `report` for stdout.
pub fn render_report<T: Report>(
    report: &T,
    format: OutputFormat,
    ctx: &LogContext,
    source: &ConfigSource,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(report.human()),
        OutputFormat::Summary => Ok(format!("[{}] {}", ctx.run_id, report.summary_line())),
        OutputFormat::Json => {
            let envelope = Envelope {
                schema_version: SCHEMA_VERSION,
                run_id: &ctx.run_id,
                generated_at: chrono::Utc::now().to_rfc3339(),
                command: &ctx.command,
                config: source,
                result: report,
            };
            Ok(serde_json::to_string_pretty(&envelope)?)
        }
    }
}

fn per_unit(unit: TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Days => "day",
        TimeUnit::Hours => "hour",
    }
}

fn excluded_line(excluded: &ExclusionCounts) -> String {
    format!(
        "{} (missing {}, malformed {}, future {})",
        excluded.total(),
        excluded.missing_date,
        excluded.malformed_date,
        excluded.future_release
    )
}

/// Aggregate exponential fit.
#[derive(Debug, Clone, Serialize)]
pub struct ExponentialReport {
    pub dataset: PathBuf,
    pub reference_date: String,
    pub unit: TimeUnit,
    /// Rows returned by the query.
    pub loaded: usize,
    pub excluded: ExclusionCounts,
    pub rate: AggregateRate,
    pub axis: AxisSpec,
    /// Markers drawn; 0 with `--no-markers`.
    pub markers: usize,
    pub figure: PathBuf,
}

impl Report for ExponentialReport {
    fn human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Aggregate exponential fit");
        let _ = writeln!(out);
        let _ = writeln!(out, "Dataset:        {}", self.dataset.display());
        let _ = writeln!(out, "Reference date: {}", self.reference_date);
        let _ = writeln!(out, "Rows loaded:    {}", self.loaded);
        let _ = writeln!(out, "Excluded:       {}", excluded_line(&self.excluded));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "λ = {:.6} votes per {}",
            self.rate.rate,
            per_unit(self.unit)
        );
        let _ = writeln!(out, "Observations:   {}", self.rate.observations);
        let _ = writeln!(out, "Total votes:    {:.0}", self.rate.total_votes);
        let _ = writeln!(
            out,
            "Total elapsed:  {:.2} {}",
            self.rate.total_elapsed, self.unit
        );
        let _ = writeln!(
            out,
            "Axis:           [0, {:.2}] ({} samples)",
            self.axis.upper, self.axis.samples
        );
        let _ = writeln!(out);
        let _ = write!(out, "Figure: {}", self.figure.display());
        out
    }

    fn summary_line(&self) -> String {
        format!(
            "exponential: λ={:.6} over {} observations -> {}",
            self.rate.rate,
            self.rate.observations,
            self.figure.display()
        )
    }
}

/// Per-record rates, highest first.
#[derive(Debug, Clone, Serialize)]
pub struct RatesReport {
    pub dataset: PathBuf,
    pub reference_date: String,
    pub unit: TimeUnit,
    pub loaded: usize,
    pub excluded: ExclusionCounts,
    /// Records that produced a rate before truncation.
    pub candidates: usize,
    pub axis: AxisSpec,
    pub rates: Vec<RankedRate>,
    pub figure: PathBuf,
}

impl Report for RatesReport {
    fn human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "# Top-{} of {} records by voting intensity",
            self.rates.len(),
            self.candidates
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Dataset:        {}", self.dataset.display());
        let _ = writeln!(out, "Reference date: {}", self.reference_date);
        let _ = writeln!(out, "Excluded:       {}", excluded_line(&self.excluded));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:>4}  {:>10}  {:<10}  {:>10}  {:>10}  {:>12}",
            "Rank",
            "Id",
            "Released",
            "Votes",
            self.unit.to_string(),
            format!("λ (/{})", per_unit(self.unit))
        );
        for r in &self.rates {
            let _ = writeln!(
                out,
                "{:>4}  {:>10}  {:<10}  {:>10.0}  {:>10.2}  {:>12.4}",
                r.rank, r.id.0, r.release_date, r.votes, r.elapsed, r.rate
            );
        }
        let _ = writeln!(out);
        let _ = write!(out, "Figure: {}", self.figure.display());
        out
    }

    fn summary_line(&self) -> String {
        let top = self
            .rates
            .first()
            .map(|r| format!(", top λ={:.4} (id {})", r.rate, r.id.0))
            .unwrap_or_default();
        format!(
            "rates: {} of {} records{} -> {}",
            self.rates.len(),
            self.candidates,
            top,
            self.figure.display()
        )
    }
}

/// Binomial approximation of vote counts.
#[derive(Debug, Clone, Serialize)]
pub struct BinomialReport {
    pub dataset: PathBuf,
    pub fit: BinomialFit,
    pub figure: PathBuf,
}

impl Report for BinomialReport {
    fn human(&self) -> String {
        let fit = &self.fit;
        let mut out = String::new();
        let _ = writeln!(out, "# Binomial distribution");
        let _ = writeln!(out);
        let _ = writeln!(out, "Dataset:                 {}", self.dataset.display());
        let _ = writeln!(out, "Rows:                    {}", fit.observations);
        let _ = writeln!(out, "Mean vote_count:         {:.2}", fit.mean_vote_count);
        let _ = writeln!(out, "Mean vote_average:       {:.2}", fit.mean_vote_average);
        let _ = writeln!(out);
        let _ = writeln!(out, "Number of trials (n):    {}", fit.params.num_trials);
        let _ = writeln!(
            out,
            "Success probability (p): {:.4}",
            fit.params.success_probability
        );
        let _ = writeln!(out, "Expected value:          {:.4}", fit.expected_value);
        let _ = writeln!(out, "Standard deviation:      {:.4}", fit.std_deviation);
        let _ = writeln!(
            out,
            "Window:                  k in [{}, {}] (mass {:.4})",
            fit.window.lower_k, fit.window.upper_k, fit.window_mass
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "{:>8}  {:>12}", "k", "P(X=k)");
        for row in &fit.table {
            let _ = writeln!(out, "{:>8}  {:>12.6}", row.k, row.probability);
        }
        let _ = writeln!(out);
        let _ = write!(out, "Figure: {}", self.figure.display());
        out
    }

    fn summary_line(&self) -> String {
        format!(
            "binomial: n={} p={:.4} E[X]={:.2} window=[{}, {}] -> {}",
            self.fit.params.num_trials,
            self.fit.params.success_probability,
            self.fit.expected_value,
            self.fit.window.lower_k,
            self.fit.window.upper_k,
            self.figure.display()
        )
    }
}

/// Descriptive statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub dataset: PathBuf,
    pub summary: StatsSummary,
}

fn column_line(label: &str, s: &ColumnSummary) -> String {
    format!(
        "{}: min = {:.2}, max = {:.2}, mean = {:.2}, median = {:.2}, std = {:.2}",
        label, s.min, s.max, s.mean, s.median, s.std_dev
    )
}

impl Report for StatsReport {
    fn human(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();
        let _ = writeln!(out, "# Dataset statistics");
        let _ = writeln!(out);
        let _ = writeln!(out, "Dataset: {}", self.dataset.display());
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", column_line("Popularity", &s.popularity));
        let _ = writeln!(out, "{}", column_line("Vote count", &s.vote_count));
        let _ = write!(out, "{}", column_line("Vote average", &s.vote_average));
        match &s.release_span {
            Some(span) => {
                let _ = write!(
                    out,
                    "\nRelease date: earliest = {}, latest = {}, median = {} ({} dated, {} malformed)",
                    span.earliest, span.latest, span.median, span.dated, span.malformed
                );
            }
            None => {
                let _ = write!(out, "\nRelease date: no parseable dates");
            }
        }
        out
    }

    fn summary_line(&self) -> String {
        let s = &self.summary;
        format!(
            "stats: popularity mean={:.2}, vote_count mean={:.2}, vote_average mean={:.2}",
            s.popularity.mean, s.vote_count.mean, s.vote_average.mean
        )
    }
}

/// The effective configuration after file and flag resolution.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigShowReport {
    pub source: ConfigSource,
    pub config: AnalysisConfig,
    #[serde(skip)]
    toml: String,
}

impl ConfigShowReport {
    pub fn new(source: ConfigSource, config: AnalysisConfig) -> Result<Self> {
        let toml = config
            .to_toml()
            .map_err(|e| Error::Config(format!("cannot render configuration: {}", e)))?;
        Ok(ConfigShowReport {
            source,
            config,
            toml,
        })
    }
}

impl Report for ConfigShowReport {
    fn human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Configuration");
        let _ = writeln!(out);
        match &self.source.path {
            Some(path) => {
                let _ = writeln!(out, "Source: {}", path.display());
            }
            None => {
                let _ = writeln!(out, "Source: built-in defaults");
            }
        }
        if let Some(hash) = &self.source.hash {
            let _ = writeln!(out, "SHA-256: {}", hash);
        }
        let _ = writeln!(out);
        let _ = write!(out, "{}", self.toml.trim_end());
        out
    }

    fn summary_line(&self) -> String {
        let source = self
            .source
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string());
        format!(
            "config: {} (db {}, reference {})",
            source,
            self.config.dataset.path.display(),
            self.config.analysis.reference_date
        )
    }
}

/// Outcome of `config validate`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValidateReport {
    pub source: ConfigSource,
    pub valid: bool,
}

impl Report for ConfigValidateReport {
    fn human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Configuration Validation");
        let _ = writeln!(out);
        match &self.source.path {
            Some(path) => {
                let _ = writeln!(out, "Path:    {}", path.display());
            }
            None => {
                let _ = writeln!(out, "Path:    built-in defaults");
            }
        }
        if let Some(hash) = &self.source.hash {
            let _ = writeln!(out, "SHA-256: {}", hash);
        }
        let _ = write!(out, "Status:  {}", if self.valid { "OK" } else { "INVALID" });
        out
    }

    fn summary_line(&self) -> String {
        let status = if self.valid { "OK" } else { "INVALID" };
        match &self.source.path {
            Some(path) => format!("config validate: {} ({})", status, path.display()),
            None => format!("config validate: {} (built-in defaults)", status),
        }
    }
}
