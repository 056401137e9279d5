//! Command pipelines.
//!
//! Each entry point runs one command end to end:
//!
//! ```text
//! load → normalize → estimate → evaluate → render → report
//! ```
//!
//! The dataset connection is dropped as soon as the rows are fetched. All
//! inputs come from the [`AnalysisConfig`]; nothing is read from globals.

use std::path::{Path, PathBuf};

use vs_common::{Error, ObservationSet, Result};

use crate::config::AnalysisConfig;
use crate::dataset::{Dataset, SummaryColumns};
use crate::evaluate::{fit_aggregate, fit_binomial, fit_ranked};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::rate::{per_record_rates, ranked_rates};
use crate::render::{
    aggregate_figure, binomial_figure, figure_path, ranked_figure, render_figure, Figure,
};
use crate::report::{BinomialReport, ExponentialReport, RatesReport, StatsReport};
use crate::stats::summarize;
use crate::timeline::{normalize, parse_reference_date, Normalized};

/// File stem of the aggregate exponential figure.
pub const EXPONENTIAL_STEM: &str = "exponential_distribution";
/// File stem of the ranked-rates figure.
pub const RATES_STEM: &str = "top_rates";
/// File stem of the binomial figure.
pub const BINOMIAL_STEM: &str = "binomial_distribution";

fn open_dataset(config: &AnalysisConfig, ctx: &LogContext) -> Result<Dataset> {
    let dataset = Dataset::open(&config.dataset.path, &config.dataset.table)?;
    log_event!(
        ctx,
        DEBUG,
        event_names::DATASET_OPENED,
        Stage::Load,
        "dataset opened",
        path = tracing::field::display(dataset.path().display()),
        table = dataset.table()
    );
    Ok(dataset)
}

fn load_observations(
    config: &AnalysisConfig,
    ctx: &LogContext,
    require_release_date: bool,
) -> Result<ObservationSet> {
    let set = open_dataset(config, ctx)?.observations(require_release_date)?;
    log_event!(
        ctx,
        INFO,
        event_names::DATASET_LOADED,
        Stage::Load,
        "rows fetched",
        rows = set.len()
    );
    Ok(set)
}

fn load_timed(config: &AnalysisConfig, ctx: &LogContext) -> Result<(usize, Normalized)> {
    let reference = parse_reference_date(&config.analysis.reference_date)?;
    let set = load_observations(config, ctx, true)?;
    let normalized = normalize(&set, reference, config.analysis.unit);

    let excluded = normalized.excluded;
    log_event!(
        ctx,
        INFO,
        event_names::NORMALIZE_FINISHED,
        Stage::Normalize,
        "release dates normalized",
        usable = normalized.timed.len(),
        malformed = excluded.malformed_date,
        missing = excluded.missing_date,
        future = excluded.future_release
    );
    if excluded.future_release > 0 {
        log_event!(
            ctx,
            WARN,
            event_names::NORMALIZE_FINISHED,
            Stage::Normalize,
            "releases after the reference date were excluded",
            count = excluded.future_release,
            reference_date = config.analysis.reference_date.as_str()
        );
    }
    Ok((set.len(), normalized))
}

/// Create the output directory if needed.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::OutputPath {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })
}

fn write_figure(
    figure: &Figure,
    stem: &str,
    config: &AnalysisConfig,
    ctx: &LogContext,
) -> Result<PathBuf> {
    let output = &config.output;
    prepare_output_dir(&output.dir)?;
    let path = figure_path(&output.dir, stem, &config.analysis.reference_date, output.image);
    render_figure(figure, &path, output.image)?;
    log_event!(
        ctx,
        INFO,
        event_names::RENDER_WRITTEN,
        Stage::Render,
        "figure written",
        path = tracing::field::display(path.display()),
        format = tracing::field::display(output.image)
    );
    Ok(path)
}

/// Aggregate λ over all dated records with a curve and per-record markers.
pub fn run_exponential(
    config: &AnalysisConfig,
    show_markers: bool,
    ctx: &LogContext,
) -> Result<ExponentialReport> {
    let (loaded, normalized) = load_timed(config, ctx)?;

    let fit = fit_aggregate(&normalized.timed, config.aggregate.samples)?;
    log_event!(
        ctx,
        INFO,
        event_names::ESTIMATE_FINISHED,
        Stage::Estimate,
        "aggregate rate estimated",
        rate = fit.rate.rate,
        observations = fit.rate.observations
    );

    let figure = aggregate_figure(
        &fit,
        &config.analysis.reference_date,
        config.analysis.unit,
        show_markers,
    );
    let path = write_figure(&figure, EXPONENTIAL_STEM, config, ctx)?;

    Ok(ExponentialReport {
        dataset: config.dataset.path.clone(),
        reference_date: config.analysis.reference_date.clone(),
        unit: config.analysis.unit,
        loaded,
        excluded: normalized.excluded,
        rate: fit.rate,
        axis: fit.axis,
        markers: if show_markers { fit.markers.len() } else { 0 },
        figure: path,
    })
}

/// Per-record λ, ranked, with one curve per record in the top-N.
pub fn run_rates(config: &AnalysisConfig, ctx: &LogContext) -> Result<RatesReport> {
    let (loaded, normalized) = load_timed(config, ctx)?;

    let candidates = per_record_rates(&normalized.timed).len();
    let ranked = ranked_rates(&normalized.timed, config.analysis.limit())?;
    log_event!(
        ctx,
        INFO,
        event_names::ESTIMATE_FINISHED,
        Stage::Estimate,
        "per-record rates ranked",
        candidates = candidates,
        shown = ranked.len()
    );

    let fit = fit_ranked(ranked, &config.axis);
    let dropped = fit.curves.iter().filter(|c| c.marker.is_none()).count();
    log_event!(
        ctx,
        DEBUG,
        event_names::EVALUATE_FINISHED,
        Stage::Evaluate,
        "curves sampled",
        upper = fit.axis.upper,
        samples = fit.axis.samples,
        markers_off_axis = dropped
    );

    let figure = ranked_figure(&fit, &config.analysis.reference_date, config.analysis.unit);
    let path = write_figure(&figure, RATES_STEM, config, ctx)?;

    Ok(RatesReport {
        dataset: config.dataset.path.clone(),
        reference_date: config.analysis.reference_date.clone(),
        unit: config.analysis.unit,
        loaded,
        excluded: normalized.excluded,
        candidates,
        axis: fit.axis,
        rates: fit.curves.into_iter().map(|c| c.rate).collect(),
        figure: path,
    })
}

/// Binomial approximation of the vote counts with its PMF table and chart.
pub fn run_binomial(config: &AnalysisConfig, ctx: &LogContext) -> Result<BinomialReport> {
    let set = load_observations(config, ctx, false)?;

    let fit = fit_binomial(&set)?;
    log_event!(
        ctx,
        INFO,
        event_names::ESTIMATE_FINISHED,
        Stage::Estimate,
        "binomial parameters derived",
        num_trials = fit.params.num_trials,
        success_probability = fit.params.success_probability
    );
    log_event!(
        ctx,
        DEBUG,
        event_names::EVALUATE_FINISHED,
        Stage::Evaluate,
        "pmf evaluated",
        lower_k = fit.window.lower_k,
        upper_k = fit.window.upper_k,
        window_mass = fit.window_mass
    );

    let figure = binomial_figure(&fit);
    let path = write_figure(&figure, BINOMIAL_STEM, config, ctx)?;

    Ok(BinomialReport {
        dataset: config.dataset.path.clone(),
        fit,
        figure: path,
    })
}

/// Descriptive statistics of the dataset columns. Draws nothing.
pub fn run_stats(config: &AnalysisConfig, ctx: &LogContext) -> Result<StatsReport> {
    let columns: SummaryColumns = open_dataset(config, ctx)?.summary_columns()?;
    log_event!(
        ctx,
        INFO,
        event_names::DATASET_LOADED,
        Stage::Load,
        "columns fetched",
        popularity = columns.popularity.len(),
        vote_count = columns.vote_count.len(),
        vote_average = columns.vote_average.len()
    );

    let summary = summarize(&columns)?;
    log_event!(
        ctx,
        DEBUG,
        event_names::EVALUATE_FINISHED,
        Stage::Evaluate,
        "columns summarized"
    );

    Ok(StatsReport {
        dataset: config.dataset.path.clone(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisMode;
    use crate::render::ImageFormat;
    use rusqlite::Connection;

    fn fixture(dir: &Path) -> PathBuf {
        let path = dir.join("movies.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE movies (
                id INTEGER, popularity REAL, vote_count INTEGER,
                vote_average REAL, release_date TEXT
            );
            INSERT INTO movies VALUES (1, 12.5, 100, 7.5, '2024-01-01');
            INSERT INTO movies VALUES (2, 3.0,  50,  6.0, '2024-06-01');
            INSERT INTO movies VALUES (3, 8.0,  10,  8.0, '2025-03-16');
            INSERT INTO movies VALUES (4, 1.0,  20,  4.0, 'soon');
            INSERT INTO movies VALUES (5, 2.0,  30,  5.0, '2026-01-01');",
        )
        .unwrap();
        path
    }

    fn config(dir: &Path) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.dataset.path = fixture(dir);
        config.output.dir = dir.join("plots");
        config.output.image = ImageFormat::Svg;
        config
    }

    fn ctx() -> LogContext {
        LogContext::new("run-test", "test")
    }

    #[test]
    fn exponential_writes_dated_figure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let report = run_exponential(&config, true, &ctx()).unwrap();
        assert_eq!(report.loaded, 5);
        assert_eq!(report.excluded.malformed_date, 1);
        assert_eq!(report.excluded.future_release, 1);
        assert_eq!(report.rate.observations, 3);
        assert_eq!(report.markers, 3);
        assert_eq!(
            report.figure,
            dir.path()
                .join("plots")
                .join("exponential_distribution_2025-03-20.svg")
        );
        assert!(report.figure.exists());
    }

    #[test]
    fn rates_rank_highest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.analysis.top_n = 2;

        let report = run_rates(&config, &ctx()).unwrap();
        assert_eq!(report.candidates, 3);
        assert_eq!(report.rates.len(), 2);
        // 10 votes over 4 days beats 100 votes over 444 days.
        assert_eq!(report.rates[0].rate, 2.5);
        assert_eq!(report.rates[0].rank, 1);
        assert!(report.figure.ends_with("top_rates_2025-03-20.svg"));
    }

    #[test]
    fn rates_fixed_axis() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.axis.mode = AxisMode::Fixed;
        config.axis.upper = 30.0;

        let report = run_rates(&config, &ctx()).unwrap();
        assert_eq!(report.axis.upper, 30.0);
        assert_eq!(report.rates.len(), 3);
    }

    #[test]
    fn binomial_uses_all_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let report = run_binomial(&config, &ctx()).unwrap();
        assert_eq!(report.fit.observations, 5);
        assert_eq!(report.fit.mean_vote_count, 42.0);
        assert!(report.figure.ends_with("binomial_distribution_2025-03-20.svg"));
    }

    #[test]
    fn stats_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let report = run_stats(&config, &ctx()).unwrap();
        assert_eq!(report.summary.vote_count.count, 5);
        assert_eq!(report.summary.popularity.max, 12.5);
        assert!(!dir.path().join("plots").exists());
    }

    #[test]
    fn reference_before_every_release_is_a_domain_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.analysis.reference_date = "2000-01-01".to_string();

        let err = run_exponential(&config, true, &ctx()).unwrap_err();
        assert!(matches!(err, Error::EmptyResult(_)));
        assert!(!dir.path().join("plots").exists());
    }

    #[test]
    fn output_dir_under_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let err = prepare_output_dir(&blocker.join("plots")).unwrap_err();
        assert_eq!(err.code(), 41);
    }
}
