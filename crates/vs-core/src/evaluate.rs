//! Distribution evaluation.
//!
//! Turns estimated parameters into sampled curves and tables ready for
//! presentation:
//! - aggregate exponential curve with a marker per observation
//! - one exponential curve per ranked record
//! - binomial PMF over the ±3σ window

use serde::Serialize;
use vs_common::{Error, ObservationId, ObservationSet, Result};
use vs_math::{linspace, mean, BinomialParams, BinomialWindow, DensityCurve};

use crate::config::{AxisMode, AxisSection};
use crate::rate::{aggregate_rate, AggregateRate, RankedRate};
use crate::timeline::TimedObservation;

/// A sampled time axis `[0, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisSpec {
    pub upper: f64,
    pub samples: usize,
}

impl AxisSpec {
    /// Axis reaching `margin` past the largest observed elapsed time.
    pub fn observed(max_elapsed: f64, margin: f64, samples: usize) -> Self {
        AxisSpec {
            upper: max_elapsed * margin,
            samples,
        }
    }

    pub fn fixed(upper: f64, samples: usize) -> Self {
        AxisSpec { upper, samples }
    }

    /// Ranked-curve axis as configured.
    pub fn from_config(axis: &AxisSection, max_elapsed: f64) -> Self {
        match axis.mode {
            AxisMode::Observed => Self::observed(max_elapsed, axis.margin, axis.samples),
            AxisMode::Fixed => Self::fixed(axis.upper, axis.samples),
        }
    }

    /// Evenly spaced sample points including both ends.
    pub fn sample(&self) -> Vec<f64> {
        linspace(0.0, self.upper, self.samples)
    }

    pub fn contains(&self, t: f64) -> bool {
        (0.0..=self.upper).contains(&t)
    }
}

/// Density of one observation at its own elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: ObservationId,
    pub t: f64,
    pub density: f64,
    pub votes: f64,
}

/// Aggregate λ with its sampled curve.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateFit {
    pub rate: AggregateRate,
    pub axis: AxisSpec,
    pub curve: DensityCurve,
    pub markers: Vec<Marker>,
}

/// Estimate the aggregate λ and sample `f(t)` over `[0, max elapsed]`.
pub fn fit_aggregate(observations: &[TimedObservation], samples: usize) -> Result<AggregateFit> {
    let rate = aggregate_rate(observations)?;
    let axis = AxisSpec::fixed(rate.max_elapsed, samples);
    let curve = DensityCurve::evaluate(rate.rate, axis.sample());
    let markers = observations
        .iter()
        .map(|o| Marker {
            id: o.id,
            t: o.elapsed,
            density: curve.at(o.elapsed),
            votes: o.votes,
        })
        .collect();

    Ok(AggregateFit {
        rate,
        axis,
        curve,
        markers,
    })
}

/// One ranked record with its own curve.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCurve {
    pub rate: RankedRate,
    pub curve: DensityCurve,
    /// Absent when the record lies beyond a fixed axis.
    pub marker: Option<Marker>,
}

/// Curves for a ranked subset on a shared axis.
#[derive(Debug, Clone, Serialize)]
pub struct RankedFit {
    pub axis: AxisSpec,
    pub curves: Vec<RankedCurve>,
}

/// Sample one curve per ranked record on a shared axis.
pub fn fit_ranked(ranked: Vec<RankedRate>, axis: &AxisSection) -> RankedFit {
    let max_elapsed = ranked.iter().map(|r| r.elapsed).fold(0.0, f64::max);
    let spec = AxisSpec::from_config(axis, max_elapsed);
    let ts = spec.sample();

    let curves = ranked
        .into_iter()
        .map(|rate| {
            let curve = DensityCurve::evaluate(rate.rate, ts.clone());
            let marker = spec.contains(rate.elapsed).then(|| Marker {
                id: rate.id,
                t: rate.elapsed,
                density: curve.at(rate.elapsed),
                votes: rate.votes,
            });
            RankedCurve {
                rate,
                curve,
                marker,
            }
        })
        .collect();

    RankedFit { axis: spec, curves }
}

/// One row of the PMF table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PmfRow {
    pub k: u64,
    pub probability: f64,
}

/// Binomial approximation of vote counts.
#[derive(Debug, Clone, Serialize)]
pub struct BinomialFit {
    pub observations: usize,
    pub mean_vote_count: f64,
    pub mean_vote_average: f64,
    pub params: BinomialParams,
    pub expected_value: f64,
    pub std_deviation: f64,
    pub window: BinomialWindow,
    pub table: Vec<PmfRow>,
    /// Σ P(X=k) over the window.
    pub window_mass: f64,
}

/// Derive binomial parameters from the set means and evaluate the PMF.
pub fn fit_binomial(set: &ObservationSet) -> Result<BinomialFit> {
    let (Some(mean_vote_count), Some(mean_vote_average)) =
        (mean(&set.vote_counts), mean(&set.vote_averages))
    else {
        return Err(Error::EmptyResult(
            "no row has both vote_count and vote_average".to_string(),
        ));
    };

    let params = BinomialParams::from_means(mean_vote_count, mean_vote_average).ok_or_else(|| {
        Error::InvalidParameters(format!(
            "mean vote_count {:.2} / mean vote_average {:.2} do not define a binomial",
            mean_vote_count, mean_vote_average
        ))
    })?;

    let table = params
        .table()
        .into_iter()
        .map(|(k, probability)| PmfRow { k, probability })
        .collect();

    Ok(BinomialFit {
        observations: set.len(),
        mean_vote_count,
        mean_vote_average,
        params,
        expected_value: params.expected_value(),
        std_deviation: params.std_deviation(),
        window: params.window(),
        table,
        window_mass: params.window_mass(),
    })
}
