//! Exponential rate estimation.
//!
//! Two independent modes over normalized observations:
//! - aggregate: one λ = Σvotes / Σelapsed for the whole set
//! - per-record: λᵢ = votesᵢ / elapsedᵢ, ranked descending and truncated
//!
//! Both are pure functions; λ is always strictly positive.

use serde::Serialize;
use vs_common::{Error, ObservationId, Result};

use crate::timeline::TimedObservation;

/// A single λ for the whole observation set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateRate {
    pub rate: f64,
    pub total_votes: f64,
    pub total_elapsed: f64,
    pub observations: usize,
    /// Largest elapsed time among the observations.
    pub max_elapsed: f64,
}

/// Aggregate λ over every observation.
///
/// Invariant under reordering. Fails when the set is empty, when the summed
/// elapsed time is not positive, or when no votes were cast.
pub fn aggregate_rate(observations: &[TimedObservation]) -> Result<AggregateRate> {
    if observations.is_empty() {
        return Err(Error::EmptyResult(
            "no observation has a usable release date".to_string(),
        ));
    }

    let total_votes: f64 = observations.iter().map(|o| o.votes).sum();
    let total_elapsed: f64 = observations.iter().map(|o| o.elapsed).sum();
    let max_elapsed = observations
        .iter()
        .map(|o| o.elapsed)
        .fold(0.0, f64::max);

    if total_elapsed <= 0.0 {
        return Err(Error::NonPositiveElapsed {
            total: total_elapsed,
        });
    }
    if total_votes <= 0.0 {
        return Err(Error::InvalidParameters(format!(
            "aggregate vote count must be positive, got {}",
            total_votes
        )));
    }

    Ok(AggregateRate {
        rate: total_votes / total_elapsed,
        total_votes,
        total_elapsed,
        observations: observations.len(),
        max_elapsed,
    })
}

/// λ for one observation, in ranked order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRate {
    /// 1-based position in descending-λ order.
    pub rank: usize,
    pub id: ObservationId,
    pub votes: f64,
    pub elapsed: f64,
    pub rate: f64,
    pub release_date: String,
}

/// Per-record λ for observations with `elapsed > 0` and `votes > 0`, in
/// input order. Others contribute no estimate.
pub fn per_record_rates(observations: &[TimedObservation]) -> Vec<RankedRate> {
    observations
        .iter()
        .filter(|o| o.elapsed > 0.0 && o.votes > 0.0)
        .map(|o| RankedRate {
            rank: 0,
            id: o.id,
            votes: o.votes,
            elapsed: o.elapsed,
            rate: o.votes / o.elapsed,
            release_date: o.release_date.clone(),
        })
        .collect()
}

/// Per-record λ sorted descending and truncated to `limit` (None = all).
///
/// The sort is stable, so equal rates keep query order. Fails when no
/// observation yields a rate.
pub fn ranked_rates(
    observations: &[TimedObservation],
    limit: Option<usize>,
) -> Result<Vec<RankedRate>> {
    let mut rates = per_record_rates(observations);
    if rates.is_empty() {
        return Err(Error::EmptyResult(
            "no observation has both votes and positive elapsed time".to_string(),
        ));
    }

    rates.sort_by(|a, b| b.rate.total_cmp(&a.rate));
    if let Some(n) = limit {
        rates.truncate(n);
    }
    for (i, r) in rates.iter_mut().enumerate() {
        r.rank = i + 1;
    }
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed(id: i64, votes: f64, elapsed: f64) -> TimedObservation {
        TimedObservation {
            id: ObservationId(id),
            votes,
            elapsed,
            release_date: format!("r{}", id),
        }
    }

    #[test]
    fn aggregate_known_example() {
        let obs = vec![timed(1, 100.0, 444.0), timed(2, 50.0, 292.0)];
        let agg = aggregate_rate(&obs).unwrap();
        assert_eq!(agg.total_votes, 150.0);
        assert_eq!(agg.total_elapsed, 736.0);
        assert!((agg.rate - 150.0 / 736.0).abs() < 1e-15);
        assert!((agg.rate - 0.2038).abs() < 1e-4);
        assert_eq!(agg.max_elapsed, 444.0);
    }

    #[test]
    fn aggregate_rejects_zero_elapsed() {
        let obs = vec![timed(1, 100.0, 0.0), timed(2, 5.0, 0.0)];
        let err = aggregate_rate(&obs).unwrap_err();
        assert!(matches!(err, Error::NonPositiveElapsed { .. }));
    }

    #[test]
    fn aggregate_rejects_empty_and_voteless() {
        assert!(matches!(aggregate_rate(&[]).unwrap_err(), Error::EmptyResult(_)));
        let obs = vec![timed(1, 0.0, 10.0)];
        assert!(matches!(
            aggregate_rate(&obs).unwrap_err(),
            Error::InvalidParameters(_)
        ));
    }

    #[test]
    fn ranked_known_example() {
        let obs = vec![timed(1, 100.0, 444.0), timed(2, 50.0, 292.0)];
        let ranked = ranked_rates(&obs, None).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, ObservationId(1));
        assert_eq!(ranked[0].rank, 1);
        assert!((ranked[0].rate - 0.2252).abs() < 1e-4);
        assert!((ranked[1].rate - 0.1712).abs() < 1e-4);
    }

    #[test]
    fn ranked_skips_invalid_records() {
        let obs = vec![
            timed(1, 0.0, 100.0),
            timed(2, 10.0, 0.0),
            timed(3, 10.0, 5.0),
        ];
        let ranked = ranked_rates(&obs, Some(10)).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, ObservationId(3));
        assert_eq!(ranked[0].rate, 2.0);
    }

    #[test]
    fn ranked_truncates_to_limit() {
        let obs: Vec<_> = (1..=30).map(|i| timed(i, i as f64, 10.0)).collect();
        let ranked = ranked_rates(&obs, Some(15)).unwrap();
        assert_eq!(ranked.len(), 15);
        assert_eq!(ranked[0].id, ObservationId(30));
        assert_eq!(ranked[14].rank, 15);
    }

    #[test]
    fn ranked_ties_keep_query_order() {
        let obs = vec![timed(7, 10.0, 5.0), timed(3, 20.0, 10.0)];
        let ranked = ranked_rates(&obs, None).unwrap();
        assert_eq!(ranked[0].id, ObservationId(7));
        assert_eq!(ranked[1].id, ObservationId(3));
    }

    #[test]
    fn ranked_empty_is_domain_error() {
        let obs = vec![timed(1, 0.0, 0.0)];
        assert!(matches!(
            ranked_rates(&obs, None).unwrap_err(),
            Error::EmptyResult(_)
        ));
    }
}
