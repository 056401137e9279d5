//! Property-based tests for rate estimation and date normalization.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use vs_common::{Observation, ObservationId, ObservationSet};
use vs_core::rate::{aggregate_rate, per_record_rates, ranked_rates};
use vs_core::timeline::{normalize, TimeUnit, TimedObservation};

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
}

fn timed_strategy() -> impl Strategy<Value = Vec<TimedObservation>> {
    prop::collection::vec((0.0f64..10_000.0, 0.0f64..5_000.0), 1..40).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (votes, elapsed))| TimedObservation {
                id: ObservationId(i as i64 + 1),
                votes,
                elapsed,
                release_date: String::new(),
            })
            .collect()
    })
}

/// Release date offsets in days from the reference; `None` is a malformed
/// string.
fn release_strategy() -> impl Strategy<Value = Vec<Option<i64>>> {
    prop::collection::vec(prop::option::weighted(0.8, -400i64..4_000), 0..60)
}

proptest! {
    #[test]
    fn aggregate_rate_is_order_invariant(mut obs in timed_strategy()) {
        let Ok(forward) = aggregate_rate(&obs) else {
            return Ok(());
        };
        obs.reverse();
        let backward = aggregate_rate(&obs).unwrap();
        let tolerance = 1e-9 * forward.rate.abs().max(1.0);
        prop_assert!((forward.rate - backward.rate).abs() <= tolerance);
        prop_assert_eq!(forward.observations, backward.observations);
    }

    #[test]
    fn aggregate_rate_is_ratio_of_sums(obs in timed_strategy()) {
        if let Ok(agg) = aggregate_rate(&obs) {
            prop_assert!(agg.rate > 0.0);
            prop_assert!((agg.rate - agg.total_votes / agg.total_elapsed).abs() < 1e-12);
            let max = obs.iter().map(|o| o.elapsed).fold(0.0, f64::max);
            prop_assert_eq!(agg.max_elapsed, max);
        }
    }

    #[test]
    fn ranked_rates_are_sorted_and_ranked(obs in timed_strategy(), limit in 0usize..50) {
        let candidates = per_record_rates(&obs).len();
        match ranked_rates(&obs, Some(limit)) {
            Ok(ranked) => {
                prop_assert_eq!(ranked.len(), limit.min(candidates));
                for pair in ranked.windows(2) {
                    prop_assert!(pair[0].rate >= pair[1].rate);
                }
                for (i, r) in ranked.iter().enumerate() {
                    prop_assert_eq!(r.rank, i + 1);
                    prop_assert!(r.elapsed > 0.0 && r.votes > 0.0);
                }
            }
            Err(_) => prop_assert_eq!(candidates, 0),
        }
    }

    #[test]
    fn normalize_accounts_for_every_row(offsets in release_strategy()) {
        let set: ObservationSet = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| {
                let date = match offset {
                    Some(days) => (reference() - Duration::days(*days))
                        .format("%Y-%m-%d")
                        .to_string(),
                    None => "not-a-date".to_string(),
                };
                Observation::new(i as i64, 1.0, 5.0, Some(date))
            })
            .collect();

        let normalized = normalize(&set, reference(), TimeUnit::Days);
        prop_assert_eq!(normalized.timed.len() + normalized.excluded.total(), set.len());

        let future = offsets.iter().filter(|o| matches!(o, Some(d) if *d < 0)).count();
        prop_assert_eq!(normalized.excluded.future_release, future);
        prop_assert!(normalized.timed.iter().all(|t| t.elapsed >= 0.0));
    }

    #[test]
    fn hours_are_days_times_24(days in 0i64..4_000) {
        let date = (reference() - Duration::days(days)).format("%Y-%m-%d").to_string();
        let set: ObservationSet = vec![Observation::new(1, 1.0, 5.0, Some(date))]
            .into_iter()
            .collect();
        let in_days = normalize(&set, reference(), TimeUnit::Days);
        let in_hours = normalize(&set, reference(), TimeUnit::Hours);
        prop_assert_eq!(in_hours.timed[0].elapsed, in_days.timed[0].elapsed * 24.0);
    }
}
