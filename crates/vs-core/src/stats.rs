//! Descriptive statistics over the dataset columns.

use serde::Serialize;
use vs_common::{Error, Result};
use vs_math::{median, ColumnSummary};

use crate::dataset::SummaryColumns;
use crate::timeline::{date_from_ordinal, ordinal_day, DATE_FORMAT};

/// Earliest, latest and median release date.
///
/// Computed on ordinal days (0001-01-01 is day 0). Malformed dates are
/// counted and skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseSpan {
    pub earliest: String,
    pub latest: String,
    pub median: String,
    pub dated: usize,
    pub malformed: usize,
}

impl ReleaseSpan {
    /// None when no date parses.
    pub fn from_dates(dates: &[String]) -> Option<Self> {
        let ordinals: Vec<i64> = dates.iter().filter_map(|d| ordinal_day(d)).collect();
        let malformed = dates.len() - ordinals.len();

        let earliest = *ordinals.iter().min()?;
        let latest = *ordinals.iter().max()?;
        let as_f64: Vec<f64> = ordinals.iter().map(|&o| o as f64).collect();
        let middle = median(&as_f64)?.floor() as i64;

        let format = |ordinal: i64| {
            date_from_ordinal(ordinal)
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        };

        Some(ReleaseSpan {
            earliest: format(earliest),
            latest: format(latest),
            median: format(middle),
            dated: ordinals.len(),
            malformed,
        })
    }
}

/// Summary of the popularity, vote count and vote average columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub popularity: ColumnSummary,
    pub vote_count: ColumnSummary,
    pub vote_average: ColumnSummary,
    pub release_span: Option<ReleaseSpan>,
}

/// Summarize every column; each needs at least two non-null values.
pub fn summarize(columns: &SummaryColumns) -> Result<StatsSummary> {
    Ok(StatsSummary {
        popularity: summarize_column("popularity", &columns.popularity)?,
        vote_count: summarize_column("vote_count", &columns.vote_count)?,
        vote_average: summarize_column("vote_average", &columns.vote_average)?,
        release_span: ReleaseSpan::from_dates(&columns.release_dates),
    })
}

fn summarize_column(name: &str, values: &[f64]) -> Result<ColumnSummary> {
    ColumnSummary::from_values(values).ok_or_else(|| Error::InsufficientData {
        column: name.to_string(),
        needed: 2,
        got: values.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn release_span_skips_malformed() {
        let span = ReleaseSpan::from_dates(&dates(&[
            "2024-06-01",
            "bad",
            "2020-01-01",
            "2022-03-15",
            "2024-13-01",
        ]))
        .unwrap();
        assert_eq!(span.earliest, "2020-01-01");
        assert_eq!(span.latest, "2024-06-01");
        assert_eq!(span.median, "2022-03-15");
        assert_eq!(span.dated, 3);
        assert_eq!(span.malformed, 2);
    }

    #[test]
    fn release_span_even_count_floors_median() {
        let span = ReleaseSpan::from_dates(&dates(&["2024-01-01", "2024-01-04"])).unwrap();
        assert_eq!(span.median, "2024-01-02");
    }

    #[test]
    fn release_span_none_without_dates() {
        assert!(ReleaseSpan::from_dates(&dates(&["x", ""])).is_none());
        assert!(ReleaseSpan::from_dates(&[]).is_none());
    }

    #[test]
    fn summarize_known_columns() {
        let columns = SummaryColumns {
            popularity: vec![1.0, 2.0, 3.0, 4.0],
            vote_count: vec![100.0, 50.0],
            vote_average: vec![7.5, 6.0, 9.0],
            release_dates: dates(&["2024-01-01"]),
        };
        let summary = summarize(&columns).unwrap();
        assert_eq!(summary.popularity.median, 2.5);
        assert_eq!(summary.vote_count.mean, 75.0);
        assert_eq!(summary.vote_average.max, 9.0);
        assert!((summary.vote_count.std_dev - 35.355339059327).abs() < 1e-9);
        assert_eq!(summary.release_span.unwrap().earliest, "2024-01-01");
    }

    #[test]
    fn summarize_needs_two_values() {
        let columns = SummaryColumns {
            popularity: vec![1.0],
            vote_count: vec![1.0, 2.0],
            vote_average: vec![1.0, 2.0],
            release_dates: vec![],
        };
        let err = summarize(&columns).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData { ref column, got: 1, .. } if column == "popularity"
        ));
    }
}
