//! Release-date normalization.
//!
//! Converts `YYYY-MM-DD` release dates into elapsed time relative to a fixed
//! reference date. Dates that fail to parse are absent, never zero, and
//! releases after the reference date are dropped before rate estimation.

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use vs_common::{Error, ObservationId, ObservationSet, Result};

/// Accepted date layout for release and reference dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Unit for elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Whole days
    #[default]
    Days,
    /// Fractional hours (total seconds / 3600)
    Hours,
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnit::Days => write!(f, "days"),
            TimeUnit::Hours => write!(f, "hours"),
        }
    }
}

/// Parse a date strictly as `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Parse the analysis reference date. Unlike release dates, a bad reference
/// date aborts the run.
pub fn parse_reference_date(value: &str) -> Result<NaiveDate> {
    parse_date(value).ok_or_else(|| Error::InvalidReferenceDate {
        value: value.to_string(),
    })
}

/// Elapsed time from `date` to `reference` in `unit`.
///
/// Absent when `date` does not parse. Negative when the release is after the
/// reference date; callers must filter those out.
pub fn elapsed(date: &str, reference: NaiveDate, unit: TimeUnit) -> Option<f64> {
    let released = parse_date(date)?;
    let delta = reference.signed_duration_since(released);
    Some(match unit {
        TimeUnit::Days => delta.num_days() as f64,
        TimeUnit::Hours => delta.num_seconds() as f64 / 3600.0,
    })
}

/// Days since 0001-01-01 (which is day 0).
pub fn ordinal_day(date: &str) -> Option<i64> {
    parse_date(date).map(|d| i64::from(d.num_days_from_ce()) - 1)
}

/// Inverse of [`ordinal_day`].
pub fn date_from_ordinal(ordinal: i64) -> Option<NaiveDate> {
    let days = i32::try_from(ordinal.checked_add(1)?).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days)
}

/// An observation with a usable elapsed time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedObservation {
    pub id: ObservationId,
    pub votes: f64,
    /// Non-negative elapsed time in the run's unit.
    pub elapsed: f64,
    pub release_date: String,
}

/// Why an observation was left out of rate estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    MissingDate,
    MalformedDate,
    FutureRelease,
}

/// Counts of excluded observations, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionCounts {
    pub missing_date: usize,
    pub malformed_date: usize,
    pub future_release: usize,
}

impl ExclusionCounts {
    pub fn total(&self) -> usize {
        self.missing_date + self.malformed_date + self.future_release
    }

    fn record(&mut self, reason: Exclusion) {
        match reason {
            Exclusion::MissingDate => self.missing_date += 1,
            Exclusion::MalformedDate => self.malformed_date += 1,
            Exclusion::FutureRelease => self.future_release += 1,
        }
    }
}

/// Result of normalizing an observation set.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Usable observations in query order.
    pub timed: Vec<TimedObservation>,
    pub excluded: ExclusionCounts,
}

impl TimedObservation {
    /// Attach an elapsed time to one row, or say why it cannot have one.
    pub fn classify(
        id: ObservationId,
        votes: f64,
        release_date: Option<&str>,
        reference: NaiveDate,
        unit: TimeUnit,
    ) -> std::result::Result<Self, Exclusion> {
        let date = release_date.ok_or(Exclusion::MissingDate)?;
        let elapsed = elapsed(date, reference, unit).ok_or(Exclusion::MalformedDate)?;
        if elapsed < 0.0 {
            return Err(Exclusion::FutureRelease);
        }
        Ok(TimedObservation {
            id,
            votes,
            elapsed,
            release_date: date.to_string(),
        })
    }
}

/// Normalize every row of `set` against `reference`.
pub fn normalize(set: &ObservationSet, reference: NaiveDate, unit: TimeUnit) -> Normalized {
    let mut out = Normalized::default();
    for i in 0..set.len() {
        match TimedObservation::classify(
            set.ids[i],
            set.vote_counts[i],
            set.release_dates[i].as_deref(),
            reference,
            unit,
        ) {
            Ok(timed) => out.timed.push(timed),
            Err(reason) => {
                tracing::trace!(id = set.ids[i].0, ?reason, "observation excluded");
                out.excluded.record(reason);
            }
        }
    }
    out
}
