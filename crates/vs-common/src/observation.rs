//! Observation records.
//!
//! An observation is one row of the movies table: vote count, vote average
//! and the textual release date. Rows are immutable once fetched and live for
//! a single command run.

use serde::{Deserialize, Serialize};

/// Identity of an observation: the SQLite `rowid` of its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationId(pub i64);

impl std::fmt::Display for ObservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: ObservationId,
    /// Number of votes, non-negative.
    pub vote_count: f64,
    /// Mean rating on a 0-10 scale.
    pub vote_average: f64,
    /// Release date as stored (`YYYY-MM-DD` when well-formed).
    pub release_date: Option<String>,
}

impl Observation {
    pub fn new(
        id: i64,
        vote_count: f64,
        vote_average: f64,
        release_date: Option<impl Into<String>>,
    ) -> Self {
        Observation {
            id: ObservationId(id),
            vote_count,
            vote_average,
            release_date: release_date.map(Into::into),
        }
    }
}

/// Query result as parallel columns in row order.
///
/// All four vectors always have the same length; index `i` in each belongs
/// to the same row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSet {
    pub ids: Vec<ObservationId>,
    pub vote_counts: Vec<f64>,
    pub vote_averages: Vec<f64>,
    pub release_dates: Vec<Option<String>>,
}

impl ObservationSet {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Append one row to every column.
    pub fn push(&mut self, observation: Observation) {
        self.ids.push(observation.id);
        self.vote_counts.push(observation.vote_count);
        self.vote_averages.push(observation.vote_average);
        self.release_dates.push(observation.release_date);
    }
}

impl FromIterator<Observation> for ObservationSet {
    fn from_iter<T: IntoIterator<Item = Observation>>(iter: T) -> Self {
        let mut set = ObservationSet::default();
        for observation in iter {
            set.push(observation);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_stay_parallel() {
        let set: ObservationSet = vec![
            Observation::new(1, 100.0, 7.5, Some("2024-01-01")),
            Observation::new(2, 50.0, 6.0, None::<String>),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.vote_counts, vec![100.0, 50.0]);
        assert_eq!(set.release_dates[1], None);
        assert_eq!(set.ids, vec![ObservationId(1), ObservationId(2)]);
        assert_eq!(set.release_dates[0].as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn id_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&ObservationId(42)).unwrap(), "42");
        assert_eq!(ObservationId(42).to_string(), "#42");
    }
}
