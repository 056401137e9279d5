//! Read-only access to the movies database.
//!
//! The dataset is a SQLite file with one row per movie. Every numeric column
//! may be stored as text, so queries cast on the SQL side. Nothing here ever
//! writes to the file.

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use vs_common::{Error, Observation, ObservationSet, Result};

use crate::config::validation::is_plain_identifier;

/// An open, read-only dataset.
///
/// The connection closes when the value is dropped, on every exit path.
pub struct Dataset {
    conn: Connection,
    path: PathBuf,
    table: String,
}

/// Columns used by the `stats` command, each filtered for NULL on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryColumns {
    pub popularity: Vec<f64>,
    pub vote_count: Vec<f64>,
    pub vote_average: Vec<f64>,
    pub release_dates: Vec<String>,
}

impl Dataset {
    /// Open `path` read-only and check that `table` exists.
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        if !is_plain_identifier(table) {
            return Err(Error::InvalidTable {
                name: table.to_string(),
            });
        }
        if !path.exists() {
            return Err(Error::DatasetNotFound {
                path: path.display().to_string(),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| open_error(path, e))?;

        // Opening is lazy; the first read tells whether this is a database.
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| open_error(path, e))?;
        if found.is_none() {
            return Err(Error::Query(format!(
                "table '{}' does not exist in {}",
                table,
                path.display()
            )));
        }

        Ok(Dataset {
            conn,
            path: path.to_path_buf(),
            table: table.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Rows with a vote count and vote average, in rowid order.
    ///
    /// With `require_release_date`, rows without a release date are dropped
    /// by the query as well.
    pub fn observations(&self, require_release_date: bool) -> Result<ObservationSet> {
        let mut sql = format!(
            "SELECT rowid, CAST(vote_count AS REAL), CAST(vote_average AS REAL), \
             CAST(release_date AS TEXT) FROM {} \
             WHERE vote_count IS NOT NULL AND vote_average IS NOT NULL",
            self.table
        );
        if require_release_date {
            sql.push_str(" AND release_date IS NOT NULL");
        }
        sql.push_str(" ORDER BY rowid");

        let mut stmt = self.conn.prepare(&sql).map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Observation::new(
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })
            .map_err(query_error)?;

        rows.collect::<rusqlite::Result<ObservationSet>>()
            .map_err(query_error)
    }

    /// Popularity, vote count, vote average and release date columns.
    pub fn summary_columns(&self) -> Result<SummaryColumns> {
        let sql = format!(
            "SELECT CAST(popularity AS REAL), CAST(vote_count AS REAL), \
             CAST(vote_average AS REAL), CAST(release_date AS TEXT) FROM {} ORDER BY rowid",
            self.table
        );

        let mut stmt = self.conn.prepare(&sql).map_err(query_error)?;
        let mut rows = stmt.query([]).map_err(query_error)?;
        let mut columns = SummaryColumns::default();
        while let Some(row) = rows.next().map_err(query_error)? {
            if let Some(v) = row.get::<_, Option<f64>>(0).map_err(query_error)? {
                columns.popularity.push(v);
            }
            if let Some(v) = row.get::<_, Option<f64>>(1).map_err(query_error)? {
                columns.vote_count.push(v);
            }
            if let Some(v) = row.get::<_, Option<f64>>(2).map_err(query_error)? {
                columns.vote_average.push(v);
            }
            if let Some(v) = row.get::<_, Option<String>>(3).map_err(query_error)? {
                columns.release_dates.push(v);
            }
        }
        Ok(columns)
    }
}

fn open_error(path: &Path, err: rusqlite::Error) -> Error {
    Error::DatasetOpen {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn query_error(err: rusqlite::Error) -> Error {
    Error::Query(err.to_string())
}
