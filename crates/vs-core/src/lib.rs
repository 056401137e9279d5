//! votescope core library.
//!
//! Voting-activity models over a SQLite movies dataset: an exponential rate
//! of votes since release (aggregate and per record) and a binomial
//! approximation of vote counts, with figures and reports.

pub mod config;
pub mod dataset;
pub mod evaluate;
pub mod exit_codes;
pub mod logging;
pub mod pipeline;
pub mod rate;
pub mod render;
pub mod report;
pub mod stats;
pub mod timeline;

pub use exit_codes::ExitCode;
