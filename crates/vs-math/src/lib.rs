//! votescope math utilities.
//!
//! Log-domain primitives plus the two distributions the analysis commands
//! plot: the exponential density and the binomial mass function.

pub mod math;

pub use math::binomial::{binomial_log_pmf, binomial_pmf, BinomialParams, BinomialWindow, PROBABILITY_CLAMP};
pub use math::exponential::{exponential_pdf, linspace, sample_density, DensityCurve};
pub use math::stable::*;
pub use math::summary::{mean, median, ColumnSummary};
