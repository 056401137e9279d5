//! Binomial approximation of vote outcomes.
//!
//! The model treats every vote on an "average" movie as a Bernoulli trial:
//! - `n` = mean vote count (rounded half-to-even)
//! - `p` = mean vote average / 10
//!
//! The mass function is evaluated in the log domain so that trial counts in
//! the thousands never touch a raw factorial:
//!
//! `P(X=k) = exp(lgamma(n+1) - lgamma(k+1) - lgamma(n-k+1) + k·ln p + (n-k)·ln(1-p))`
//!
//! `p` is clamped into `[PROBABILITY_CLAMP, 1 - PROBABILITY_CLAMP]` before
//! taking logs, so `p = 0` and `p = 1` produce finite masses instead of NaN.

use serde::Serialize;

use super::stable::{log_binomial, log_sum_exp};

/// Clamp width applied to the success probability before taking logs.
pub const PROBABILITY_CLAMP: f64 = 1e-12;

/// Window half-width in standard deviations.
const WINDOW_SIGMAS: f64 = 3.0;

fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROBABILITY_CLAMP, 1.0 - PROBABILITY_CLAMP)
}

/// Log mass `ln P(X=k)` for `X ~ Binomial(n, p)`.
///
/// NEG_INFINITY when `k > n`, NaN when `p` is NaN.
pub fn binomial_log_pmf(n: u64, k: u64, p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if k > n {
        return f64::NEG_INFINITY;
    }
    let p = clamp_probability(p);
    log_binomial(n, k) + k as f64 * p.ln() + (n - k) as f64 * (1.0 - p).ln()
}

/// Mass `P(X=k)` for `X ~ Binomial(n, p)`.
pub fn binomial_pmf(n: u64, k: u64, p: f64) -> f64 {
    binomial_log_pmf(n, k, p).exp()
}

/// Inclusive range of outcome counts around the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BinomialWindow {
    pub lower_k: u64,
    pub upper_k: u64,
}

impl BinomialWindow {
    /// Outcome counts in ascending order.
    pub fn ks(&self) -> impl Iterator<Item = u64> {
        self.lower_k..=self.upper_k
    }

    /// Number of outcome counts in the window (always at least one).
    pub fn width(&self) -> u64 {
        self.upper_k - self.lower_k + 1
    }
}

/// Binomial parameters derived from an observation set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinomialParams {
    pub num_trials: u64,
    pub success_probability: f64,
}

impl BinomialParams {
    /// Build parameters directly.
    ///
    /// Returns None when `p` is outside `[0, 1]` or NaN.
    pub fn new(num_trials: u64, success_probability: f64) -> Option<Self> {
        if !(0.0..=1.0).contains(&success_probability) {
            return None;
        }
        Some(BinomialParams {
            num_trials,
            success_probability,
        })
    }

    /// Derive parameters from the mean vote count and mean vote average.
    ///
    /// `num_trials` rounds half-to-even; `success_probability` is the mean
    /// average on a 0-10 scale divided by 10. Returns None for a negative or
    /// non-finite count, or an average outside `[0, 10]`.
    pub fn from_means(mean_vote_count: f64, mean_vote_average: f64) -> Option<Self> {
        if !mean_vote_count.is_finite() || mean_vote_count < 0.0 {
            return None;
        }
        let num_trials = mean_vote_count.round_ties_even() as u64;
        Self::new(num_trials, mean_vote_average / 10.0)
    }

    pub fn expected_value(&self) -> f64 {
        self.num_trials as f64 * self.success_probability
    }

    pub fn variance(&self) -> f64 {
        let p = self.success_probability;
        self.num_trials as f64 * p * (1.0 - p)
    }

    pub fn std_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// The `E ± 3σ` window, truncated toward zero and clipped to `[0, n]`.
    pub fn window(&self) -> BinomialWindow {
        let e = self.expected_value();
        let s = self.std_deviation();
        let lower = ((e - WINDOW_SIGMAS * s).trunc() as i64).max(0) as u64;
        let upper = ((e + WINDOW_SIGMAS * s).trunc().max(0.0) as u64).min(self.num_trials);
        BinomialWindow {
            lower_k: lower.min(upper),
            upper_k: upper,
        }
    }

    pub fn pmf(&self, k: u64) -> f64 {
        binomial_pmf(self.num_trials, k, self.success_probability)
    }

    pub fn log_pmf(&self, k: u64) -> f64 {
        binomial_log_pmf(self.num_trials, k, self.success_probability)
    }

    /// `(k, P(X=k))` for every k in the window.
    pub fn table(&self) -> Vec<(u64, f64)> {
        self.window().ks().map(|k| (k, self.pmf(k))).collect()
    }

    /// Total probability mass covered by the window.
    pub fn window_mass(&self) -> f64 {
        let logs: Vec<f64> = self.window().ks().map(|k| self.log_pmf(k)).collect();
        log_sum_exp(&logs).exp()
    }
}
