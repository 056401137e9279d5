//! Exponential distribution density.
//!
//! Uses rate parameterization: `f(t) = λ · e^(-λt)` for `t >= 0`.
//! The rate λ is votes accrued per unit of elapsed time.

use serde::Serialize;

/// Exponential density at `t`.
///
/// Returns NaN for NaN inputs or a non-positive rate and 0 for `t < 0`.
pub fn exponential_pdf(rate: f64, t: f64) -> f64 {
    if rate.is_nan() || t.is_nan() || rate <= 0.0 {
        return f64::NAN;
    }
    if t < 0.0 {
        return 0.0;
    }
    rate * (-rate * t).exp()
}

/// `n` evenly spaced values over `[start, end]`, both ends included.
///
/// `n == 1` yields `[start]`; `n == 0` yields an empty vector. The last
/// element is exactly `end`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Elementwise density over an axis.
pub fn sample_density(rate: f64, axis: &[f64]) -> Vec<f64> {
    axis.iter().map(|&t| exponential_pdf(rate, t)).collect()
}

/// A density curve sampled over a time axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    /// Rate parameter λ.
    pub rate: f64,
    /// Sampled elapsed times.
    pub t: Vec<f64>,
    /// `f(t)` for each sampled time.
    pub density: Vec<f64>,
}

impl DensityCurve {
    /// Evaluate `f(t)` over `axis`.
    pub fn evaluate(rate: f64, axis: Vec<f64>) -> Self {
        let density = sample_density(rate, &axis);
        DensityCurve {
            rate,
            t: axis,
            density,
        }
    }

    /// Density at a single point on the same curve.
    pub fn at(&self, t: f64) -> f64 {
        exponential_pdf(self.rate, t)
    }

    /// `(t, f(t))` pairs in axis order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.t.iter().copied().zip(self.density.iter().copied())
    }
}
