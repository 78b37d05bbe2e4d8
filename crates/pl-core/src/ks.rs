//! Kolmogorov–Smirnov distance between a dataset and a fitted distribution.
//!
//! Both CDFs are compared as left limits `F(x⁻) = P(X < x)` at every distinct
//! observed value. For continuous laws this is the usual CDF; for discrete
//! laws it keeps a sample sitting entirely on one lattice point at distance
//! zero from a law starting at that point.

use crate::distribution::Univariate;
use crate::error::{PowerLawError, Result};

/// KS distance of `data` restricted to `[xmin, xmax]` against `dist`.
///
/// The result lies in `[0, 1]` and does not depend on the input order.
pub fn ks_test<D: Univariate + ?Sized>(data: &[f64], dist: &D, xmin: f64, xmax: f64) -> Result<f64> {
    if xmin.is_nan() || xmin <= 0.0 {
        return Err(PowerLawError::invalid(format!(
            "xmin must be positive, got {}",
            xmin
        )));
    }
    if xmax.is_nan() {
        return Err(PowerLawError::invalid("xmax must not be NaN"));
    }

    let mut window: Vec<f64> = data
        .iter()
        .copied()
        .filter(|&x| x >= xmin && x <= xmax)
        .collect();
    if window.is_empty() {
        return Err(PowerLawError::EmptyData { xmin, xmax });
    }
    window.sort_by(f64::total_cmp);
    Ok(ks_distance_sorted(&window, dist))
}

/// KS kernel over an ascending, non-empty slice.
pub fn ks_distance_sorted<D: Univariate + ?Sized>(sorted: &[f64], dist: &D) -> f64 {
    let n = sorted.len() as f64;
    let mut max_gap = 0.0f64;
    let mut i = 0;
    while i < sorted.len() {
        let x = sorted[i];
        // i points lie strictly below x.
        let empirical = i as f64 / n;
        let gap = (empirical - dist.cdf_below(x)).abs();
        max_gap = max_gap.max(gap);
        while i < sorted.len() && sorted[i] == x {
            i += 1;
        }
    }
    max_gap.clamp(0.0, 1.0)
}
