//! Standard normal tail probabilities.
//!
//! `erfc(x) = Q(1/2, x²)` for `x >= 0`, so the normal survival function
//! inherits the tail precision of the incomplete gamma continued fraction.

use super::gamma::{gamma_p, gamma_q};
use std::f64::consts::SQRT_2;

/// Error function.
pub fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.0;
    }
    let magnitude = gamma_p(0.5, x * x);
    if x < 0.0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Complementary error function.
pub fn erfc(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x < 0.0 {
        return 2.0 - gamma_q(0.5, x * x);
    }
    gamma_q(0.5, x * x)
}

/// Standard normal CDF Φ(z).
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    0.5 * erfc(-z / SQRT_2)
}

/// Standard normal survival function 1 - Φ(z).
pub fn normal_sf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    0.5 * erfc(z / SQRT_2)
}

/// Natural log of 1 - Φ(z), finite far beyond the point where Φ's tail underflows.
pub fn log_normal_sf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z < 30.0 {
        return normal_sf(z).ln();
    }
    // Mills-ratio expansion: 1 - Φ(z) = φ(z)/z · (1 - 1/z² + 3/z⁴ - 15/z⁶ + …)
    let z2 = z * z;
    let series = 1.0 - 1.0 / z2 + 3.0 / (z2 * z2) - 15.0 / (z2 * z2 * z2);
    -0.5 * z2 - z.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln() + series.ln()
}

/// Two-sided tail probability P(|Z| >= |z|).
pub fn normal_two_sided_p(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    (2.0 * normal_sf(z.abs())).min(1.0)
}
