//! Binomial tail probabilities for sign-count tests.
//!
//! Tails are accumulated in the log domain from exact log-pmf terms, so the
//! result stays accurate for counts in the tens of thousands where the
//! individual probabilities underflow.

use super::stable::{log_binomial, log_sum_exp};

/// log P(X = k) for X ~ Binomial(n, p).
pub fn log_pmf(k: u64, n: u64, p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if k > n {
        return f64::NEG_INFINITY;
    }
    // Degenerate success probabilities put all mass on one end.
    if p == 0.0 {
        return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
    }
    if p == 1.0 {
        return if k == n { 0.0 } else { f64::NEG_INFINITY };
    }
    log_binomial(n, k) + k as f64 * p.ln() + (n - k) as f64 * (-p).ln_1p()
}

/// P(X <= k).
pub fn cdf(k: u64, n: u64, p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if k >= n {
        return 1.0;
    }
    let terms: Vec<f64> = (0..=k).map(|i| log_pmf(i, n, p)).collect();
    log_sum_exp(&terms).exp().clamp(0.0, 1.0)
}

/// P(X >= k).
pub fn sf(k: u64, n: u64, p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if k == 0 {
        return 1.0;
    }
    if k > n {
        return 0.0;
    }
    let terms: Vec<f64> = (k..=n).map(|i| log_pmf(i, n, p)).collect();
    log_sum_exp(&terms).exp().clamp(0.0, 1.0)
}

/// Two-sided sign-test p-value for `k` successes out of `n` fair trials.
///
/// Doubles the smaller tail and caps at 1. Under a fair coin the smaller
/// tail is always the lower tail at `min(k, n - k)`, so `k` and `n - k`
/// give bit-identical results.
pub fn sign_test_p(k: u64, n: u64) -> f64 {
    if n == 0 {
        return 1.0;
    }
    if k > n {
        return f64::NAN;
    }
    let smaller = k.min(n - k);
    (2.0 * cdf(smaller, n, 0.5)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn pmf_sums_to_one() {
        let n = 17;
        let total: f64 = (0..=n).map(|k| log_pmf(k, n, 0.3).exp()).sum();
        assert!(approx_eq(total, 1.0, 1e-12), "sum = {}", total);
    }

    #[test]
    fn fair_coin_golden_values() {
        // P(X <= 2 | n = 10) = (1 + 10 + 45) / 1024
        assert!(approx_eq(cdf(2, 10, 0.5), 56.0 / 1024.0, 1e-12));
        // P(X >= 8 | n = 10) = (45 + 10 + 1) / 1024
        assert!(approx_eq(sf(8, 10, 0.5), 56.0 / 1024.0, 1e-12));
    }

    #[test]
    fn cdf_and_sf_overlap_at_k() {
        let (k, n, p) = (4, 12, 0.4);
        let total = cdf(k, n, p) + sf(k, n, p) - log_pmf(k, n, p).exp();
        assert!(approx_eq(total, 1.0, 1e-12));
    }

    #[test]
    fn sign_test_symmetry() {
        for n in [1u64, 5, 10, 31] {
            for k in 0..=n {
                assert_eq!(sign_test_p(k, n), sign_test_p(n - k, n));
            }
        }
    }

    #[test]
    fn sign_test_known_values() {
        // Two-sided exact test for 9 of 10.
        assert!(approx_eq(sign_test_p(9, 10), 2.0 * 11.0 / 1024.0, 1e-12));
        assert!(approx_eq(sign_test_p(5, 10), 1.0, 1e-15));
        assert_eq!(sign_test_p(0, 0), 1.0);
        // Doubling the lower tail matches doubling the smaller explicit tail.
        let explicit = 2.0 * cdf(3, 20, 0.5).min(sf(3, 20, 0.5));
        assert!(approx_eq(sign_test_p(3, 20), explicit, 1e-15));
    }

    #[test]
    fn degenerate_probabilities() {
        assert_eq!(log_pmf(0, 5, 0.0), 0.0);
        assert_eq!(log_pmf(5, 5, 1.0), 0.0);
        assert_eq!(log_pmf(2, 5, 1.0), f64::NEG_INFINITY);
        assert!(cdf(1, 5, 1.5).is_nan());
    }
}
