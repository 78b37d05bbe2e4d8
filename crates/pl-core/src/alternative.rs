//! Alternative tail families for model comparison.
//!
//! Both families live on `x >= xmin` so a fitted power law and its rival are
//! compared on the same support. Fitting uses only the observations at or
//! above the cutoff.

use crate::distribution::Univariate;
use crate::error::{PowerLawError, Result};
use pl_math::log_normal_sf;
use serde::{Deserialize, Serialize};

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Gradient-ascent controls for the truncated log-normal MLE.
const LOGNORMAL_MAX_ITERATIONS: usize = 2_000;
const LOGNORMAL_TOLERANCE: f64 = 1e-10;
const MAX_BACKTRACKS: usize = 60;

/// Which rival family to fit in [`crate::compare_with_alternative`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alternative {
    Exponential,
    LogNormal,
}

fn tail_of(data: &[f64], xmin: f64) -> Result<Vec<f64>> {
    if !xmin.is_finite() || xmin <= 0.0 {
        return Err(PowerLawError::invalid(format!(
            "xmin must be positive and finite, got {}",
            xmin
        )));
    }
    let tail: Vec<f64> = data.iter().copied().filter(|&x| x >= xmin).collect();
    if tail.is_empty() {
        return Err(PowerLawError::EmptyData {
            xmin,
            xmax: f64::INFINITY,
        });
    }
    if tail.iter().any(|x| !x.is_finite()) {
        return Err(PowerLawError::invalid("data contains non-finite values"));
    }
    Ok(tail)
}

/// Exponential shifted to start at `xmin`: `f(x) = λ e^{-λ (x - xmin)}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Exponential {
    rate: f64,
    xmin: f64,
}

impl Exponential {
    pub fn new(rate: f64, xmin: f64) -> Result<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PowerLawError::invalid(format!(
                "exponential rate must be positive, got {}",
                rate
            )));
        }
        if !xmin.is_finite() || xmin <= 0.0 {
            return Err(PowerLawError::invalid(format!(
                "xmin must be positive and finite, got {}",
                xmin
            )));
        }
        Ok(Self { rate, xmin })
    }

    /// MLE on the observations at or above `xmin`: `λ = 1 / mean(x - xmin)`.
    pub fn fit_tail(data: &[f64], xmin: f64) -> Result<Self> {
        let tail = tail_of(data, xmin)?;
        let excess = tail.iter().map(|&x| x - xmin).sum::<f64>() / tail.len() as f64;
        if excess <= 0.0 {
            return Err(PowerLawError::degenerate(format!(
                "all {} observations equal xmin={}",
                tail.len(),
                xmin
            )));
        }
        Self::new(1.0 / excess, xmin)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }
}

impl Univariate for Exponential {
    fn log_density(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x < self.xmin {
            return f64::NEG_INFINITY;
        }
        self.rate.ln() - self.rate * (x - self.xmin)
    }

    fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= self.xmin {
            return 0.0;
        }
        -(-self.rate * (x - self.xmin)).exp_m1()
    }

    fn cdf_below(&self, x: f64) -> f64 {
        self.cdf(x)
    }

    fn quantile(&self, p: f64) -> f64 {
        if p.is_nan() || !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        if p == 1.0 {
            return f64::INFINITY;
        }
        self.xmin - (-p).ln_1p() / self.rate
    }

    fn support_min(&self) -> f64 {
        self.xmin
    }
}

/// Log-normal truncated to `x >= xmin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogNormal {
    mu: f64,
    sigma: f64,
    xmin: f64,
    #[serde(skip)]
    log_mass: f64,
}

impl LogNormal {
    pub fn new(mu: f64, sigma: f64, xmin: f64) -> Result<Self> {
        if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
            return Err(PowerLawError::invalid(format!(
                "log-normal needs finite mu and positive sigma, got mu={}, sigma={}",
                mu, sigma
            )));
        }
        if !xmin.is_finite() || xmin <= 0.0 {
            return Err(PowerLawError::invalid(format!(
                "xmin must be positive and finite, got {}",
                xmin
            )));
        }
        let log_mass = log_normal_sf((xmin.ln() - mu) / sigma);
        if !log_mass.is_finite() {
            return Err(PowerLawError::invalid(format!(
                "no log-normal mass above xmin={} for mu={}, sigma={}",
                xmin, mu, sigma
            )));
        }
        Ok(Self {
            mu,
            sigma,
            xmin,
            log_mass,
        })
    }

    /// Truncated MLE on the observations at or above `xmin`.
    ///
    /// Starts from the untruncated moment estimates of `ln x` and climbs the
    /// truncated log-likelihood by projected gradient ascent with
    /// backtracking.
    pub fn fit_tail(data: &[f64], xmin: f64) -> Result<Self> {
        let tail = tail_of(data, xmin)?;
        let stats = LogStats::new(&tail, xmin.ln());
        if stats.n < 2.0 || stats.variance() <= 0.0 {
            return Err(PowerLawError::degenerate(format!(
                "log-normal needs at least two distinct values above xmin={}",
                xmin
            )));
        }

        let mut mu = stats.mean();
        let mut sigma = stats.variance().sqrt();
        let mut ll = stats.log_likelihood(mu, sigma);

        for iteration in 0..LOGNORMAL_MAX_ITERATIONS {
            let (g_mu, g_sigma) = stats.gradient(mu, sigma);
            let mut step = sigma;
            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let cand_mu = mu + step * g_mu;
                let cand_sigma = (sigma + step * g_sigma).max(sigma * 0.1);
                let cand_ll = stats.log_likelihood(cand_mu, cand_sigma);
                if cand_ll > ll {
                    accepted = Some((cand_mu, cand_sigma, cand_ll));
                    break;
                }
                step *= 0.5;
            }
            let Some((next_mu, next_sigma, next_ll)) = accepted else {
                return Self::new(mu, sigma, xmin);
            };
            let change = (next_mu - mu).abs() + (next_sigma - sigma).abs();
            mu = next_mu;
            sigma = next_sigma;
            ll = next_ll;
            if change < LOGNORMAL_TOLERANCE * (1.0 + mu.abs() + sigma) {
                tracing::trace!(
                    target: "pl_core::compare",
                    iterations = iteration + 1,
                    mu,
                    sigma,
                    "truncated log-normal fit converged"
                );
                return Self::new(mu, sigma, xmin);
            }
        }

        let (g_mu, g_sigma) = stats.gradient(mu, sigma);
        Err(PowerLawError::Convergence {
            iterations: LOGNORMAL_MAX_ITERATIONS,
            residual: g_mu.abs() + g_sigma.abs(),
        })
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    fn z(&self, x: f64) -> f64 {
        (x.ln() - self.mu) / self.sigma
    }
}

impl Univariate for LogNormal {
    fn log_density(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x < self.xmin {
            return f64::NEG_INFINITY;
        }
        let z = self.z(x);
        -x.ln() - self.sigma.ln() - LN_SQRT_2PI - 0.5 * z * z - self.log_mass
    }

    fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= self.xmin {
            return 0.0;
        }
        (1.0 - (log_normal_sf(self.z(x)) - self.log_mass).exp()).clamp(0.0, 1.0)
    }

    fn cdf_below(&self, x: f64) -> f64 {
        self.cdf(x)
    }

    fn quantile(&self, p: f64) -> f64 {
        if p.is_nan() || !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        if p == 0.0 {
            return self.xmin;
        }
        if p == 1.0 {
            return f64::INFINITY;
        }
        // Solve ln S(z) = ln(1 - p) + ln S(z_min) by bisection in z.
        let target = (-p).ln_1p() + self.log_mass;
        let mut lo = self.z(self.xmin);
        let mut hi = lo.max(0.0) + 1.0;
        while log_normal_sf(hi) > target {
            hi = 2.0 * hi + 1.0;
        }
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if log_normal_sf(mid) > target {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo <= 1e-14 * (1.0 + hi.abs()) {
                break;
            }
        }
        (self.mu + self.sigma * 0.5 * (lo + hi)).exp().max(self.xmin)
    }

    fn support_min(&self) -> f64 {
        self.xmin
    }
}

/// Sufficient statistics of `y = ln x` for the truncated log-normal likelihood.
struct LogStats {
    n: f64,
    sum: f64,
    sum_sq: f64,
    log_cut: f64,
}

impl LogStats {
    fn new(tail: &[f64], log_cut: f64) -> Self {
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for &x in tail {
            let y = x.ln();
            sum += y;
            sum_sq += y * y;
        }
        Self {
            n: tail.len() as f64,
            sum,
            sum_sq,
            log_cut,
        }
    }

    fn mean(&self) -> f64 {
        self.sum / self.n
    }

    fn variance(&self) -> f64 {
        let mean = self.mean();
        (self.sum_sq / self.n - mean * mean).max(0.0)
    }

    /// `Σ (y - μ)²`.
    fn squared_deviation(&self, mu: f64) -> f64 {
        (self.sum_sq - 2.0 * mu * self.sum + self.n * mu * mu).max(0.0)
    }

    /// Log-likelihood per observation, without the `-ln x` terms.
    fn log_likelihood(&self, mu: f64, sigma: f64) -> f64 {
        if sigma <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let z_cut = (self.log_cut - mu) / sigma;
        let ll = -sigma.ln()
            - self.squared_deviation(mu) / (2.0 * sigma * sigma * self.n)
            - log_normal_sf(z_cut);
        if ll.is_nan() {
            f64::NEG_INFINITY
        } else {
            ll
        }
    }

    /// Per-observation gradient in `(μ, σ)`.
    fn gradient(&self, mu: f64, sigma: f64) -> (f64, f64) {
        let z_cut = (self.log_cut - mu) / sigma;
        // Hazard φ(z) / S(z).
        let hazard = (-0.5 * z_cut * z_cut - LN_SQRT_2PI - log_normal_sf(z_cut)).exp();
        let mean_dev = self.sum / self.n - mu;
        let g_mu = mean_dev / (sigma * sigma) - hazard / sigma;
        let g_sigma = -1.0 / sigma + self.squared_deviation(mu) / (self.n * sigma.powi(3))
            - hazard * z_cut / sigma;
        (g_mu, g_sigma)
    }
}

/// A fitted rival family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum AlternativeFit {
    Exponential(Exponential),
    LogNormal(LogNormal),
}

impl AlternativeFit {
    pub fn fit(alternative: Alternative, data: &[f64], xmin: f64) -> Result<Self> {
        match alternative {
            Alternative::Exponential => Exponential::fit_tail(data, xmin).map(Self::Exponential),
            Alternative::LogNormal => LogNormal::fit_tail(data, xmin).map(Self::LogNormal),
        }
    }
}

impl Univariate for AlternativeFit {
    fn log_density(&self, x: f64) -> f64 {
        match self {
            Self::Exponential(d) => d.log_density(x),
            Self::LogNormal(d) => d.log_density(x),
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        match self {
            Self::Exponential(d) => d.cdf(x),
            Self::LogNormal(d) => d.cdf(x),
        }
    }

    fn cdf_below(&self, x: f64) -> f64 {
        match self {
            Self::Exponential(d) => d.cdf_below(x),
            Self::LogNormal(d) => d.cdf_below(x),
        }
    }

    fn quantile(&self, p: f64) -> f64 {
        match self {
            Self::Exponential(d) => d.quantile(p),
            Self::LogNormal(d) => d.quantile(p),
        }
    }

    fn support_min(&self) -> f64 {
        match self {
            Self::Exponential(d) => d.xmin(),
            Self::LogNormal(d) => d.xmin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn untruncated_lognormal_cdf(x: f64, mu: f64, sigma: f64) -> f64 {
        1.0 - pl_math::normal_sf((x.ln() - mu) / sigma)
    }

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn exponential_fit_recovers_rate() {
        let truth = Exponential::new(0.5, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let data: Vec<f64> = (0..20_000).map(|_| truth.sample(&mut rng)).collect();
        let fit = Exponential::fit_tail(&data, 2.0).unwrap();
        assert!(approx_eq(fit.rate(), 0.5, 0.02), "rate = {}", fit.rate());
    }

    #[test]
    fn exponential_quantile_inverts_cdf() {
        let d = Exponential::new(1.7, 3.0).unwrap();
        for p in [0.0, 0.2, 0.5, 0.99] {
            assert!(approx_eq(d.cdf(d.quantile(p)), p, 1e-12));
        }
        assert_eq!(d.log_density(2.9), f64::NEG_INFINITY);
    }

    #[test]
    fn exponential_degenerate_tail() {
        let err = Exponential::fit_tail(&[4.0, 4.0, 1.0], 4.0).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DegenerateData);
        let err = Exponential::fit_tail(&[1.0, 2.0], 5.0).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::EmptyData);
    }

    #[test]
    fn lognormal_without_truncation_matches_normal_cdf() {
        // A cutoff far below the bulk leaves the distribution untouched.
        let d = LogNormal::new(1.0, 0.5, 1e-6).unwrap();
        for x in [1.0, 2.7, 5.0, 20.0] {
            assert!(approx_eq(d.cdf(x), untruncated_lognormal_cdf(x, 1.0, 0.5), 1e-12));
        }
    }

    #[test]
    fn lognormal_truncated_density_integrates_to_one() {
        let d = LogNormal::new(0.0, 1.0, 2.0).unwrap();
        // Trapezoid in log space: ∫ f(x) dx = ∫ f(e^u) e^u du.
        let (a, b) = (2f64.ln(), 12.0);
        let steps = 40_000;
        let h = (b - a) / steps as f64;
        let g = |u: f64| d.density(u.exp()) * u.exp();
        let integral: f64 = (0..steps)
            .map(|i| {
                let u = a + i as f64 * h;
                0.5 * h * (g(u) + g(u + h))
            })
            .sum();
        assert!(approx_eq(integral, 1.0, 1e-6), "integral = {}", integral);
    }

    #[test]
    fn lognormal_quantile_inverts_cdf() {
        let d = LogNormal::new(0.5, 0.8, 1.5).unwrap();
        for p in [0.0, 0.1, 0.5, 0.9, 0.999] {
            let q = d.quantile(p);
            assert!(approx_eq(d.cdf(q), p, 1e-9), "p = {}, cdf(q) = {}", p, d.cdf(q));
        }
    }

    #[test]
    fn lognormal_fit_recovers_parameters() {
        let truth = LogNormal::new(2.0, 0.6, 3.0).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let data: Vec<f64> = (0..20_000).map(|_| truth.sample(&mut rng)).collect();
        let fit = LogNormal::fit_tail(&data, 3.0).unwrap();
        assert!(approx_eq(fit.mu(), 2.0, 0.05), "mu = {}", fit.mu());
        assert!(approx_eq(fit.sigma(), 0.6, 0.03), "sigma = {}", fit.sigma());
    }

    #[test]
    fn lognormal_rejects_constant_tail() {
        let err = LogNormal::fit_tail(&[7.0, 7.0, 7.0], 2.0).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::DegenerateData);
    }
}
