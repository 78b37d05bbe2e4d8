//! Discrete and continuous power-law distributions.
//!
//! # Parameterization
//!
//! Both families take an exponent `α > 1` and a lower cutoff `θ = xmin > 0`.
//!
//! - Continuous: `f(x) = (α-1)/θ · (x/θ)^-α` for `x >= θ`
//! - Discrete: `p(x) = x^-α / ζ(α, θ)` on `θ, θ+1, θ+2, …`
//!
//! where `ζ` is the Hurwitz zeta function. The discrete normalizer is computed
//! once at construction and cached in log form.
//!
//! All estimators and tests in this crate go through the [`Univariate`]
//! capability trait, so they never match on the family themselves.

use crate::error::{PowerLawError, Result};
use pl_math::log_hurwitz_zeta;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest integer offset the discrete quantile search walks before falling
/// back to the continuous approximation (2^53, the end of exact integers).
const MAX_EXACT_OFFSET: f64 = 9_007_199_254_740_992.0;

/// Tolerance for deciding that a value sits on the discrete lattice.
const LATTICE_EPS: f64 = 1e-9;

/// Capability set shared by every fitted distribution.
pub trait Univariate {
    /// Log density (continuous) or log mass (discrete); `-inf` off the support.
    fn log_density(&self, x: f64) -> f64;

    /// `P(X <= x)`.
    fn cdf(&self, x: f64) -> f64;

    /// `P(X < x)`, the left limit of the CDF.
    fn cdf_below(&self, x: f64) -> f64;

    /// Smallest support value whose CDF reaches `p`.
    fn quantile(&self, p: f64) -> f64;

    /// Lower end of the support.
    fn support_min(&self) -> f64;

    fn density(&self, x: f64) -> f64 {
        let log_d = self.log_density(x);
        if log_d == f64::NEG_INFINITY {
            0.0
        } else {
            log_d.exp()
        }
    }

    /// Inverse-transform draw. Values are clamped to the finite range.
    fn sample<R: Rng>(&self, rng: &mut R) -> f64
    where
        Self: Sized,
    {
        self.quantile(rng.random::<f64>()).min(f64::MAX)
    }

    fn log_likelihood(&self, data: &[f64]) -> f64 {
        data.iter().map(|&x| self.log_density(x)).sum()
    }
}

/// Power-law family tag, used to request a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Discrete,
    Continuous,
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::Discrete => write!(f, "discrete"),
            Family::Continuous => write!(f, "continuous"),
        }
    }
}

fn validate_parameters(alpha: f64, xmin: f64) -> Result<()> {
    if !xmin.is_finite() || xmin <= 0.0 {
        return Err(PowerLawError::invalid(format!(
            "xmin must be positive and finite, got {}",
            xmin
        )));
    }
    if !alpha.is_finite() || alpha <= 1.0 {
        return Err(PowerLawError::invalid(format!(
            "alpha must be finite and > 1, got {}",
            alpha
        )));
    }
    Ok(())
}

/// Continuous power law (Pareto type I with shape `α - 1`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContinuousPowerLaw {
    alpha: f64,
    xmin: f64,
}

impl ContinuousPowerLaw {
    pub fn new(alpha: f64, xmin: f64) -> Result<Self> {
        validate_parameters(alpha, xmin)?;
        Ok(Self { alpha, xmin })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    /// `P(X > x)`.
    pub fn ccdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x <= self.xmin {
            return 1.0;
        }
        (x / self.xmin).powf(1.0 - self.alpha)
    }

    /// `+inf` when `α <= 2`.
    pub fn mean(&self) -> f64 {
        if self.alpha <= 2.0 {
            return f64::INFINITY;
        }
        self.xmin * (self.alpha - 1.0) / (self.alpha - 2.0)
    }

    /// `+inf` when `α <= 3`.
    pub fn variance(&self) -> f64 {
        if self.alpha <= 3.0 {
            return f64::INFINITY;
        }
        let a = self.alpha;
        self.xmin * self.xmin * (a - 1.0) / ((a - 3.0) * (a - 2.0) * (a - 2.0))
    }

    pub fn median(&self) -> f64 {
        self.xmin * 2f64.powf(1.0 / (self.alpha - 1.0))
    }

    pub fn mode(&self) -> f64 {
        self.xmin
    }
}

impl Univariate for ContinuousPowerLaw {
    fn log_density(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x < self.xmin {
            return f64::NEG_INFINITY;
        }
        (self.alpha - 1.0).ln() - self.xmin.ln() - self.alpha * (x / self.xmin).ln()
    }

    fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        1.0 - self.ccdf(x)
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
        self.xmin * (1.0 - p).powf(-1.0 / (self.alpha - 1.0))
    }

    fn support_min(&self) -> f64 {
        self.xmin
    }
}

/// Discrete power law on the lattice `xmin, xmin + 1, …`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscretePowerLaw {
    alpha: f64,
    xmin: f64,
    #[serde(skip)]
    log_norm: f64,
}

impl DiscretePowerLaw {
    pub fn new(alpha: f64, xmin: f64) -> Result<Self> {
        validate_parameters(alpha, xmin)?;
        let log_norm = log_hurwitz_zeta(alpha, xmin);
        if !log_norm.is_finite() {
            return Err(PowerLawError::invalid(format!(
                "zeta normalizer is not finite for alpha={}, xmin={}",
                alpha, xmin
            )));
        }
        Ok(Self {
            alpha,
            xmin,
            log_norm,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    /// `P(X >= xmin + k)`.
    fn tail_from_offset(&self, k: f64) -> f64 {
        if k <= 0.0 {
            return 1.0;
        }
        (log_hurwitz_zeta(self.alpha, self.xmin + k) - self.log_norm)
            .exp()
            .clamp(0.0, 1.0)
    }

    /// `P(X >= x)`.
    pub fn ccdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        // Number of lattice points strictly below x.
        let k = (x - self.xmin - LATTICE_EPS).ceil().max(0.0);
        self.tail_from_offset(k)
    }

    /// `ζ(α-1, θ) / ζ(α, θ)`, `+inf` when `α <= 2`.
    pub fn mean(&self) -> f64 {
        if self.alpha <= 2.0 {
            return f64::INFINITY;
        }
        (log_hurwitz_zeta(self.alpha - 1.0, self.xmin) - self.log_norm).exp()
    }

    /// `+inf` when `α <= 3`.
    pub fn variance(&self) -> f64 {
        if self.alpha <= 3.0 {
            return f64::INFINITY;
        }
        let second = (log_hurwitz_zeta(self.alpha - 2.0, self.xmin) - self.log_norm).exp();
        let mean = self.mean();
        (second - mean * mean).max(0.0)
    }

    pub fn median(&self) -> f64 {
        self.quantile(0.5)
    }

    pub fn mode(&self) -> f64 {
        self.xmin
    }
}

impl Univariate for DiscretePowerLaw {
    fn log_density(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x < self.xmin - LATTICE_EPS {
            return f64::NEG_INFINITY;
        }
        let offset = x - self.xmin;
        if (offset - offset.round()).abs() > LATTICE_EPS {
            return f64::NEG_INFINITY;
        }
        -self.alpha * x.ln() - self.log_norm
    }

    fn cdf(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x < self.xmin - LATTICE_EPS {
            return 0.0;
        }
        // Lattice points at or below x.
        let k = (x - self.xmin + LATTICE_EPS).floor() + 1.0;
        1.0 - self.tail_from_offset(k)
    }

    fn cdf_below(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        1.0 - self.ccdf(x)
    }

    fn quantile(&self, p: f64) -> f64 {
        if p.is_nan() || !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        if p == 1.0 {
            return f64::INFINITY;
        }
        let target = 1.0 - p;
        // cdf(xmin + k) >= p  <=>  P(X >= xmin + k + 1) <= 1 - p
        let reaches = |k: f64| self.tail_from_offset(k + 1.0) <= target;

        let approx = (self.xmin - 0.5).max(0.0) * target.powf(-1.0 / (self.alpha - 1.0)) + 0.5;
        let guess = (approx - self.xmin).floor().clamp(0.0, MAX_EXACT_OFFSET);

        let (mut lo, mut hi);
        if reaches(guess) {
            hi = guess;
            lo = 0.0;
            let mut step = 1.0;
            while hi > 0.0 {
                let probe = (hi - step).max(0.0);
                if !reaches(probe) {
                    lo = probe + 1.0;
                    break;
                }
                hi = probe;
                step *= 2.0;
            }
        } else {
            lo = guess + 1.0;
            hi = lo;
            let mut step = 1.0;
            while !reaches(hi) {
                lo = hi + 1.0;
                hi += step;
                step *= 2.0;
                if hi > MAX_EXACT_OFFSET {
                    // Beyond exact integers the lattice is indistinguishable
                    // from the continuous approximation.
                    return approx.round().max(self.xmin);
                }
            }
        }

        while lo < hi {
            let mid = (lo + ((hi - lo) / 2.0).floor()).min(hi);
            if reaches(mid) {
                hi = mid;
            } else {
                lo = mid + 1.0;
            }
        }
        self.xmin + lo
    }

    fn support_min(&self) -> f64 {
        self.xmin
    }

    fn log_likelihood(&self, data: &[f64]) -> f64 {
        data.iter().map(|&x| self.log_density(x)).sum()
    }
}

/// A power law of either family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum PowerLaw {
    Discrete(DiscretePowerLaw),
    Continuous(ContinuousPowerLaw),
}

impl PowerLaw {
    pub fn new(family: Family, alpha: f64, xmin: f64) -> Result<Self> {
        match family {
            Family::Discrete => Self::discrete(alpha, xmin),
            Family::Continuous => Self::continuous(alpha, xmin),
        }
    }

    pub fn discrete(alpha: f64, xmin: f64) -> Result<Self> {
        DiscretePowerLaw::new(alpha, xmin).map(PowerLaw::Discrete)
    }

    pub fn continuous(alpha: f64, xmin: f64) -> Result<Self> {
        ContinuousPowerLaw::new(alpha, xmin).map(PowerLaw::Continuous)
    }

    pub fn family(&self) -> Family {
        match self {
            PowerLaw::Discrete(_) => Family::Discrete,
            PowerLaw::Continuous(_) => Family::Continuous,
        }
    }

    pub fn alpha(&self) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.alpha(),
            PowerLaw::Continuous(c) => c.alpha(),
        }
    }

    pub fn xmin(&self) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.xmin(),
            PowerLaw::Continuous(c) => c.xmin(),
        }
    }

    /// Survival function: `P(X >= x)` for discrete, `P(X > x)` for continuous.
    pub fn ccdf(&self, x: f64) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.ccdf(x),
            PowerLaw::Continuous(c) => c.ccdf(x),
        }
    }

    pub fn mean(&self) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.mean(),
            PowerLaw::Continuous(c) => c.mean(),
        }
    }

    pub fn variance(&self) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.variance(),
            PowerLaw::Continuous(c) => c.variance(),
        }
    }

    pub fn median(&self) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.median(),
            PowerLaw::Continuous(c) => c.median(),
        }
    }

    pub fn mode(&self) -> f64 {
        self.xmin()
    }
}

impl Univariate for PowerLaw {
    fn log_density(&self, x: f64) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.log_density(x),
            PowerLaw::Continuous(c) => c.log_density(x),
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.cdf(x),
            PowerLaw::Continuous(c) => c.cdf(x),
        }
    }

    fn cdf_below(&self, x: f64) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.cdf_below(x),
            PowerLaw::Continuous(c) => c.cdf_below(x),
        }
    }

    fn quantile(&self, p: f64) -> f64 {
        match self {
            PowerLaw::Discrete(d) => d.quantile(p),
            PowerLaw::Continuous(c) => c.quantile(p),
        }
    }

    fn support_min(&self) -> f64 {
        self.xmin()
    }
}
