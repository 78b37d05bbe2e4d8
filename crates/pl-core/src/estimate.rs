//! Maximum-likelihood exponent fit with KS-minimizing cutoff search.
//!
//! For every candidate cutoff the observations at or above it form the tail;
//! the exponent is fitted by MLE on that tail and the fit is scored by its
//! KS distance over `[xmin, xmax]`. The candidate with the smallest distance
//! wins, ties going to the smaller cutoff.
//!
//! # Exponent estimators
//!
//! - Continuous: closed form `α = 1 + n / Σ ln(x / xmin)`.
//! - Discrete: root of the score `-ζ'(α, xmin)/ζ(α, xmin) = mean(ln x)`,
//!   found by bisection on a bracket grown from the continuous
//!   approximation `1 + n / Σ ln(x / (xmin - ½))`.
//!
//! The data are sorted once. Each candidate's tail is a suffix located by
//! binary search and `Σ ln x` comes from suffix sums, so a candidate costs
//! one KS sweep over its tail.

use crate::config::{DiscreteSolverConfig, FitConfig};
use crate::distribution::{Family, PowerLaw};
use crate::error::{PowerLawError, Result};
use crate::ks::ks_distance_sorted;
use pl_math::hurwitz_zeta_log_derivative;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace};

/// Outcome of a cutoff search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub distribution: PowerLaw,
    /// KS distance of the fit over `[xmin, xmax]`.
    pub ks: f64,
    /// Observations at or above `xmin` used for the exponent.
    pub n_tail: usize,
}

impl FitResult {
    pub fn alpha(&self) -> f64 {
        self.distribution.alpha()
    }

    pub fn xmin(&self) -> f64 {
        self.distribution.xmin()
    }
}

/// Sorted distinct finite values of `data`.
pub fn unique_sorted(data: &[f64]) -> Vec<f64> {
    let mut values: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values
}

/// Candidate cutoffs used when none are given: the positive unique values.
pub(crate) fn default_candidates(data: &[f64]) -> Vec<f64> {
    let mut values = unique_sorted(data);
    values.retain(|&x| x > 0.0);
    values
}

/// Fit with default settings and the given KS upper bound.
///
/// `xmins` defaults to the positive unique values of `data`.
pub fn estimate_parameters(
    data: &[f64],
    family: Family,
    xmins: Option<&[f64]>,
    xmax: f64,
) -> Result<FitResult> {
    let config = FitConfig::default().with_xmax(xmax);
    estimate_parameters_with(data, family, xmins, &config)
}

/// Fit with explicit settings.
pub fn estimate_parameters_with(
    data: &[f64],
    family: Family,
    xmins: Option<&[f64]>,
    config: &FitConfig,
) -> Result<FitResult> {
    config.validate()?;
    let sorted = SortedSample::new(data)?;

    let candidates: Vec<f64> = match xmins {
        Some(xmins) => {
            if let Some(bad) = xmins.iter().find(|x| !x.is_finite() || **x <= 0.0) {
                return Err(PowerLawError::invalid(format!(
                    "candidate xmin must be positive and finite, got {}",
                    bad
                )));
            }
            xmins.to_vec()
        }
        None => default_candidates(data),
    };
    if candidates.is_empty() {
        return Err(PowerLawError::invalid("no candidate xmin values"));
    }

    debug!(
        target: "pl_core::estimate",
        %family,
        n = sorted.values.len(),
        candidates = candidates.len(),
        xmax = config.xmax,
        parallel = config.parallel,
        "searching xmin"
    );

    let outcomes: Vec<Result<Candidate>> = if config.parallel {
        candidates
            .par_iter()
            .map(|&xmin| sorted.evaluate(family, xmin, config))
            .collect()
    } else {
        candidates
            .iter()
            .map(|&xmin| sorted.evaluate(family, xmin, config))
            .collect()
    };

    let mut best: Option<FitResult> = None;
    let mut saw_degenerate = false;
    let mut steepest: Option<PowerLawError> = None;
    for outcome in outcomes {
        match outcome? {
            Candidate::Fit(fit) => {
                if best.as_ref().is_none_or(|current| prefer(&fit, current)) {
                    best = Some(fit);
                }
            }
            Candidate::Degenerate => saw_degenerate = true,
            Candidate::Steep(error) => steepest = Some(error),
            Candidate::Ineligible => {}
        }
    }

    match (best, steepest) {
        (Some(fit), _) => {
            debug!(
                target: "pl_core::estimate",
                alpha = fit.alpha(),
                xmin = fit.xmin(),
                ks = fit.ks,
                n_tail = fit.n_tail,
                "selected fit"
            );
            Ok(fit)
        }
        (None, Some(error)) => Err(error),
        (None, None) if saw_degenerate => Err(PowerLawError::degenerate(
            "every eligible tail sits entirely at its cutoff",
        )),
        (None, None) => Err(PowerLawError::invalid(format!(
            "no candidate xmin leaves at least {} observations",
            config.min_tail
        ))),
    }
}

/// Smaller KS wins; equal KS goes to the smaller cutoff.
fn prefer(candidate: &FitResult, incumbent: &FitResult) -> bool {
    candidate.ks < incumbent.ks
        || (candidate.ks == incumbent.ks && candidate.xmin() < incumbent.xmin())
}

impl PowerLaw {
    /// Plain MLE with `xmin = min(data)`, no cutoff search.
    pub fn fit_mle(family: Family, data: &[f64]) -> Result<FitResult> {
        let sorted = SortedSample::new(data)?;
        let xmin = match sorted.values.first() {
            Some(&x) if x > 0.0 => x,
            Some(&x) => {
                return Err(PowerLawError::invalid(format!(
                    "fit_mle needs positive data, smallest value is {}",
                    x
                )))
            }
            None => return Err(PowerLawError::invalid("empty dataset")),
        };
        let config = FitConfig::default().with_xmax(f64::INFINITY);
        match sorted.evaluate(family, xmin, &config)? {
            Candidate::Fit(fit) => Ok(fit),
            Candidate::Degenerate => Err(PowerLawError::degenerate(format!(
                "all observations equal {}",
                xmin
            ))),
            Candidate::Steep(error) => Err(error),
            Candidate::Ineligible => Err(PowerLawError::invalid(
                "fit_mle needs at least two observations",
            )),
        }
    }
}

enum Candidate {
    Fit(FitResult),
    /// Tail too small for a fit.
    Ineligible,
    /// Every tail point equals the cutoff.
    Degenerate,
    /// The exponent root lies above `alpha_max`.
    Steep(PowerLawError),
}

/// Ascending copy of the data with suffix sums of `ln x`.
struct SortedSample {
    values: Vec<f64>,
    /// `log_suffix[i] = Σ_{j >= i} ln values[j]`, over positive values only.
    log_suffix: Vec<f64>,
}

impl SortedSample {
    fn new(data: &[f64]) -> Result<Self> {
        if data.is_empty() {
            return Err(PowerLawError::invalid("empty dataset"));
        }
        if let Some(bad) = data.iter().find(|x| !x.is_finite()) {
            return Err(PowerLawError::invalid(format!(
                "data must be finite, found {}",
                bad
            )));
        }
        let mut values = data.to_vec();
        values.sort_by(f64::total_cmp);

        let mut log_suffix = vec![0.0; values.len() + 1];
        for i in (0..values.len()).rev() {
            let ln_x = if values[i] > 0.0 { values[i].ln() } else { 0.0 };
            log_suffix[i] = log_suffix[i + 1] + ln_x;
        }
        Ok(Self { values, log_suffix })
    }

    fn evaluate(&self, family: Family, xmin: f64, config: &FitConfig) -> Result<Candidate> {
        let start = self.values.partition_point(|&x| x < xmin);
        let n_tail = self.values.len() - start;
        if n_tail < config.min_tail {
            trace!(target: "pl_core::estimate", xmin, n_tail, "skipping candidate: tail too small");
            return Ok(Candidate::Ineligible);
        }
        // Every tail point sits at the cutoff: Σ ln(x / xmin) = 0.
        if self.values[self.values.len() - 1] <= xmin {
            trace!(target: "pl_core::estimate", xmin, n_tail, "skipping candidate: tail equals xmin");
            return Ok(Candidate::Degenerate);
        }
        let end = self.values.partition_point(|&x| x <= config.xmax);
        if end <= start {
            trace!(target: "pl_core::estimate", xmin, "skipping candidate: tail lies above xmax");
            return Ok(Candidate::Ineligible);
        }

        let sum_ln = self.log_suffix[start];
        let n = n_tail as f64;
        let alpha = match family {
            Family::Continuous => {
                let sum_excess = sum_ln - n * xmin.ln();
                if sum_excess <= 0.0 {
                    return Ok(Candidate::Degenerate);
                }
                1.0 + n / sum_excess
            }
            Family::Discrete => match discrete_alpha(xmin, sum_ln / n, &config.discrete)? {
                Root::Found(alpha) => alpha,
                Root::AboveCeiling { iterations, score } => {
                    trace!(
                        target: "pl_core::estimate",
                        xmin,
                        score,
                        "skipping candidate: exponent above alpha_max"
                    );
                    return Ok(Candidate::Steep(PowerLawError::Convergence {
                        iterations,
                        residual: score,
                    }));
                }
            },
        };

        let distribution = PowerLaw::new(family, alpha, xmin)?;
        let ks = ks_distance_sorted(&self.values[start..end], &distribution);
        trace!(target: "pl_core::estimate", xmin, alpha, ks, n_tail, "candidate fitted");
        Ok(Candidate::Fit(FitResult {
            distribution,
            ks,
            n_tail,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Root {
    Found(f64),
    /// The score is still positive at `alpha_max`.
    AboveCeiling { iterations: usize, score: f64 },
}

/// Discrete exponent MLE for a tail with the given mean of `ln x`.
///
/// The score `-ζ'/ζ(α, xmin) - mean_ln` falls strictly from `+inf` at
/// `α -> 1` to `ln xmin - mean_ln < 0`, so a bracket always exists unless the
/// root lies beyond `alpha_max`. That case is reported as
/// [`Root::AboveCeiling`] rather than an error: a tail of a few large,
/// adjacent counts has a legitimately huge exponent.
pub(crate) fn discrete_alpha(
    xmin: f64,
    mean_ln: f64,
    solver: &DiscreteSolverConfig,
) -> Result<Root> {
    let score = |alpha: f64| -hurwitz_zeta_log_derivative(alpha, xmin) - mean_ln;
    let lower_limit = 1.0 + 1e-9;

    let shifted = if xmin > 0.5 { xmin - 0.5 } else { xmin };
    let start = (1.0 + 1.0 / (mean_ln - shifted.ln())).clamp(lower_limit, solver.alpha_max);

    let mut iterations = 0usize;
    let check = |value: f64, iterations: usize, width: f64| -> Result<f64> {
        if value.is_nan() {
            return Err(PowerLawError::Convergence {
                iterations,
                residual: width,
            });
        }
        Ok(value)
    };

    let s0 = check(score(start), 0, f64::INFINITY)?;
    if s0 == 0.0 {
        return Ok(Root::Found(start));
    }

    // Grow a bracket [lo, hi] with score(lo) > 0 > score(hi).
    let (mut lo, mut hi);
    if s0 > 0.0 {
        lo = start;
        let mut step = (start - 1.0).max(0.5);
        loop {
            iterations += 1;
            let probe = (lo + step).min(solver.alpha_max);
            let s = check(score(probe), iterations, step)?;
            if s <= 0.0 {
                hi = probe;
                break;
            }
            lo = probe;
            if probe >= solver.alpha_max {
                return Ok(Root::AboveCeiling { iterations, score: s });
            }
            if iterations >= solver.max_iterations {
                return Err(PowerLawError::Convergence {
                    iterations,
                    residual: s,
                });
            }
            step *= 2.0;
        }
    } else {
        hi = start;
        loop {
            iterations += 1;
            let probe = (1.0 + (hi - 1.0) / 2.0).max(lower_limit);
            let s = check(score(probe), iterations, hi - probe)?;
            if s > 0.0 {
                lo = probe;
                break;
            }
            hi = probe;
            if probe <= lower_limit || iterations >= solver.max_iterations {
                return Err(PowerLawError::Convergence {
                    iterations,
                    residual: s,
                });
            }
        }
    }

    while hi - lo > solver.tolerance {
        if iterations >= solver.max_iterations {
            return Err(PowerLawError::Convergence {
                iterations,
                residual: hi - lo,
            });
        }
        iterations += 1;
        let mid = 0.5 * (lo + hi);
        let s = check(score(mid), iterations, hi - lo)?;
        if s > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(Root::Found(0.5 * (lo + hi)))
}
