//! Semi-parametric bootstrap for power-law goodness of fit.
//!
//! Each simulation builds a synthetic dataset as large as the input: with
//! probability equal to the observed tail fraction a draw comes from the
//! reference power law, otherwise it is resampled uniformly from the
//! observations below the reference cutoff. The full cutoff search is then
//! re-run on the synthetic data.
//!
//! Simulation `i` owns a generator seeded with `substream_seed(seed, i)`, so
//! results depend only on `(data, reference, config)` and not on scheduling.

use crate::config::{BootstrapConfig, FailurePolicy};
use crate::distribution::{PowerLaw, Univariate};
use crate::error::{PowerLawError, Result};
use crate::estimate::{default_candidates, estimate_parameters_with, FitResult};
use crate::ks::ks_test;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

/// Fits from every surviving simulation, in simulation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapResult {
    pub fits: Vec<FitResult>,
    /// Fraction of simulations whose KS distance reaches the reference's.
    /// Only set by [`bootstrap_p`].
    pub p_value: Option<f64>,
    pub reference_ks: Option<f64>,
    /// Simulations dropped under [`FailurePolicy::Skip`].
    pub failed: usize,
    pub seed: u64,
}

/// SplitMix64 mix of a master seed and a simulation index.
pub fn substream_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed
        .wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Refit `no_of_sims` synthetic datasets drawn around `reference`.
pub fn bootstrap(
    data: &[f64],
    reference: &PowerLaw,
    config: &BootstrapConfig,
) -> Result<BootstrapResult> {
    config.validate()?;
    if data.is_empty() {
        return Err(PowerLawError::EmptyData {
            xmin: reference.xmin(),
            xmax: config.xmax(),
        });
    }
    if let Some(bad) = data.iter().find(|x| !x.is_finite()) {
        return Err(PowerLawError::invalid(format!(
            "data must be finite, found {}",
            bad
        )));
    }

    let candidates = match &config.xmins {
        Some(xmins) => xmins.clone(),
        None => default_candidates(data),
    };
    let resampler = Resampler::new(data, reference);

    debug!(
        target: "pl_core::bootstrap",
        sims = config.no_of_sims,
        seed = config.seed,
        tail_fraction = resampler.tail_fraction,
        candidates = candidates.len(),
        parallel = config.parallel,
        "starting bootstrap"
    );

    let simulate = |index: usize| -> Result<FitResult> {
        let mut rng = StdRng::seed_from_u64(substream_seed(config.seed, index as u64));
        let synthetic = resampler.draw(&mut rng);
        estimate_parameters_with(&synthetic, reference.family(), Some(&candidates), &config.fit)
    };

    let outcomes: Vec<Result<FitResult>> = if config.parallel {
        (0..config.no_of_sims).into_par_iter().map(simulate).collect()
    } else {
        (0..config.no_of_sims).map(simulate).collect()
    };

    let mut fits = Vec::with_capacity(outcomes.len());
    let mut failed = 0;
    let mut last_error = None;
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match (outcome, config.failure_policy) {
            (Ok(fit), _) => fits.push(fit),
            (Err(e), FailurePolicy::Abort) => return Err(e),
            (Err(e), FailurePolicy::Skip) => {
                warn!(
                    target: "pl_core::bootstrap",
                    simulation = index,
                    error = %e,
                    "skipping failed simulation"
                );
                failed += 1;
                last_error = Some(e);
            }
        }
    }
    if fits.is_empty() {
        if let Some(e) = last_error {
            return Err(e);
        }
    }

    debug!(
        target: "pl_core::bootstrap",
        completed = fits.len(),
        failed,
        "bootstrap finished"
    );
    Ok(BootstrapResult {
        fits,
        p_value: None,
        reference_ks: None,
        failed,
        seed: config.seed,
    })
}

/// [`bootstrap`] plus the goodness-of-fit p-value.
///
/// The reference KS distance is measured on `data` over
/// `[reference.xmin(), xmax]`; the p-value is the share of simulations
/// whose own KS distance is at least as large.
pub fn bootstrap_p(
    data: &[f64],
    reference: &PowerLaw,
    config: &BootstrapConfig,
) -> Result<BootstrapResult> {
    config.validate()?;
    let reference_ks = ks_test(data, reference, reference.xmin(), config.xmax())?;
    let mut result = bootstrap(data, reference, config)?;
    let exceed = result.fits.iter().filter(|fit| fit.ks >= reference_ks).count();
    let p_value = exceed as f64 / result.fits.len() as f64;
    debug!(target: "pl_core::bootstrap", reference_ks, p_value, "goodness of fit");
    result.reference_ks = Some(reference_ks);
    result.p_value = Some(p_value);
    Ok(result)
}

/// Synthetic-dataset generator for one reference fit.
struct Resampler<'a> {
    reference: &'a PowerLaw,
    below: Vec<f64>,
    tail_fraction: f64,
    n: usize,
}

impl<'a> Resampler<'a> {
    fn new(data: &[f64], reference: &'a PowerLaw) -> Self {
        let xmin = reference.xmin();
        let below: Vec<f64> = data.iter().copied().filter(|&x| x < xmin).collect();
        let n = data.len();
        Self {
            reference,
            tail_fraction: (n - below.len()) as f64 / n as f64,
            below,
            n,
        }
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        (0..self.n)
            .map(|_| {
                if self.below.is_empty() || rng.random::<f64>() < self.tail_fraction {
                    self.reference.sample(rng)
                } else {
                    self.below[rng.random_range(0..self.below.len())]
                }
            })
            .collect()
    }
}
