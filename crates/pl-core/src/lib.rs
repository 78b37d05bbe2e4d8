//! Power-law fitting for heavy-tailed data.
//!
//! - [`estimate_parameters`]: MLE exponent with KS-minimizing cutoff search
//! - [`bootstrap`] / [`bootstrap_p`]: semi-parametric goodness-of-fit bootstrap
//! - [`compare_distributions`]: Vuong and Clarke tests between two fitted models
//! - [`ks_test`]: KS distance of a dataset from a fitted law
//!
//! ```no_run
//! use pl_core::{bootstrap_p, estimate_parameters, BootstrapConfig, Family};
//!
//! let data = [1.0, 2.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0];
//! let fit = estimate_parameters(&data, Family::Discrete, None, 1e5)?;
//! let gof = bootstrap_p(&data, &fit.distribution, &BootstrapConfig::default().with_sims(20))?;
//! println!("alpha={} xmin={} p={:?}", fit.alpha(), fit.xmin(), gof.p_value);
//! # Ok::<(), pl_core::PowerLawError>(())
//! ```

pub mod alternative;
pub mod bootstrap;
pub mod compare;
pub mod config;
pub mod distribution;
pub mod error;
pub mod estimate;
pub mod ks;
pub mod logging;

pub use alternative::{Alternative, AlternativeFit, Exponential, LogNormal};
pub use bootstrap::{bootstrap, bootstrap_p, substream_seed, BootstrapResult};
pub use compare::{compare_distributions, compare_with_alternative, ComparisonResult, Preference};
pub use config::{
    BootstrapConfig, ComparisonConfig, DiscreteSolverConfig, FailurePolicy, FitConfig,
    PowerLawConfig, DEFAULT_SEED, DEFAULT_SIG_LEVEL, DEFAULT_SIMS, DEFAULT_XMAX,
};
pub use distribution::{ContinuousPowerLaw, DiscretePowerLaw, Family, PowerLaw, Univariate};
pub use error::{ErrorKind, PowerLawError, Result};
pub use estimate::{estimate_parameters, estimate_parameters_with, unique_sorted, FitResult};
pub use ks::{ks_distance_sorted, ks_test};
