//! Tunable settings for fitting, bootstrapping and comparison.
//!
//! Every struct has a `Default` matching the documented defaults and accepts
//! partial TOML or JSON documents (`#[serde(default)]`), so a file only has
//! to name what it changes:
//!
//! ```toml
//! [fit]
//! xmax = 1e6
//!
//! [bootstrap]
//! no_of_sims = 200
//! seed = 42
//! failure_policy = "skip"
//! ```

use crate::error::{PowerLawError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Upper truncation bound for KS comparisons.
pub const DEFAULT_XMAX: f64 = 1e5;
/// Bootstrap simulations per run.
pub const DEFAULT_SIMS: usize = 10;
/// Master seed for bootstrap sub-streams.
pub const DEFAULT_SEED: u64 = 0;
/// Significance level for model comparison.
pub const DEFAULT_SIG_LEVEL: f64 = 0.05;

/// Controls for the discrete exponent root-finder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscreteSolverConfig {
    /// Bracket width at which bisection stops.
    pub tolerance: f64,
    /// Cap on bracket expansions plus bisection steps.
    pub max_iterations: usize,
    /// Largest exponent the bracket may grow to.
    pub alpha_max: f64,
}

impl Default for DiscreteSolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 200,
            alpha_max: 500.0,
        }
    }
}

/// Estimator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Observations above this are left out of KS comparisons.
    pub xmax: f64,
    /// Minimum number of observations at or above a candidate cutoff.
    pub min_tail: usize,
    /// Evaluate candidate cutoffs on the rayon pool.
    pub parallel: bool,
    pub discrete: DiscreteSolverConfig,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            xmax: DEFAULT_XMAX,
            min_tail: 2,
            parallel: false,
            discrete: DiscreteSolverConfig::default(),
        }
    }
}

impl FitConfig {
    /// Tighter solver tolerance and a longer iteration budget.
    pub fn precise() -> Self {
        Self {
            discrete: DiscreteSolverConfig {
                tolerance: 1e-13,
                max_iterations: 1_000,
                ..DiscreteSolverConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn with_xmax(mut self, xmax: f64) -> Self {
        self.xmax = xmax;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.xmax.is_nan() || self.xmax <= 0.0 {
            return Err(PowerLawError::invalid(format!(
                "xmax must be positive, got {}",
                self.xmax
            )));
        }
        if self.min_tail < 2 {
            return Err(PowerLawError::invalid(format!(
                "min_tail must be at least 2, got {}",
                self.min_tail
            )));
        }
        let solver = &self.discrete;
        if solver.tolerance.is_nan() || solver.tolerance <= 0.0 {
            return Err(PowerLawError::invalid(format!(
                "solver tolerance must be positive, got {}",
                solver.tolerance
            )));
        }
        if solver.max_iterations == 0 {
            return Err(PowerLawError::invalid("solver max_iterations must be positive"));
        }
        if !solver.alpha_max.is_finite() || solver.alpha_max <= 1.0 {
            return Err(PowerLawError::invalid(format!(
                "solver alpha_max must be finite and > 1, got {}",
                solver.alpha_max
            )));
        }
        Ok(())
    }
}

/// What the bootstrap does when a simulation's refit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the whole run with the lowest-index simulation error.
    #[default]
    Abort,
    /// Drop the simulation, count it, and continue.
    Skip,
}

/// Bootstrap settings. Cutoff search inside each simulation uses `fit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub no_of_sims: usize,
    /// Candidate cutoffs for each refit; `None` uses the unique data values.
    pub xmins: Option<Vec<f64>>,
    pub seed: u64,
    /// Run simulations on the rayon pool.
    pub parallel: bool,
    pub failure_policy: FailurePolicy,
    pub fit: FitConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            no_of_sims: DEFAULT_SIMS,
            xmins: None,
            seed: DEFAULT_SEED,
            parallel: false,
            failure_policy: FailurePolicy::default(),
            fit: FitConfig::default(),
        }
    }
}

impl BootstrapConfig {
    /// Few simulations, skipping failures; for smoke checks.
    pub fn quick() -> Self {
        Self {
            no_of_sims: 5,
            failure_policy: FailurePolicy::Skip,
            ..Self::default()
        }
    }

    pub fn with_sims(mut self, no_of_sims: usize) -> Self {
        self.no_of_sims = no_of_sims;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_xmins(mut self, xmins: Vec<f64>) -> Self {
        self.xmins = Some(xmins);
        self
    }

    pub fn with_xmax(mut self, xmax: f64) -> Self {
        self.fit.xmax = xmax;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn xmax(&self) -> f64 {
        self.fit.xmax
    }

    pub fn validate(&self) -> Result<()> {
        if self.no_of_sims == 0 {
            return Err(PowerLawError::invalid("no_of_sims must be positive"));
        }
        if let Some(xmins) = &self.xmins {
            if xmins.is_empty() {
                return Err(PowerLawError::invalid("xmins must not be empty"));
            }
        }
        self.fit.validate()
    }
}

/// Model comparison settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub sig_level: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            sig_level: DEFAULT_SIG_LEVEL,
        }
    }
}

impl ComparisonConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sig_level.is_nan() || self.sig_level <= 0.0 || self.sig_level >= 1.0 {
            return Err(PowerLawError::invalid(format!(
                "sig_level must lie in (0, 1), got {}",
                self.sig_level
            )));
        }
        Ok(())
    }
}

/// Top-level settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerLawConfig {
    pub fit: FitConfig,
    pub bootstrap: BootstrapConfig,
    pub comparison: ComparisonConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
}

fn detect_format(path: &Path) -> Result<ConfigFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "toml" => Ok(ConfigFormat::Toml),
        "json" => Ok(ConfigFormat::Json),
        _ => Err(PowerLawError::config(format!(
            "unsupported config format: {:?}",
            ext
        ))),
    }
}

impl PowerLawConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PowerLawError::config(format!("failed to parse toml config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| PowerLawError::config(format!("failed to parse json config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let format = detect_format(path)?;
        let content = fs::read_to_string(path).map_err(|source| PowerLawError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match format {
            ConfigFormat::Toml => Self::from_toml_str(&content),
            ConfigFormat::Json => Self::from_json_str(&content),
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PowerLawError::config(format!("failed to render toml config: {}", e)))
    }

    /// Check every section; the first violation is reported as `Config`.
    pub fn validate(&self) -> Result<()> {
        self.fit
            .validate()
            .and_then(|_| self.bootstrap.validate())
            .and_then(|_| self.comparison.validate())
            .map_err(|e| match e {
                PowerLawError::InvalidParameter { message } => PowerLawError::config(message),
                other => other,
            })
    }
}
