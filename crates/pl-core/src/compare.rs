//! Non-nested model comparison: Vuong's likelihood-ratio test and Clarke's
//! sign test.
//!
//! Both tests use the pointwise log-likelihood ratios
//! `r_i = log f1(x_i) - log f2(x_i)` over the observations inside both
//! supports. Swapping the two models negates every `r_i`, which negates the
//! Vuong statistic, mirrors the Clarke count, leaves both p-values unchanged
//! and swaps the preferred model.

use crate::alternative::{Alternative, AlternativeFit};
use crate::distribution::{PowerLaw, Univariate};
use crate::error::{PowerLawError, Result};
use pl_math::{binomial, normal_two_sided_p};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which model a test favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    First,
    Second,
    Indistinguishable,
}

impl Preference {
    /// The same verdict with the models listed in the other order.
    pub fn swapped(self) -> Self {
        match self {
            Preference::First => Preference::Second,
            Preference::Second => Preference::First,
            Preference::Indistinguishable => Preference::Indistinguishable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// Pointwise `log f1(x) - log f2(x)`, aligned with `data`.
    pub log_likelihood_ratio: Vec<f64>,
    /// Observations inside both supports, in input order.
    pub data: Vec<f64>,
    /// Lower bound applied to the data.
    pub xmin: f64,
    pub sig_level: f64,
    pub v_test_stat: f64,
    pub v_p_value: f64,
    pub v_preferred: Preference,
    /// Number of strictly positive ratios.
    pub c_b: usize,
    /// Number of non-zero ratios (the sign test's trial count).
    pub c_n: usize,
    pub c_p_value: f64,
    pub c_preferred: Preference,
}

/// Compare two fitted models on `data`.
pub fn compare_distributions<A, B>(
    d1: &A,
    d2: &B,
    data: &[f64],
    sig_level: f64,
) -> Result<ComparisonResult>
where
    A: Univariate + ?Sized,
    B: Univariate + ?Sized,
{
    if sig_level.is_nan() || sig_level <= 0.0 || sig_level >= 1.0 {
        return Err(PowerLawError::invalid(format!(
            "sig_level must lie in (0, 1), got {}",
            sig_level
        )));
    }
    let xmin = d1.support_min().max(d2.support_min());
    let kept: Vec<f64> = data.iter().copied().filter(|&x| x >= xmin).collect();
    if kept.len() < 2 {
        return Err(PowerLawError::EmptyData {
            xmin,
            xmax: f64::INFINITY,
        });
    }

    let mut ratios = Vec::with_capacity(kept.len());
    for &x in &kept {
        let r = d1.log_density(x) - d2.log_density(x);
        if !r.is_finite() {
            return Err(PowerLawError::invalid(format!(
                "log-likelihood ratio is not finite at x={}",
                x
            )));
        }
        ratios.push(r);
    }

    let vuong = vuong_test(&ratios, sig_level);
    let clarke = clarke_test(&ratios, sig_level);

    debug!(
        target: "pl_core::compare",
        n = ratios.len(),
        xmin,
        v_test_stat = vuong.stat,
        v_p_value = vuong.p_value,
        c_b = clarke.positives,
        c_p_value = clarke.p_value,
        "compared models"
    );

    Ok(ComparisonResult {
        log_likelihood_ratio: ratios,
        data: kept,
        xmin,
        sig_level,
        v_test_stat: vuong.stat,
        v_p_value: vuong.p_value,
        v_preferred: vuong.preferred,
        c_b: clarke.positives,
        c_n: clarke.trials,
        c_p_value: clarke.p_value,
        c_preferred: clarke.preferred,
    })
}

/// Fit `alternative` above the power law's cutoff and compare against it.
///
/// The power law is the first model.
pub fn compare_with_alternative(
    power_law: &PowerLaw,
    alternative: Alternative,
    data: &[f64],
    sig_level: f64,
) -> Result<ComparisonResult> {
    let rival = AlternativeFit::fit(alternative, data, power_law.xmin())?;
    debug!(target: "pl_core::compare", ?rival, "fitted alternative");
    compare_distributions(power_law, &rival, data, sig_level)
}

struct Vuong {
    stat: f64,
    p_value: f64,
    preferred: Preference,
}

fn vuong_test(ratios: &[f64], sig_level: f64) -> Vuong {
    let n = ratios.len() as f64;
    let lr: f64 = ratios.iter().sum();
    let mean = lr / n;
    let variance = ratios.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / (n - 1.0);
    let omega = variance.sqrt();

    let (stat, p_value) = if omega > 0.0 {
        let stat = lr / (n.sqrt() * omega);
        (stat, normal_two_sided_p(stat))
    } else if lr == 0.0 {
        (0.0, 1.0)
    } else {
        // Constant non-zero ratio: every observation favors the same model.
        (lr.signum() * f64::INFINITY, 0.0)
    };

    let preferred = if p_value < sig_level && stat > 0.0 {
        Preference::First
    } else if p_value < sig_level && stat < 0.0 {
        Preference::Second
    } else {
        Preference::Indistinguishable
    };
    Vuong {
        stat,
        p_value,
        preferred,
    }
}

struct Clarke {
    positives: usize,
    trials: usize,
    p_value: f64,
    preferred: Preference,
}

fn clarke_test(ratios: &[f64], sig_level: f64) -> Clarke {
    let positives = ratios.iter().filter(|&&r| r > 0.0).count();
    let trials = ratios.iter().filter(|&&r| r != 0.0).count();
    let p_value = binomial::sign_test_p(positives as u64, trials as u64);

    let preferred = if p_value >= sig_level || 2 * positives == trials {
        Preference::Indistinguishable
    } else if 2 * positives > trials {
        Preference::First
    } else {
        Preference::Second
    };
    Clarke {
        positives,
        trials,
        p_value,
        preferred,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alternative::Exponential;
    use crate::ErrorKind;

    #[test]
    fn preference_swaps() {
        assert_eq!(Preference::First.swapped(), Preference::Second);
        assert_eq!(Preference::Second.swapped(), Preference::First);
        assert_eq!(
            Preference::Indistinguishable.swapped(),
            Preference::Indistinguishable
        );
    }

    #[test]
    fn vuong_hand_computed() {
        // r = [1, 2, 3]: LR = 6, ω = 1, V = 6 / √3.
        let v = vuong_test(&[1.0, 2.0, 3.0], 0.05);
        assert!((v.stat - 6.0 / 3f64.sqrt()).abs() < 1e-12);
        assert!((v.p_value - normal_two_sided_p(6.0 / 3f64.sqrt())).abs() < 1e-15);
        assert_eq!(v.preferred, Preference::First);
    }

    #[test]
    fn vuong_zero_variance() {
        let tie = vuong_test(&[0.0, 0.0, 0.0], 0.05);
        assert_eq!(tie.stat, 0.0);
        assert_eq!(tie.p_value, 1.0);
        assert_eq!(tie.preferred, Preference::Indistinguishable);

        let constant = vuong_test(&[-0.5, -0.5], 0.05);
        assert_eq!(constant.stat, f64::NEG_INFINITY);
        assert_eq!(constant.p_value, 0.0);
        assert_eq!(constant.preferred, Preference::Second);
    }

    #[test]
    fn clarke_counts_ignore_ties() {
        let c = clarke_test(&[1.0, 0.0, 2.0, -1.0, 0.0, 3.0], 0.05);
        assert_eq!(c.positives, 3);
        assert_eq!(c.trials, 4);
        assert!((c.p_value - binomial::sign_test_p(3, 4)).abs() < 1e-15);
        assert_eq!(c.preferred, Preference::Indistinguishable);

        let all_zero = clarke_test(&[0.0, 0.0], 0.05);
        assert_eq!(all_zero.trials, 0);
        assert_eq!(all_zero.p_value, 1.0);
    }

    #[test]
    fn swapping_models_mirrors_the_result() {
        let pl = PowerLaw::continuous(2.3, 1.0).unwrap();
        let other = PowerLaw::continuous(2.0, 1.5).unwrap();
        let data = [1.0, 1.2, 1.6, 2.0, 2.5, 3.1, 4.4, 7.0, 9.5, 15.0, 33.0];
        let ab = compare_distributions(&pl, &other, &data, 0.05).unwrap();
        let ba = compare_distributions(&other, &pl, &data, 0.05).unwrap();
        assert_eq!(ab.xmin, 1.5);
        assert_eq!(ab.data, ba.data);
        assert_eq!(ab.v_test_stat, -ba.v_test_stat);
        assert_eq!(ab.v_p_value, ba.v_p_value);
        assert_eq!(ab.c_p_value, ba.c_p_value);
        assert_eq!(ab.c_b, ba.c_n - ba.c_b);
        assert_eq!(ab.v_preferred, ba.v_preferred.swapped());
        assert_eq!(ab.c_preferred, ba.c_preferred.swapped());
    }

    #[test]
    fn support_restriction_and_errors() {
        let a = PowerLaw::continuous(2.0, 10.0).unwrap();
        let b = PowerLaw::continuous(2.5, 1.0).unwrap();
        let err = compare_distributions(&a, &b, &[1.0, 2.0, 11.0], 0.05).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyData);
        let err = compare_distributions(&a, &b, &[11.0, 12.0], 1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn discrete_against_off_lattice_data_fails_loudly() {
        let a = PowerLaw::discrete(2.0, 1.0).unwrap();
        let b = PowerLaw::continuous(2.0, 1.0).unwrap();
        let err = compare_distributions(&a, &b, &[1.0, 2.5, 3.0], 0.05).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn mixed_model_types() {
        let pl = PowerLaw::continuous(2.5, 1.0).unwrap();
        let exp = Exponential::new(1.0, 1.0).unwrap();
        let data = [1.1, 1.4, 2.0, 2.2, 3.0];
        let result = compare_distributions(&pl, &exp, &data, 0.05).unwrap();
        assert_eq!(result.log_likelihood_ratio.len(), data.len());
        assert!(result.log_likelihood_ratio.iter().all(|r| r.is_finite()));
    }
}
