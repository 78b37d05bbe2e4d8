//! Model comparison between fitted power laws and rival tail families.

use pl_core::{
    compare_distributions, compare_with_alternative, Alternative, ErrorKind, Exponential, Family,
    LogNormal, PowerLaw, Preference, Univariate,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sample<D: Univariate>(dist: &D, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| dist.sample(&mut rng)).collect()
}

#[test]
fn exponential_tail_prefers_exponential() {
    let truth = Exponential::new(1.0, 1.0).unwrap();
    let data = sample(&truth, 2_000, 31);
    let fit = PowerLaw::fit_mle(Family::Continuous, &data).unwrap();
    let result =
        compare_with_alternative(&fit.distribution, Alternative::Exponential, &data, 0.05).unwrap();
    assert!(result.v_test_stat < 0.0);
    assert_eq!(result.v_preferred, Preference::Second);
    assert!(2 * result.c_b < result.c_n);
}

#[test]
fn power_law_tail_prefers_power_law() {
    let truth = PowerLaw::continuous(2.5, 1.0).unwrap();
    let data = sample(&truth, 2_000, 32);
    let fit = PowerLaw::fit_mle(Family::Continuous, &data).unwrap();
    let result =
        compare_with_alternative(&fit.distribution, Alternative::Exponential, &data, 0.05).unwrap();
    assert!(result.v_test_stat > 0.0);
    assert_eq!(result.v_preferred, Preference::First);
    assert!(result.v_p_value < 0.05);
}

#[test]
fn log_normal_body_prefers_log_normal() {
    let truth = LogNormal::new(1.0, 0.5, 0.01).unwrap();
    let data = sample(&truth, 2_000, 33);
    let fit = PowerLaw::fit_mle(Family::Continuous, &data).unwrap();
    let result =
        compare_with_alternative(&fit.distribution, Alternative::LogNormal, &data, 0.05).unwrap();
    assert_eq!(result.v_preferred, Preference::Second);
}

#[test]
fn identical_models_are_indistinguishable() {
    let law = PowerLaw::continuous(2.0, 1.0).unwrap();
    let data = [1.0, 2.0, 3.0, 10.0];
    let result = compare_distributions(&law, &law, &data, 0.05).unwrap();
    assert_eq!(result.v_test_stat, 0.0);
    assert_eq!(result.v_p_value, 1.0);
    assert_eq!(result.c_b, 0);
    assert_eq!(result.c_n, 0);
    assert_eq!(result.c_p_value, 1.0);
    assert_eq!(result.v_preferred, Preference::Indistinguishable);
    assert_eq!(result.c_preferred, Preference::Indistinguishable);
}

#[test]
fn swapping_arguments_is_symmetric() {
    let truth = PowerLaw::continuous(2.2, 1.0).unwrap();
    let data = sample(&truth, 500, 34);
    let a = PowerLaw::continuous(2.2, 1.0).unwrap();
    let b = PowerLaw::continuous(2.6, 1.2).unwrap();
    let ab = compare_distributions(&a, &b, &data, 0.05).unwrap();
    let ba = compare_distributions(&b, &a, &data, 0.05).unwrap();
    assert_eq!(ab.v_test_stat, -ba.v_test_stat);
    assert_eq!(ab.v_p_value, ba.v_p_value);
    assert_eq!(ab.c_p_value, ba.c_p_value);
    assert_eq!(ab.c_b, ba.c_n - ba.c_b);
    assert_eq!(ab.v_preferred, ba.v_preferred.swapped());
    assert_eq!(ab.c_preferred, ba.c_preferred.swapped());
    assert_eq!(ab.xmin, 1.2);
}

#[test]
fn discrete_fits_compare() {
    let data = [1.0, 2.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0];
    let steep = PowerLaw::discrete(2.5, 1.0).unwrap();
    let shallow = PowerLaw::discrete(1.5, 1.0).unwrap();
    let result = compare_distributions(&steep, &shallow, &data, 0.05).unwrap();
    assert_eq!(result.data.len(), data.len());
    assert!(result.v_p_value >= 0.0 && result.v_p_value <= 1.0);
    assert!(result.c_p_value >= 0.0 && result.c_p_value <= 1.0);
}

#[test]
fn too_few_points_in_common_support() {
    let a = PowerLaw::continuous(2.0, 50.0).unwrap();
    let b = PowerLaw::continuous(2.0, 1.0).unwrap();
    let err = compare_distributions(&a, &b, &[1.0, 2.0, 60.0], 0.05).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmptyData);
}

#[test]
fn result_serializes() {
    let law = PowerLaw::continuous(2.0, 1.0).unwrap();
    let other = PowerLaw::continuous(3.0, 1.0).unwrap();
    let result = compare_distributions(&law, &other, &[1.0, 1.5, 4.0], 0.05).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert!(json["v_preferred"].is_string());
    assert_eq!(json["log_likelihood_ratio"].as_array().unwrap().len(), 3);
}
