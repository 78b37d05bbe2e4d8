//! Bootstrap reproducibility and goodness-of-fit behavior.

use pl_core::{
    bootstrap, bootstrap_p, estimate_parameters, BootstrapConfig, ErrorKind, FailurePolicy,
    Family, PowerLaw, Univariate,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn fibonacci() -> Vec<f64> {
    vec![1.0, 2.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0]
}

fn continuous_sample(n: usize, seed: u64) -> Vec<f64> {
    let truth = PowerLaw::continuous(2.5, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| truth.sample(&mut rng)).collect()
}

#[test]
fn fibonacci_goodness_of_fit() {
    let data = fibonacci();
    let fit = estimate_parameters(&data, Family::Discrete, None, 1e5).unwrap();
    let config = BootstrapConfig::default().with_sims(20).with_seed(0);
    let result = bootstrap_p(&data, &fit.distribution, &config).unwrap();
    let p = result.p_value.unwrap();
    assert!((0.0..=1.0).contains(&p));
    assert_eq!(result.fits.len() + result.failed, 20);
    assert!(result.reference_ks.unwrap() >= 0.0);
}

#[test]
fn identical_inputs_give_identical_results() {
    let data = fibonacci();
    let fit = estimate_parameters(&data, Family::Discrete, None, 1e5).unwrap();
    let config = BootstrapConfig::default().with_sims(10).with_seed(99);
    let first = bootstrap(&data, &fit.distribution, &config).unwrap();
    let second = bootstrap(&data, &fit.distribution, &config).unwrap();
    assert_eq!(first.fits, second.fits);
}

#[test]
fn different_seeds_differ() {
    let data = continuous_sample(200, 1);
    let fit = estimate_parameters(&data, Family::Continuous, None, 1e5).unwrap();
    let a = bootstrap(&data, &fit.distribution, &BootstrapConfig::default().with_seed(1)).unwrap();
    let b = bootstrap(&data, &fit.distribution, &BootstrapConfig::default().with_seed(2)).unwrap();
    assert_ne!(a.fits, b.fits);
}

#[test]
fn parallel_matches_sequential() {
    let data = continuous_sample(300, 5);
    let fit = estimate_parameters(&data, Family::Continuous, None, 1e5).unwrap();
    let sequential = BootstrapConfig::default().with_sims(12).with_seed(7);
    let parallel = sequential.clone().with_parallel(true);
    let a = bootstrap_p(&data, &fit.distribution, &sequential).unwrap();
    let b = bootstrap_p(&data, &fit.distribution, &parallel).unwrap();
    assert_eq!(a, b);
}

#[test]
fn prefix_of_simulations_is_stable() {
    // Simulation i does not depend on how many simulations run.
    let data = continuous_sample(150, 9);
    let fit = estimate_parameters(&data, Family::Continuous, None, 1e5).unwrap();
    let short = bootstrap(&data, &fit.distribution, &BootstrapConfig::default().with_sims(4))
        .unwrap();
    let long = bootstrap(&data, &fit.distribution, &BootstrapConfig::default().with_sims(8))
        .unwrap();
    assert_eq!(short.fits[..], long.fits[..4]);
}

#[test]
fn explicit_candidates_bound_refits() {
    let data = continuous_sample(200, 3);
    let fit = estimate_parameters(&data, Family::Continuous, None, 1e5).unwrap();
    let xmins = vec![1.0, 1.5, 2.0];
    let config = BootstrapConfig::default().with_xmins(xmins.clone());
    let result = bootstrap(&data, &fit.distribution, &config).unwrap();
    assert!(result.fits.iter().all(|f| xmins.contains(&f.xmin())));
}

#[test]
fn skip_policy_counts_failures() {
    let data = fibonacci();
    let reference = PowerLaw::discrete(2.0, 1.0).unwrap();
    let config = BootstrapConfig::default()
        .with_sims(4)
        .with_xmins(vec![1e300])
        .with_failure_policy(FailurePolicy::Skip);
    let err = bootstrap(&data, &reference, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}
