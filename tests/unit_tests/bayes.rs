use cmlmc::bayes::{estimate_bayesian_variance, VariancePrior};
use cmlmc::rates::RateModel;
use cmlmc::statistics::LevelStatisticsMap;
use matrixcompare::assert_scalar_eq;

fn rates() -> RateModel {
    RateModel {
        c_alpha: 1.0,
        alpha: 0.5,
        c_beta: 2.0,
        beta: 1.0,
        c_cost: 1.0,
        gamma: 1.0,
    }
}

const NUM_DOFS: [f64; 3] = [25.0, 100.0, 400.0];

#[test]
fn unsampled_levels_fall_back_to_prior_variance() {
    let estimate = estimate_bayesian_variance(
        &LevelStatisticsMap::new(),
        &VariancePrior::default(),
        &rates(),
        &NUM_DOFS,
        2,
    );
    assert_eq!(estimate.len(), 3);
    for (level, &ndof) in NUM_DOFS.iter().enumerate() {
        assert_scalar_eq!(estimate[level], rates().variance(ndof), comp = abs, tol = 1e-14);
    }
}

#[test]
fn single_sample_uses_zero_second_moment() {
    let mut differences = LevelStatisticsMap::new();
    differences.push(0, 0.7);

    let prior = VariancePrior { k0: 0.1, k1: 0.1 };
    let estimate = estimate_bayesian_variance(&differences, &prior, &rates(), &NUM_DOFS, 0);

    // mu = 1 / 5, lambda = 25 / 2
    let g1 = 0.5 + 0.1 * 12.5 + 0.5;
    let g2 = 0.1 + 0.1 * (0.7f64 - 0.2).powi(2) / (2.0 * 1.1);
    assert_scalar_eq!(estimate[0], g2 / (g1 - 0.5), comp = abs, tol = 1e-14);
}

#[test]
fn matches_closed_form_with_several_samples() {
    let mut differences = LevelStatisticsMap::new();
    for sample in [0.1, 0.2, 0.3, 0.6] {
        differences.push(1, sample);
    }
    let prior = VariancePrior { k0: 0.3, k1: 0.2 };
    let estimate = estimate_bayesian_variance(&differences, &prior, &rates(), &NUM_DOFS, 1);

    let n = 4.0;
    let mean = 0.3;
    let m2 = 0.04 + 0.01 + 0.0 + 0.09;
    let mu = 0.1;
    let lambda = 50.0;
    let g1 = 0.5 + 0.2 * lambda + 0.5 * n;
    let g2 = 0.2 + 0.5 * m2 + 0.3 * n * (mean - mu) * (mean - mu) / (2.0 * (0.3 + n));

    // Level 0 is unsampled
    assert_scalar_eq!(estimate[0], rates().variance(25.0), comp = abs, tol = 1e-14);
    assert_scalar_eq!(estimate[1], g2 / (g1 - 0.5), comp = abs, tol = 1e-12);
}

#[test]
fn many_samples_approach_sample_variance() {
    let mut differences = LevelStatisticsMap::new();
    for i in 0..100_000 {
        differences.push(2, if i % 2 == 0 { 1.0 } else { -1.0 });
    }
    let estimate = estimate_bayesian_variance(&differences, &VariancePrior::default(), &rates(), &NUM_DOFS, 2);
    let sample_variance = differences.get(2).unwrap().sample_variance().unwrap();
    assert_scalar_eq!(estimate[2], sample_variance, comp = abs, tol = 1e-2);
}
