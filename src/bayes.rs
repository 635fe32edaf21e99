//! Bayesian shrinkage of the per-level variance estimates.
use crate::rates::RateModel;
use crate::statistics::LevelStatisticsMap;
use serde::{Deserialize, Serialize};

/// Certainty hyperparameters of the normal-gamma prior built from the rate model.
///
/// `k0` weighs the prior mean $C_\alpha \mathrm{nDoF}^{-\alpha}$ and `k1` the prior precision
/// $\mathrm{nDoF}^{\beta} / C_\beta$ against the sampled statistics.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariancePrior {
    pub k0: f64,
    pub k1: f64,
}

impl Default for VariancePrior {
    fn default() -> Self {
        Self { k0: 0.1, k1: 0.1 }
    }
}

/// Estimates the variance of the level differences for every level `0 ..= up_to_level`.
///
/// For each level the estimate is the posterior mean of the variance under a normal-gamma prior
/// whose mean and precision follow the rate model:
///
/// $$
/// G_1 = \tfrac{1}{2} + k_1 \lambda_l + \tfrac{n_l}{2}, \quad
/// G_2 = k_1 + \tfrac{1}{2} M_{2,l} + \frac{k_0 n_l (\bar Y_l - \mu_l)^2}{2 (k_0 + n_l)}, \quad
/// \hat V_l = \frac{G_2}{G_1 - \tfrac{1}{2}},
/// $$
///
/// with $\mu_l = C_\alpha \mathrm{nDoF}_l^{-\alpha}$ and $\lambda_l = \mathrm{nDoF}_l^{\beta} / C_\beta$.
/// Here $M_{2,l} = (n_l - 1) s_l^2$, which is zero for a single sample.
///
/// Levels without samples have $n_l = 0$ and the estimate falls back to the prior
/// $\hat V_l = 1 / \lambda_l = C_\beta \mathrm{nDoF}_l^{-\beta}$.
///
/// # Panics
///
/// Panics if `num_dofs` has fewer than `up_to_level + 1` entries.
pub fn estimate_bayesian_variance(
    differences: &LevelStatisticsMap,
    prior: &VariancePrior,
    rates: &RateModel,
    num_dofs: &[f64],
    up_to_level: usize,
) -> Vec<f64> {
    assert!(
        num_dofs.len() > up_to_level,
        "Degrees of freedom must be known for every estimated level."
    );
    let VariancePrior { k0, k1 } = *prior;

    (0..=up_to_level)
        .map(|level| {
            let ndof = num_dofs[level];
            let mu = rates.bias(ndof);
            let lambda = ndof.powf(rates.beta) / rates.c_beta;

            let g1 = 0.5 + k1 * lambda;
            let g2 = k1;
            let (g1, g2) = match differences.get(level) {
                Some(statistics) => {
                    let n = statistics.count() as f64;
                    let deviation = statistics.mean() - mu;
                    (
                        g1 + 0.5 * n,
                        g2 + 0.5 * statistics.m2() + k0 * n * deviation * deviation / (2.0 * (k0 + n)),
                    )
                }
                None => (g1, g2),
            };
            g2 / (g1 - 0.5)
        })
        .collect()
}
