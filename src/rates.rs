//! Power-law models for bias, variance and cost as functions of the degrees of freedom.
use crate::error::{FittedQuantity, MlmcError};
use crate::statistics::LevelStatisticsMap;
use cmlmc_optimize::regression::{fit_power_law, PowerLawFit};
use log::debug;
use serde::{Deserialize, Serialize};

/// Fitted rates of the multilevel hierarchy.
///
/// The models are
///
/// - bias: $|E[Y_l]| \approx C_\alpha \, \mathrm{nDoF}_l^{-\alpha}$,
/// - variance: $V[Y_l] \approx C_\beta \, \mathrm{nDoF}_l^{-\beta}$,
/// - cost: $C_l \approx C_\gamma \, \mathrm{nDoF}_l^{\gamma}$.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateModel {
    pub c_alpha: f64,
    pub alpha: f64,
    pub c_beta: f64,
    pub beta: f64,
    pub c_cost: f64,
    pub gamma: f64,
}

impl RateModel {
    pub fn bias(&self, num_dofs: f64) -> f64 {
        self.c_alpha * num_dofs.powf(-self.alpha)
    }

    pub fn variance(&self, num_dofs: f64) -> f64 {
        self.c_beta * num_dofs.powf(-self.beta)
    }

    pub fn cost(&self, num_dofs: f64) -> f64 {
        self.c_cost * num_dofs.powf(self.gamma)
    }

    /// The splitting parameter $\theta = 1 - C_\alpha \mathrm{nDoF}^{-\alpha} / \mathrm{tol}$.
    ///
    /// $\theta$ is the fraction of the tolerance left to the statistical error once the
    /// modelled bias of the finest level has been accounted for.
    pub fn splitting(&self, tolerance: f64, num_dofs: f64) -> f64 {
        1.0 - self.bias(num_dofs) / tolerance
    }
}

fn fit(
    quantity: FittedQuantity,
    levels: &[usize],
    num_dofs: &[f64],
    values: &[f64],
) -> Result<PowerLawFit<f64>, MlmcError> {
    fit_power_law(num_dofs, values).map_err(|err| MlmcError::from_regression(err, quantity, levels, values))
}

/// Fits the rate model by least squares in $\log_2$ space.
///
/// All slices are indexed by level `0 ..= L`. The bias and variance fits only use levels
/// `1 ..= L`, since level 0 holds the plain coarse estimate rather than a difference. The cost
/// fit uses all levels. `abs_mean_diff` must already hold absolute values.
///
/// # Panics
///
/// Panics if the slices do not have the same length.
pub fn fit_rates(
    abs_mean_diff: &[f64],
    variance_diff: &[f64],
    mean_cost: &[f64],
    num_dofs: &[f64],
) -> Result<RateModel, MlmcError> {
    let n = num_dofs.len();
    assert_eq!(abs_mean_diff.len(), n, "Bias values must be given for every level.");
    assert_eq!(variance_diff.len(), n, "Variance values must be given for every level.");
    assert_eq!(mean_cost.len(), n, "Cost values must be given for every level.");

    let all_levels: Vec<usize> = (0..n).collect();
    let difference_levels = all_levels.get(1..).unwrap_or(&[]);
    let difference_dofs = num_dofs.get(1..).unwrap_or(&[]);

    let bias = fit(
        FittedQuantity::Bias,
        difference_levels,
        difference_dofs,
        abs_mean_diff.get(1..).unwrap_or(&[]),
    )?;
    let variance = fit(
        FittedQuantity::Variance,
        difference_levels,
        difference_dofs,
        variance_diff.get(1..).unwrap_or(&[]),
    )?;
    let cost = fit(FittedQuantity::Cost, &all_levels, num_dofs, mean_cost)?;

    let rates = RateModel {
        c_alpha: bias.coefficient,
        alpha: -bias.exponent,
        c_beta: variance.coefficient,
        beta: -variance.exponent,
        c_cost: cost.coefficient,
        gamma: cost.exponent,
    };
    debug!("Fitted rates over {} levels: {:?}", n, rates);
    Ok(rates)
}

/// Fits the rate model to the statistics of the levels `0 ..= max_level`.
///
/// Every level in range must have been sampled, and every level from 1 upwards needs at least
/// two samples for its variance to be defined.
///
/// # Panics
///
/// Panics if `num_dofs` has fewer than `max_level + 1` entries.
pub fn fit_rates_from_statistics(
    differences: &LevelStatisticsMap,
    costs: &LevelStatisticsMap,
    num_dofs: &[f64],
    max_level: usize,
) -> Result<RateModel, MlmcError> {
    let mut abs_mean_diff = Vec::with_capacity(max_level + 1);
    let mut variance_diff = Vec::with_capacity(max_level + 1);
    let mut mean_cost = Vec::with_capacity(max_level + 1);

    for level in 0..=max_level {
        // Levels below `level` are usable, and the bias and variance fits skip level 0
        let insufficient = |quantity: FittedQuantity| MlmcError::InsufficientData {
            quantity,
            available_levels: match quantity {
                FittedQuantity::Cost => level,
                _ => level.saturating_sub(1),
            },
        };
        let diff = differences
            .get(level)
            .ok_or_else(|| insufficient(FittedQuantity::Bias))?;
        let cost = costs.get(level).ok_or_else(|| insufficient(FittedQuantity::Cost))?;

        abs_mean_diff.push(diff.mean().abs());
        mean_cost.push(cost.mean());
        if level == 0 {
            // Not part of the variance fit
            variance_diff.push(diff.sample_variance().unwrap_or(0.0));
        } else {
            variance_diff.push(
                diff.sample_variance()
                    .ok_or_else(|| insufficient(FittedQuantity::Variance))?,
            );
        }
    }

    fit_rates(&abs_mean_diff, &variance_diff, &mean_cost, &num_dofs[..=max_level])
}
