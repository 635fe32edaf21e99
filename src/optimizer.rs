//! Selection of the finest level used by the next iteration.
use crate::error::MlmcError;
use crate::rates::RateModel;
use itertools::izip;
use log::debug;
use serde::{Deserialize, Serialize};

/// The splitting parameter and predicted work of a candidate finest level.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLevel {
    pub level: usize,
    pub theta: f64,
    /// Predicted total work, or `None` if $\theta \notin (0, 1)$ and the level was rejected.
    pub work: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelChoice {
    /// The level chosen as finest level for the next iteration.
    pub level: usize,
    /// The level minimizing the predicted work before the growth constraint was applied.
    pub unconstrained_level: usize,
    pub candidates: Vec<CandidateLevel>,
    /// Bayesian variance estimates for the levels `0 ..= level`.
    pub bayesian_variance: Vec<f64>,
}

pub(crate) fn is_admissible_splitting(theta: f64) -> bool {
    theta > 0.0 && theta < 1.0
}

/// Computes $\sum_{j \le l} \sqrt{C_j \hat V_j}$ with modelled costs $C_j$.
pub fn cost_weighted_deviation_sum(rates: &RateModel, num_dofs: &[f64], bayesian_variance: &[f64]) -> f64 {
    izip!(num_dofs, bayesian_variance)
        .map(|(&ndof, &variance)| (rates.cost(ndof) * variance).sqrt())
        .sum()
}

/// Predicted work of an MLMC estimator with finest level `level`,
///
/// $$
/// W(l) = \left(\frac{C_\phi}{\theta_l \, \mathrm{tol}}\right)^2
///        \left(\sum_{j=0}^{l} \sqrt{C_j \hat V_j}\right)^2.
/// $$
pub fn predicted_work(
    tolerance: f64,
    theta: f64,
    confidence: f64,
    rates: &RateModel,
    num_dofs: &[f64],
    bayesian_variance: &[f64],
    level: usize,
) -> f64 {
    let scale = confidence / (theta * tolerance);
    let sum = cost_weighted_deviation_sum(rates, &num_dofs[..=level], &bayesian_variance[..=level]);
    scale * scale * sum * sum
}

/// Chooses the finest level minimizing the predicted work among `l_min ..= l_max`.
///
/// Candidates whose splitting parameter falls outside $(0, 1)$ cannot meet the tolerance and are
/// skipped. The result never exceeds `l_min + 1`, so the hierarchy grows by at most one level
/// per iteration.
///
/// # Errors
///
/// Returns [`MlmcError::SplittingRange`] if no candidate has an admissible splitting parameter.
///
/// # Panics
///
/// Panics if `l_min > l_max` or if `num_dofs` or `bayesian_variance` has fewer than
/// `l_max + 1` entries.
pub fn choose_optimal_level(
    tolerance: f64,
    rates: &RateModel,
    num_dofs: &[f64],
    bayesian_variance: &[f64],
    l_min: usize,
    l_max: usize,
    confidence: f64,
) -> Result<LevelChoice, MlmcError> {
    assert!(l_min <= l_max, "Minimum level must not exceed maximum level.");
    assert!(num_dofs.len() > l_max);
    assert!(bayesian_variance.len() > l_max);

    let mut candidates = Vec::with_capacity(l_max - l_min + 1);
    let mut best: Option<(usize, f64)> = None;

    for level in l_min..=l_max {
        let theta = rates.splitting(tolerance, num_dofs[level]);
        let work = is_admissible_splitting(theta).then(|| {
            predicted_work(
                tolerance,
                theta,
                confidence,
                rates,
                num_dofs,
                bayesian_variance,
                level,
            )
        });

        match work {
            Some(work) => {
                debug!("Candidate level {}: theta = {}, predicted work = {:e}", level, theta, work);
                if best.map(|(_, best_work)| work < best_work).unwrap_or(true) {
                    best = Some((level, work));
                }
            }
            None => debug!("Rejecting candidate level {}: theta = {} outside (0, 1)", level, theta),
        }
        candidates.push(CandidateLevel { level, theta, work });
    }

    let (unconstrained_level, _) = best.ok_or_else(|| {
        let theta = rates.splitting(tolerance, num_dofs[l_max]);
        MlmcError::SplittingRange {
            tolerance,
            theta,
            level: l_max,
        }
    })?;
    let level = unconstrained_level.min(l_min + 1);

    Ok(LevelChoice {
        level,
        unconstrained_level,
        candidates,
        bayesian_variance: bayesian_variance[..=level].to_vec(),
    })
}
