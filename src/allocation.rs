//! Distribution of new samples over the levels.
use crate::optimizer::cost_weighted_deviation_sum;
use crate::rates::RateModel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleAllocation {
    /// Total number of samples per level after the new samples have been drawn.
    pub counts: Vec<usize>,
    /// Number of new samples to draw per level.
    pub delta: Vec<usize>,
    /// Number of samples per level before this allocation.
    pub previous: Vec<usize>,
}

impl SampleAllocation {
    pub fn total_new_samples(&self) -> usize {
        self.delta.iter().sum()
    }
}

/// Optimal number of samples per level for the levels `0 ..= l_opt`,
///
/// $$
/// N_l = \left\lceil \left(\frac{C_\phi}{\theta \, \mathrm{tol}}\right)^2
///       \sqrt{\frac{\hat V_l}{C_l}} \sum_{j=0}^{L} \sqrt{C_j \hat V_j} \right\rceil,
/// $$
///
/// which minimizes the total cost subject to the statistical error meeting
/// $\theta \, \mathrm{tol}$.
///
/// # Panics
///
/// Panics if `num_dofs` or `bayesian_variance` has fewer than `l_opt + 1` entries.
pub fn optimal_sample_counts(
    l_opt: usize,
    bayesian_variance: &[f64],
    rates: &RateModel,
    theta: f64,
    tolerance: f64,
    num_dofs: &[f64],
    confidence: f64,
) -> Vec<usize> {
    let variance = &bayesian_variance[..=l_opt];
    let num_dofs = &num_dofs[..=l_opt];
    let scale = confidence / (theta * tolerance);
    let sum = cost_weighted_deviation_sum(rates, num_dofs, variance);

    variance
        .iter()
        .zip(num_dofs)
        .map(|(&v, &ndof)| {
            let n = scale * scale * (v / rates.cost(ndof)).sqrt() * sum;
            n.ceil() as usize
        })
        .collect()
}

/// Allocates new samples for the levels `0 ..= l_opt`.
///
/// The number of samples on a level never decreases. A positive increase smaller than
/// `min_batch` is raised to `min_batch`, and a level without any samples always receives at
/// least `min_batch` samples. `current` may be shorter than `l_opt + 1`, missing levels have
/// no samples.
///
/// # Panics
///
/// Panics if `num_dofs` or `bayesian_variance` has fewer than `l_opt + 1` entries.
pub fn allocate_samples(
    l_opt: usize,
    bayesian_variance: &[f64],
    rates: &RateModel,
    theta: f64,
    tolerance: f64,
    num_dofs: &[f64],
    confidence: f64,
    current: &[usize],
    min_batch: usize,
) -> SampleAllocation {
    let optimal = optimal_sample_counts(l_opt, bayesian_variance, rates, theta, tolerance, num_dofs, confidence);

    let previous: Vec<usize> = (0..=l_opt)
        .map(|level| current.get(level).copied().unwrap_or(0))
        .collect();

    let delta: Vec<usize> = optimal
        .iter()
        .zip(&previous)
        .map(|(&n_opt, &n_prev)| {
            let increase = n_opt.saturating_sub(n_prev);
            if n_prev == 0 || (increase > 0 && increase < min_batch) {
                increase.max(min_batch)
            } else {
                increase
            }
        })
        .collect();

    let counts = previous.iter().zip(&delta).map(|(n, dn)| n + dn).collect();

    SampleAllocation {
        counts,
        delta,
        previous,
    }
}
