//! Geometric hierarchy of discretization levels.
use serde::{Deserialize, Serialize};

/// Uniform refinement of a two-dimensional mesh.
///
/// Level $l$ has $N_0 M^l$ elements along each boundary line, giving
/// $\mathrm{nDoF}(l) = (N_0 M^l)^2$ degrees of freedom.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformRefinement {
    /// $N_0$, the number of elements along a boundary line on the coarsest level.
    pub coarse_resolution: f64,
    /// $M$, the factor by which the resolution grows from one level to the next.
    pub refinement_factor: f64,
}

impl Default for UniformRefinement {
    fn default() -> Self {
        Self {
            coarse_resolution: 5.0,
            refinement_factor: 2.0,
        }
    }
}

impl UniformRefinement {
    pub fn new(coarse_resolution: f64, refinement_factor: f64) -> Self {
        Self {
            coarse_resolution,
            refinement_factor,
        }
    }

    pub fn num_dofs(&self, level: usize) -> f64 {
        let resolution = self.coarse_resolution * self.refinement_factor.powi(level as i32);
        resolution * resolution
    }

    /// Degrees of freedom for every level `0 ..= max_level`.
    pub fn num_dofs_up_to(&self, max_level: usize) -> Vec<f64> {
        (0..=max_level).map(|level| self.num_dofs(level)).collect()
    }
}
