//! Continuation schedule of tolerances.
use serde::{Deserialize, Serialize};

/// Geometric sequence of tolerances approaching the final tolerance.
///
/// With $i_E = \lfloor (-\ln \mathrm{tol}_F + \ln r_2 + \ln \mathrm{tol}_0) / \ln r_1 \rfloor$,
/// the tolerance of iteration $i$ is
///
/// $$
/// \mathrm{tol}_i = \begin{cases}
///   r_1^{i_E - i} \, r_2^{-1} \, \mathrm{tol}_F & i \le i_E, \\\\
///   r_2^{i_E - i} \, r_2^{-1} \, \mathrm{tol}_F & i > i_E.
/// \end{cases}
/// $$
///
/// The first $i_E$ iterations decrease the tolerance quickly with rate $r_1$ until it drops
/// below $\mathrm{tol}_F$, after which it keeps decreasing slowly with rate $r_2$.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceSchedule {
    pub initial_tolerance: f64,
    pub final_tolerance: f64,
    pub r1: f64,
    pub r2: f64,
}

impl Default for ToleranceSchedule {
    fn default() -> Self {
        Self {
            initial_tolerance: 0.25,
            final_tolerance: 0.1,
            r1: 1.25,
            r2: 1.15,
        }
    }
}

impl ToleranceSchedule {
    /// The number of iterations $i_E$ after which convergence may be declared.
    pub fn num_continuation_iterations(&self) -> usize {
        let i_e = (-self.final_tolerance.ln() + self.r2.ln() + self.initial_tolerance.ln()) / self.r1.ln();
        i_e.floor().max(0.0) as usize
    }

    /// The tolerance of the given (1-based) iteration.
    pub fn tolerance(&self, iteration: usize) -> f64 {
        let i_e = self.num_continuation_iterations() as i32;
        let exponent = i_e - iteration as i32;
        let base = if iteration as i32 <= i_e { self.r1 } else { self.r2 };
        base.powi(exponent) * self.final_tolerance / self.r2
    }
}
