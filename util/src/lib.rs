//! Shared helpers for tests and benchmarks: synthetic evaluators with known rates and
//! assertion macros.
use cmlmc_traits::{Evaluation, EvaluationError, SampleEvaluator};
use parking_lot::Mutex;

/// Poor man's approx assertion for slices of floats
#[macro_export]
macro_rules! assert_approx_slice_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let x: &[f64] = &$x;
        let y: &[f64] = &$y;
        assert_eq!(x.len(), y.len(), "Slices must have the same length.");

        let max_absdiff = x
            .iter()
            .zip(y)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {:?}", x);
            println!("right: {:?}", y);
            println!("max absdiff: {:e}", max_absdiff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Synthetic model with exactly known bias, variance and cost rates.
///
/// With $h_l = C \, \mathrm{nDoF}_l^{-a}$ and $\mathrm{nDoF}_l = (N_0 M^l)^2$, the quantity of
/// interest on level $l$ for the draw $x$ is
///
/// $$ Q_l(x) = E + h_l \left(1 + s (x - \mu)\right), $$
///
/// where $\mu$ is the mean of the random input. Hence $E[Q_l] = E + h_l$ converges to $E$, the
/// level differences have mean $\propto \mathrm{nDoF}_l^{-a}$ and variance
/// $\propto \mathrm{nDoF}_l^{-2a}$, and the cost of a single evaluation is
/// $c \, \mathrm{nDoF}_l^{\gamma}$.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeometricEvaluator {
    pub coarse_resolution: f64,
    pub refinement_factor: f64,
    pub expectation: f64,
    pub bias_coefficient: f64,
    pub bias_rate: f64,
    pub noise: f64,
    pub input_mean: f64,
    pub cost_coefficient: f64,
    pub cost_rate: f64,
}

impl Default for GeometricEvaluator {
    fn default() -> Self {
        Self {
            coarse_resolution: 5.0,
            refinement_factor: 2.0,
            expectation: 1.0,
            bias_coefficient: 1.0,
            bias_rate: 0.5,
            noise: 4.0,
            // Mean of Beta(2, 6)
            input_mean: 0.25,
            cost_coefficient: 1e-4,
            cost_rate: 1.0,
        }
    }
}

impl GeometricEvaluator {
    pub fn num_dofs(&self, level: usize) -> f64 {
        (self.coarse_resolution * self.refinement_factor.powi(level as i32)).powi(2)
    }

    /// The discretization error $h_l$ on the given level.
    pub fn discretization_error(&self, level: usize) -> f64 {
        self.bias_coefficient * self.num_dofs(level).powf(-self.bias_rate)
    }

    pub fn quantity_of_interest(&self, level: usize, draw: f64) -> f64 {
        let h = self.discretization_error(level);
        self.expectation + h * (1.0 + self.noise * (draw - self.input_mean))
    }

    pub fn cost(&self, level: usize) -> f64 {
        self.cost_coefficient * self.num_dofs(level).powf(self.cost_rate)
    }
}

impl SampleEvaluator for GeometricEvaluator {
    fn evaluate(&self, level: usize, draw: f64) -> Result<Evaluation, EvaluationError> {
        Ok(Evaluation::new(self.quantity_of_interest(level, draw), self.cost(level)))
    }
}

/// Wraps an evaluator and records every call made to it.
#[derive(Debug, Default)]
pub struct RecordingEvaluator<E> {
    inner: E,
    calls: Mutex<Vec<(usize, f64)>>,
}

impl<E> RecordingEvaluator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All `(level, draw)` pairs evaluated so far, in no particular order.
    pub fn calls(&self) -> Vec<(usize, f64)> {
        self.calls.lock().clone()
    }

    pub fn num_calls(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn num_calls_on_level(&self, level: usize) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }
}

impl<E: SampleEvaluator> SampleEvaluator for RecordingEvaluator<E> {
    fn evaluate(&self, level: usize, draw: f64) -> Result<Evaluation, EvaluationError> {
        self.calls.lock().push((level, draw));
        self.inner.evaluate(level, draw)
    }
}

/// Evaluator whose first `failures` calls fail, after which it delegates to the wrapped evaluator.
#[derive(Debug)]
pub struct FlakyEvaluator<E> {
    inner: E,
    remaining_failures: Mutex<usize>,
}

impl<E> FlakyEvaluator<E> {
    pub fn new(inner: E, failures: usize) -> Self {
        Self {
            inner,
            remaining_failures: Mutex::new(failures),
        }
    }

    pub fn remaining_failures(&self) -> usize {
        *self.remaining_failures.lock()
    }
}

impl<E: SampleEvaluator> SampleEvaluator for FlakyEvaluator<E> {
    fn evaluate(&self, level: usize, draw: f64) -> Result<Evaluation, EvaluationError> {
        {
            let mut remaining = self.remaining_failures.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(format!("simulated failure at level {}", level).into());
            }
        }
        self.inner.evaluate(level, draw)
    }
}

/// Evaluator that always fails on one particular level.
#[derive(Debug, Copy, Clone)]
pub struct FailingEvaluator<E> {
    pub inner: E,
    pub failing_level: usize,
}

impl<E: SampleEvaluator> SampleEvaluator for FailingEvaluator<E> {
    fn evaluate(&self, level: usize, draw: f64) -> Result<Evaluation, EvaluationError> {
        if level == self.failing_level {
            Err(format!("level {} is broken", level).into())
        } else {
            self.inner.evaluate(level, draw)
        }
    }
}
