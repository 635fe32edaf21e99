//! Adapters implementing [`SampleEvaluator`] on top of plain functions.
use cmlmc_traits::{Evaluation, EvaluationError, SampleEvaluator};
use std::time::Instant;

/// Evaluator reporting the wall-clock time of each call as its cost.
///
/// Wraps a function `(level, draw) -> quantity of interest`, typically a complete simulation
/// run on the discretization of the given level.
///
/// The measured time must be strictly positive for the cost fit to succeed, which only
/// matters for functions too cheap to be resolved by the system clock.
#[derive(Debug, Clone)]
pub struct TimedEvaluator<F> {
    function: F,
}

impl<F> TimedEvaluator<F>
where
    F: Fn(usize, f64) -> Result<f64, EvaluationError> + Sync,
{
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> SampleEvaluator for TimedEvaluator<F>
where
    F: Fn(usize, f64) -> Result<f64, EvaluationError> + Sync,
{
    fn evaluate(&self, level: usize, draw: f64) -> Result<Evaluation, EvaluationError> {
        let start = Instant::now();
        let quantity_of_interest = (self.function)(level, draw)?;
        let cost = start.elapsed().as_secs_f64();
        Ok(Evaluation::new(quantity_of_interest, cost))
    }
}

/// Evaluator backed by a function returning both the quantity of interest and its cost.
#[derive(Debug, Clone)]
pub struct FnEvaluator<F> {
    function: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(usize, f64) -> Result<Evaluation, EvaluationError> + Sync,
{
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> SampleEvaluator for FnEvaluator<F>
where
    F: Fn(usize, f64) -> Result<Evaluation, EvaluationError> + Sync,
{
    fn evaluate(&self, level: usize, draw: f64) -> Result<Evaluation, EvaluationError> {
        (self.function)(level, draw)
    }
}
