use nalgebra::RealField;
use std::error::Error;

pub use nalgebra;

pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// Error type returned by a failed sample evaluation.
pub type EvaluationError = Box<dyn Error + Send + Sync>;

/// The outcome of evaluating the underlying model once.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Evaluation {
    /// The scalar quantity of interest produced by the run.
    pub quantity_of_interest: f64,
    /// The cost of producing the quantity of interest, typically wall-clock seconds.
    pub cost: f64,
}

impl Evaluation {
    pub fn new(quantity_of_interest: f64, cost: f64) -> Self {
        Self {
            quantity_of_interest,
            cost,
        }
    }
}

/// A black-box sampler evaluated on a hierarchy of discretization levels.
///
/// Implementations must be safe to call concurrently from several threads. Each call is
/// independent: the same `(level, draw)` pair may be evaluated more than once if a previous
/// attempt failed.
pub trait SampleEvaluator: Sync {
    /// Evaluate the model at the given level for the given realization of the random input.
    fn evaluate(&self, level: usize, draw: f64) -> Result<Evaluation, EvaluationError>;
}

impl<E> SampleEvaluator for &E
where
    E: SampleEvaluator + ?Sized,
{
    fn evaluate(&self, level: usize, draw: f64) -> Result<Evaluation, EvaluationError> {
        E::evaluate(self, level, draw)
    }
}
