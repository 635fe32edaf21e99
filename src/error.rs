//! Error types for the multilevel Monte Carlo controller.
use cmlmc_optimize::regression::RegressionError;
use cmlmc_traits::EvaluationError;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// The quantity a rate model is fitted to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FittedQuantity {
    /// Absolute mean of the level differences.
    Bias,
    /// Sample variance of the level differences.
    Variance,
    /// Mean cost of a level sample.
    Cost,
}

impl Display for FittedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            FittedQuantity::Bias => write!(f, "bias"),
            FittedQuantity::Variance => write!(f, "variance"),
            FittedQuantity::Cost => write!(f, "cost"),
        }
    }
}

#[derive(Debug)]
pub enum MlmcError {
    /// A value entering a logarithmic fit is not strictly positive.
    Domain {
        quantity: FittedQuantity,
        level: usize,
        value: f64,
    },
    /// Too few levels are available to determine a rate model.
    InsufficientData {
        quantity: FittedQuantity,
        available_levels: usize,
    },
    /// The splitting parameter is outside of `(0, 1)` for every admissible level.
    SplittingRange { tolerance: f64, theta: f64, level: usize },
    /// A sample evaluation kept failing after all retries.
    EvaluationFailed {
        level: usize,
        draw: f64,
        attempts: usize,
        source: EvaluationError,
    },
    /// The controller did not converge within the maximum number of iterations.
    MaximumIterationsReached(usize),
    /// The settings are inconsistent.
    InvalidSettings(String),
}

impl MlmcError {
    pub(crate) fn from_regression(
        err: RegressionError,
        quantity: FittedQuantity,
        levels: &[usize],
        values: &[f64],
    ) -> Self {
        match err {
            RegressionError::NonPositiveOrdinate { index } => MlmcError::Domain {
                quantity,
                level: levels[index],
                value: values[index],
            },
            RegressionError::NonPositiveAbscissa { index } => MlmcError::InvalidSettings(format!(
                "Number of degrees of freedom at level {} is not positive.",
                levels[index]
            )),
            RegressionError::InsufficientData { .. } | RegressionError::LengthMismatch { .. } => {
                MlmcError::InsufficientData {
                    quantity,
                    available_levels: levels.len(),
                }
            }
        }
    }
}

impl Display for MlmcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            &MlmcError::Domain { quantity, level, value } => {
                write!(
                    f,
                    "Cannot fit {} rate: value {} at level {} is not strictly positive.",
                    quantity, value, level
                )
            }
            &MlmcError::InsufficientData {
                quantity,
                available_levels,
            } => {
                write!(
                    f,
                    "Cannot fit {} rate: need at least 2 levels, got {}.",
                    quantity, available_levels
                )
            }
            &MlmcError::SplittingRange { tolerance, theta, level } => {
                write!(
                    f,
                    "The splitting parameter theta = {} at level {} is outside the range (0, 1) for tolerance {}.",
                    theta, level, tolerance
                )
            }
            &MlmcError::EvaluationFailed {
                level,
                draw,
                attempts,
                ref source,
            } => {
                write!(
                    f,
                    "Evaluation at level {} with random draw {} failed after {} attempts. Error: {}",
                    level, draw, attempts, source
                )
            }
            &MlmcError::MaximumIterationsReached(maxit) => {
                write!(f, "Failed to converge within maximum number of iterations ({}).", maxit)
            }
            &MlmcError::InvalidSettings(ref msg) => {
                write!(f, "Invalid settings: {}", msg)
            }
        }
    }
}

impl Error for MlmcError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlmcError::EvaluationFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
