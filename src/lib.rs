//! Continuation multilevel Monte Carlo.
//!
//! Estimates the expectation of a quantity of interest of a model with random input, given a
//! hierarchy of increasingly accurate and expensive discretizations. The model is only accessed
//! through the [`SampleEvaluator`] trait. Everything else, from screening the hierarchy and
//! fitting rate models to distributing samples over the levels and deciding convergence, is
//! handled by [`controller::MlmcController`].
pub mod allocation;
pub mod bayes;
pub mod controller;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod hierarchy;
pub mod optimizer;
pub mod rates;
pub mod report;
pub mod sampling;
pub mod schedule;
pub mod settings;
pub mod statistics;

pub mod optimize {
    pub use cmlmc_optimize::*;
}

pub use cmlmc_traits::{Evaluation, EvaluationError, Real, SampleEvaluator};

pub extern crate nalgebra;
