//! Configuration of the controller.
use crate::bayes::VariancePrior;
use crate::error::MlmcError;
use crate::hierarchy::UniformRefinement;
use crate::sampling::RandomInput;
use crate::schedule::ToleranceSchedule;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_SEED: u64 = 42;

/// Settings of a continuation multilevel Monte Carlo run.
///
/// Missing keys take their default values when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MlmcSettings {
    /// $N_0$, elements along a boundary line on level 0.
    pub coarse_resolution: f64,
    /// $M$, refinement factor between consecutive levels.
    pub refinement_factor: f64,
    /// Certainty of the prior mean of the level differences.
    pub k0: f64,
    /// Certainty of the prior variance of the level differences.
    pub k1: f64,
    /// Tolerance reduction rate of the first iterations.
    pub r1: f64,
    /// Tolerance reduction rate of the final iterations.
    pub r2: f64,
    pub initial_tolerance: f64,
    pub final_tolerance: f64,
    /// $C_\phi$, the confidence factor on the statistical error.
    pub confidence: f64,
    /// Number of levels sampled during screening, starting from level 0.
    ///
    /// At least three levels are needed to fit the bias and variance rates.
    pub screening_levels: usize,
    /// Number of samples per level drawn during screening.
    pub screening_samples: usize,
    /// Smallest number of samples added to a level at once.
    pub min_sample_batch: usize,
    /// The finest level available.
    pub max_level: usize,
    pub max_iterations: Option<usize>,
    /// Number of times a failed evaluation is retried before the run is aborted.
    pub max_evaluation_retries: usize,
    pub seed: u64,
    pub random_input: RandomInput,
}

impl Default for MlmcSettings {
    fn default() -> Self {
        let refinement = UniformRefinement::default();
        let prior = VariancePrior::default();
        let schedule = ToleranceSchedule::default();
        Self {
            coarse_resolution: refinement.coarse_resolution,
            refinement_factor: refinement.refinement_factor,
            k0: prior.k0,
            k1: prior.k1,
            r1: schedule.r1,
            r2: schedule.r2,
            initial_tolerance: schedule.initial_tolerance,
            final_tolerance: schedule.final_tolerance,
            confidence: 1.0,
            screening_levels: 3,
            screening_samples: 25,
            min_sample_batch: 6,
            max_level: 4,
            max_iterations: Some(100),
            max_evaluation_retries: 2,
            seed: DEFAULT_SEED,
            random_input: RandomInput::default(),
        }
    }
}

impl MlmcSettings {
    pub fn refinement(&self) -> UniformRefinement {
        UniformRefinement::new(self.coarse_resolution, self.refinement_factor)
    }

    pub fn prior(&self) -> VariancePrior {
        VariancePrior { k0: self.k0, k1: self.k1 }
    }

    pub fn schedule(&self) -> ToleranceSchedule {
        ToleranceSchedule {
            initial_tolerance: self.initial_tolerance,
            final_tolerance: self.final_tolerance,
            r1: self.r1,
            r2: self.r2,
        }
    }

    /// Checks that the settings describe a well-posed run.
    pub fn validate(&self) -> Result<(), MlmcError> {
        let invalid = |msg: &str| Err(MlmcError::InvalidSettings(msg.to_string()));

        if !(self.coarse_resolution > 0.0) {
            return invalid("coarse_resolution must be positive");
        }
        if !(self.refinement_factor > 1.0) {
            return invalid("refinement_factor must be greater than 1");
        }
        if !(self.k0 >= 0.0) {
            return invalid("k0 must be non-negative");
        }
        if !(self.k1 > 0.0) {
            return invalid("k1 must be positive");
        }
        if !(self.r1 > 1.0) || !(self.r2 > 1.0) {
            return invalid("r1 and r2 must be greater than 1");
        }
        if !(self.final_tolerance > 0.0) || !(self.initial_tolerance >= self.final_tolerance) {
            return invalid("tolerances must satisfy 0 < final_tolerance <= initial_tolerance");
        }
        if !(self.confidence > 0.0) {
            return invalid("confidence must be positive");
        }
        if self.screening_levels < 3 || self.screening_levels > self.max_level + 1 {
            return invalid("screening_levels must be between 3 and max_level + 1");
        }
        if self.screening_samples < 2 {
            return invalid("screening_samples must be at least 2");
        }
        if self.min_sample_batch < 2 {
            return invalid("min_sample_batch must be at least 2");
        }
        if self.max_iterations == Some(0) {
            return invalid("max_iterations must be at least 1");
        }
        self.random_input.sampler(self.seed).map(|_| ())
    }

    /// Parses settings from JSON and validates them.
    pub fn from_json_str(json: &str) -> eyre::Result<Self> {
        let settings: Self = serde_json::from_str(json).wrap_err("Failed to parse MLMC settings")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json =
            fs::read_to_string(path).wrap_err_with(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json_str(&json)
    }
}
