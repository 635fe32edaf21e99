//! Random inputs for the sampled model.
use crate::error::MlmcError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Beta, Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Distribution of the scalar random input passed to the evaluator.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum RandomInput {
    Beta { alpha: f64, beta: f64 },
    Normal { mean: f64, std_dev: f64 },
}

impl Default for RandomInput {
    fn default() -> Self {
        RandomInput::Beta { alpha: 2.0, beta: 6.0 }
    }
}

impl RandomInput {
    /// Creates a sampler drawing from this distribution with a generator seeded by `seed`.
    pub fn sampler(&self, seed: u64) -> Result<RandomInputSampler, MlmcError> {
        let distribution = match *self {
            RandomInput::Beta { alpha, beta } => Beta::new(alpha, beta)
                .map(InputDistribution::Beta)
                .map_err(|err| MlmcError::InvalidSettings(format!("Invalid beta distribution: {}", err)))?,
            RandomInput::Normal { mean, std_dev } => Normal::new(mean, std_dev)
                .map(InputDistribution::Normal)
                .map_err(|err| MlmcError::InvalidSettings(format!("Invalid normal distribution: {}", err)))?,
        };
        Ok(RandomInputSampler {
            distribution,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

#[derive(Debug, Clone)]
enum InputDistribution {
    Beta(Beta<f64>),
    Normal(Normal<f64>),
}

/// Seeded source of random input draws.
#[derive(Debug, Clone)]
pub struct RandomInputSampler {
    distribution: InputDistribution,
    rng: StdRng,
}

impl RandomInputSampler {
    pub fn draw(&mut self) -> f64 {
        match &self.distribution {
            InputDistribution::Beta(beta) => beta.sample(&mut self.rng),
            InputDistribution::Normal(normal) => normal.sample(&mut self.rng),
        }
    }
}
