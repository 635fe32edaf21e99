//! Summaries of controller iterations and of the final estimate.
use crate::optimizer::CandidateLevel;
use crate::rates::RateModel;
use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Summary of a single controller iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationReport {
    pub iteration: usize,
    pub tolerance: f64,
    pub optimal_level: usize,
    pub previous_level: usize,
    pub theta: f64,
    pub candidates: Vec<CandidateLevel>,
    /// Total number of samples per level after the iteration.
    pub sample_counts: Vec<usize>,
    /// Number of samples drawn per level during the iteration.
    pub new_samples: Vec<usize>,
    pub estimate: f64,
    pub total_error: f64,
    pub rates: RateModel,
    pub converged: bool,
}

/// Result of a converged multilevel Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlmcEstimate {
    /// The multilevel estimate $\sum_l \bar Y_l$ of the expected quantity of interest.
    pub expectation: f64,
    pub total_error: f64,
    pub iterations: usize,
    pub optimal_level: usize,
    pub sample_counts: Vec<usize>,
    /// Sample means of the level differences.
    pub level_means: Vec<f64>,
    pub rates: RateModel,
    pub history: Vec<IterationReport>,
}

impl MlmcEstimate {
    /// Relative deviation $|\hat E - E| / |E|$ from a known reference expectation.
    pub fn relative_error(&self, reference: f64) -> f64 {
        (self.expectation - reference).abs() / reference.abs()
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        let path = path.as_ref();
        let file = File::create(path).wrap_err_with(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).wrap_err("Failed to write estimate as JSON")?;
        writer.flush()?;
        Ok(())
    }
}
