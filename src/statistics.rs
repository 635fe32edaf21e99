//! Streaming moment estimation per level.
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// One step of Welford's online algorithm.
///
/// Given the running mean and second-moment accumulator
/// $M_{2,n-1} = \sum_{i<n} (x_i - \bar x_{n-1})^2$ of the first $n - 1$ samples,
/// returns the updated mean and accumulator after including `sample` as the $n$-th sample.
/// For $n = 1$ the prior state is ignored.
///
/// # Panics
///
/// Panics if `n == 0`.
pub fn update_moments(sample: f64, mean: f64, m2: f64, n: usize) -> (f64, f64) {
    assert!(n >= 1, "Sample count must be at least 1 after including the new sample.");
    if n == 1 {
        (sample, 0.0)
    } else {
        let delta = sample - mean;
        let new_mean = mean + delta / n as f64;
        let new_m2 = m2 + delta * (sample - new_mean);
        (new_mean, new_m2)
    }
}

/// Running count, mean and second moment of the samples drawn on a single level.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelStatistics {
    count: usize,
    mean: f64,
    m2: f64,
}

impl LevelStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let mut statistics = Self::new();
        statistics.extend(samples);
        statistics
    }

    pub fn push(&mut self, sample: f64) {
        self.count += 1;
        let (mean, m2) = update_moments(sample, self.mean, self.m2, self.count);
        self.mean = mean;
        self.m2 = m2;
    }

    pub fn extend(&mut self, samples: impl IntoIterator<Item = f64>) {
        for sample in samples {
            self.push(sample);
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// The accumulated sum of squared deviations from the mean.
    pub fn m2(&self) -> f64 {
        self.m2
    }

    /// The unbiased sample variance $M_2 / (n - 1)$, or `None` for fewer than two samples.
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count >= 2).then(|| self.m2 / (self.count - 1) as f64)
    }
}

/// Statistics for a set of levels, created lazily when a level receives its first sample.
///
/// A level without samples has no entry at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelStatisticsMap {
    levels: BTreeMap<usize, LevelStatistics>,
}

impl LevelStatisticsMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, level: usize) -> Option<&LevelStatistics> {
        self.levels.get(&level)
    }

    pub fn push(&mut self, level: usize, sample: f64) {
        self.levels.entry(level).or_default().push(sample);
    }

    /// Number of samples on the given level, zero if the level has never been sampled.
    pub fn count(&self, level: usize) -> usize {
        self.get(level).map(LevelStatistics::count).unwrap_or(0)
    }

    /// Sample counts for the levels `0 ..= max_level`.
    pub fn counts_up_to(&self, max_level: usize) -> Vec<usize> {
        (0..=max_level).map(|level| self.count(level)).collect()
    }

    /// The finest level with at least one sample.
    pub fn finest_level(&self) -> Option<usize> {
        self.levels.keys().next_back().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<usize, LevelStatistics> {
        self.levels.iter()
    }
}
