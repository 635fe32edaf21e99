//! The continuation multilevel Monte Carlo controller.
//!
//! A run starts with a screening phase sampling a fixed number of coarse levels, which provides
//! the first rate model. Each following iteration solves the problem for the next tolerance of
//! the [`ToleranceSchedule`](crate::schedule::ToleranceSchedule): it chooses the finest level,
//! allocates new samples, evaluates them as one batch and refits the models. The run has
//! converged once the continuation iterations are exhausted and the estimated total error falls
//! below the current tolerance.
use crate::allocation::allocate_samples;
use crate::bayes::estimate_bayesian_variance;
use crate::error::MlmcError;
use crate::executor::{BatchExecutor, BatchResults, ParallelExecutor, SampleBatch, SampleTask};
use crate::optimizer::{choose_optimal_level, is_admissible_splitting};
use crate::rates::{fit_rates_from_statistics, RateModel};
use crate::report::{IterationReport, MlmcEstimate};
use crate::sampling::RandomInputSampler;
use crate::settings::MlmcSettings;
use crate::statistics::LevelStatisticsMap;
use cmlmc_traits::SampleEvaluator;
use log::{debug, info};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControllerPhase {
    Screening,
    Iterating,
    Converged,
}

/// Mutable state of a run, owned by the caller and advanced by [`MlmcController`].
#[derive(Debug, Clone)]
pub struct ControllerState {
    phase: ControllerPhase,
    iteration: usize,
    tolerance: Option<f64>,
    optimal_level: usize,
    previous_level: usize,
    theta: Option<f64>,
    total_error: Option<f64>,
    differences: LevelStatisticsMap,
    costs: LevelStatisticsMap,
    rates: Option<RateModel>,
    bayesian_variance: Vec<f64>,
    sampler: RandomInputSampler,
    history: Vec<IterationReport>,
}

impl ControllerState {
    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// The number of completed iterations, not counting screening.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn tolerance(&self) -> Option<f64> {
        self.tolerance
    }

    /// The current finest level.
    pub fn optimal_level(&self) -> usize {
        self.optimal_level
    }

    pub fn previous_level(&self) -> usize {
        self.previous_level
    }

    pub fn theta(&self) -> Option<f64> {
        self.theta
    }

    pub fn total_error(&self) -> Option<f64> {
        self.total_error
    }

    /// Statistics of the level differences $Y_l = Q_l - Q_{l-1}$.
    pub fn differences(&self) -> &LevelStatisticsMap {
        &self.differences
    }

    /// Statistics of the cost of a level sample.
    pub fn costs(&self) -> &LevelStatisticsMap {
        &self.costs
    }

    pub fn rates(&self) -> Option<&RateModel> {
        self.rates.as_ref()
    }

    pub fn bayesian_variance(&self) -> &[f64] {
        &self.bayesian_variance
    }

    pub fn history(&self) -> &[IterationReport] {
        &self.history
    }

    pub fn sample_counts(&self) -> Vec<usize> {
        self.differences.counts_up_to(self.optimal_level)
    }

    pub fn level_means(&self) -> Vec<f64> {
        (0..=self.optimal_level)
            .map(|level| {
                self.differences
                    .get(level)
                    .map(|statistics| statistics.mean())
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// The multilevel estimate $\sum_{l \le L} \bar Y_l$ over the current levels.
    pub fn estimate(&self) -> f64 {
        self.level_means().iter().sum()
    }

    fn ingest(&mut self, results: &BatchResults) {
        for outcome in results.iter() {
            self.differences.push(outcome.level, outcome.difference());
            self.costs.push(outcome.level, outcome.cost());
        }
    }
}

pub struct MlmcController<E, X = ParallelExecutor> {
    settings: MlmcSettings,
    num_dofs: Vec<f64>,
    evaluator: E,
    executor: X,
}

impl<E> MlmcController<E>
where
    E: SampleEvaluator,
{
    /// Creates a controller evaluating samples in parallel on the global rayon pool.
    pub fn new(settings: MlmcSettings, evaluator: E) -> Result<Self, MlmcError> {
        settings.validate()?;
        let num_dofs = settings.refinement().num_dofs_up_to(settings.max_level);
        Ok(Self {
            settings,
            num_dofs,
            evaluator,
            executor: ParallelExecutor::new(),
        })
    }
}

impl<E, X> MlmcController<E, X>
where
    E: SampleEvaluator,
    X: BatchExecutor,
{
    pub fn with_executor<Y: BatchExecutor>(self, executor: Y) -> MlmcController<E, Y> {
        MlmcController {
            settings: self.settings,
            num_dofs: self.num_dofs,
            evaluator: self.evaluator,
            executor,
        }
    }

    pub fn settings(&self) -> &MlmcSettings {
        &self.settings
    }

    /// Degrees of freedom of the levels `0 ..= max_level`.
    pub fn num_dofs(&self) -> &[f64] {
        &self.num_dofs
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Creates an empty state in the screening phase.
    pub fn initial_state(&self) -> Result<ControllerState, MlmcError> {
        let sampler = self.settings.random_input.sampler(self.settings.seed)?;
        let finest_screening_level = self.settings.screening_levels - 1;
        Ok(ControllerState {
            phase: ControllerPhase::Screening,
            iteration: 0,
            tolerance: None,
            optimal_level: finest_screening_level,
            previous_level: finest_screening_level,
            theta: None,
            total_error: None,
            differences: LevelStatisticsMap::new(),
            costs: LevelStatisticsMap::new(),
            rates: None,
            bayesian_variance: Vec::new(),
            sampler,
            history: Vec::new(),
        })
    }

    fn evaluate_new_samples(
        &self,
        sampler: &mut RandomInputSampler,
        new_samples: &[usize],
    ) -> Result<BatchResults, MlmcError> {
        let mut batch = SampleBatch::new();
        for (level, &n) in new_samples.iter().enumerate() {
            for _ in 0..n {
                batch.submit(SampleTask {
                    level,
                    draw: sampler.draw(),
                });
            }
        }
        debug!("Evaluating batch of {} samples: {:?}", batch.len(), new_samples);
        batch.join(&self.evaluator, &self.executor, self.settings.max_evaluation_retries)
    }

    /// Samples the screening levels and fits the initial rate model.
    ///
    /// # Panics
    ///
    /// Panics if the state is not in the screening phase.
    pub fn screen(&self, state: &mut ControllerState) -> Result<(), MlmcError> {
        assert_eq!(
            state.phase,
            ControllerPhase::Screening,
            "Screening can only be performed on a fresh state."
        );
        let screening_level = self.settings.screening_levels - 1;
        let new_samples = vec![self.settings.screening_samples; self.settings.screening_levels];

        let results = self.evaluate_new_samples(&mut state.sampler, &new_samples)?;
        state.ingest(&results);

        let rates = fit_rates_from_statistics(&state.differences, &state.costs, &self.num_dofs, screening_level)?;
        state.bayesian_variance = estimate_bayesian_variance(
            &state.differences,
            &self.settings.prior(),
            &rates,
            &self.num_dofs,
            screening_level,
        );
        state.rates = Some(rates);
        state.phase = ControllerPhase::Iterating;

        info!(
            "Screening finished: {} samples on levels 0..={}, rates {:?}",
            self.settings.screening_samples, screening_level, rates
        );
        Ok(())
    }

    /// Performs a single continuation iteration.
    ///
    /// Iterating a converged state continues with the next, smaller tolerance.
    ///
    /// # Panics
    ///
    /// Panics if the state has not been screened.
    pub fn step(&self, state: &mut ControllerState) -> Result<IterationReport, MlmcError> {
        let rates = state.rates.expect("The state must be screened before iterating.");
        let settings = &self.settings;

        if let Some(max_iterations) = settings.max_iterations {
            if state.iteration >= max_iterations {
                return Err(MlmcError::MaximumIterationsReached(max_iterations));
            }
        }

        let schedule = settings.schedule();
        let prior = settings.prior();
        let iteration = state.iteration + 1;
        let tolerance = schedule.tolerance(iteration);
        let previous_level = state.optimal_level;

        let bayesian_variance =
            estimate_bayesian_variance(&state.differences, &prior, &rates, &self.num_dofs, settings.max_level);
        let choice = choose_optimal_level(
            tolerance,
            &rates,
            &self.num_dofs,
            &bayesian_variance,
            previous_level,
            settings.max_level,
            settings.confidence,
        )?;
        let optimal_level = choice.level;

        let theta = rates.splitting(tolerance, self.num_dofs[optimal_level]);
        if !is_admissible_splitting(theta) {
            return Err(MlmcError::SplittingRange {
                tolerance,
                theta,
                level: optimal_level,
            });
        }

        let allocation = allocate_samples(
            optimal_level,
            &choice.bayesian_variance,
            &rates,
            theta,
            tolerance,
            &self.num_dofs,
            settings.confidence,
            &state.differences.counts_up_to(optimal_level),
            settings.min_sample_batch,
        );
        debug!(
            "Iteration {}: allocation {:?} -> {:?}",
            iteration, allocation.previous, allocation.counts
        );

        let results = self.evaluate_new_samples(&mut state.sampler, &allocation.delta)?;
        state.ingest(&results);

        let rates = fit_rates_from_statistics(&state.differences, &state.costs, &self.num_dofs, optimal_level)?;
        let bayesian_variance =
            estimate_bayesian_variance(&state.differences, &prior, &rates, &self.num_dofs, optimal_level);

        let bias = state
            .differences
            .get(optimal_level)
            .map(|statistics| statistics.mean().abs())
            .unwrap_or(0.0);
        let statistical_variance: f64 = bayesian_variance
            .iter()
            .enumerate()
            .map(|(level, variance)| variance / state.differences.count(level) as f64)
            .sum();
        let total_error = bias + settings.confidence * statistical_variance.sqrt();

        state.iteration = iteration;
        state.tolerance = Some(tolerance);
        state.previous_level = previous_level;
        state.optimal_level = optimal_level;
        state.theta = Some(theta);
        state.total_error = Some(total_error);
        state.rates = Some(rates);
        state.bayesian_variance = bayesian_variance;

        let converged = iteration >= schedule.num_continuation_iterations() && total_error < tolerance;
        state.phase = if converged {
            ControllerPhase::Converged
        } else {
            ControllerPhase::Iterating
        };

        let report = IterationReport {
            iteration,
            tolerance,
            optimal_level,
            previous_level,
            theta,
            candidates: choice.candidates,
            sample_counts: allocation.counts,
            new_samples: allocation.delta,
            estimate: state.estimate(),
            total_error,
            rates,
            converged,
        };
        info!(
            "Iteration {}: tol = {:.4e}, L = {}, theta = {:.4}, estimate = {:.6e}, total error = {:.4e}",
            iteration, tolerance, optimal_level, theta, report.estimate, total_error
        );
        state.history.push(report.clone());
        Ok(report)
    }

    /// Runs screening and iterations until convergence.
    pub fn run(&self) -> Result<MlmcEstimate, MlmcError> {
        let mut state = self.initial_state()?;
        self.screen(&mut state)?;

        let mut report = self.step(&mut state)?;
        while !report.converged {
            report = self.step(&mut state)?;
        }

        info!(
            "Converged after {} iterations: estimate = {:.6e}, total error = {:.4e}",
            report.iteration, report.estimate, report.total_error
        );
        Ok(MlmcEstimate {
            expectation: report.estimate,
            total_error: report.total_error,
            iterations: report.iteration,
            optimal_level: report.optimal_level,
            sample_counts: report.sample_counts,
            level_means: state.level_means(),
            rates: report.rates,
            history: state.history,
        })
    }
}
