//! Submission and joining of batches of sample evaluations.
//!
//! Evaluations are collected into a [`SampleBatch`] with [`SampleBatch::submit`], which returns a
//! [`TaskHandle`]. [`SampleBatch::join`] dispatches the whole batch to a [`BatchExecutor`] and
//! only returns once every evaluation has completed, so that results are never observed
//! for a partially evaluated batch.
use crate::error::MlmcError;
use cmlmc_traits::{Evaluation, SampleEvaluator};
use log::warn;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::ops::Index;
use std::sync::Arc;

/// A single multilevel sample: the level and the random draw it is evaluated for.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampleTask {
    pub level: usize,
    pub draw: f64,
}

/// Evaluations belonging to one [`SampleTask`].
///
/// For `level > 0` the model is evaluated on both `level` and `level - 1` with the same draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampleOutcome {
    pub level: usize,
    pub draw: f64,
    pub fine: Evaluation,
    pub coarse: Option<Evaluation>,
}

impl SampleOutcome {
    /// The control-variate difference $Y_l = Q_l - Q_{l-1}$, with $Q_{-1} = 0$.
    pub fn difference(&self) -> f64 {
        let coarse = self
            .coarse
            .map(|coarse| coarse.quantity_of_interest)
            .unwrap_or(0.0);
        self.fine.quantity_of_interest - coarse
    }

    /// The combined cost of all evaluations of the sample.
    pub fn cost(&self) -> f64 {
        self.fine.cost + self.coarse.map(|coarse| coarse.cost).unwrap_or(0.0)
    }
}

fn evaluate_with_retries<E>(evaluator: &E, level: usize, draw: f64, max_retries: usize) -> Result<Evaluation, MlmcError>
where
    E: SampleEvaluator + ?Sized,
{
    let mut attempt = 1;
    loop {
        match evaluator.evaluate(level, draw) {
            Ok(evaluation) => return Ok(evaluation),
            Err(err) if attempt <= max_retries => {
                warn!(
                    "Evaluation at level {} with draw {} failed (attempt {} of {}): {}. Retrying.",
                    level,
                    draw,
                    attempt,
                    max_retries + 1,
                    err
                );
                attempt += 1;
            }
            Err(err) => {
                return Err(MlmcError::EvaluationFailed {
                    level,
                    draw,
                    attempts: attempt,
                    source: err,
                })
            }
        }
    }
}

/// Evaluates a task, retrying each failing evaluation with the same draw up to `max_retries` times.
///
/// If `parallel_pair` is set, the fine and coarse evaluations of the task run concurrently
/// on the current rayon pool.
pub fn evaluate_task<E>(
    evaluator: &E,
    task: &SampleTask,
    max_retries: usize,
    parallel_pair: bool,
) -> Result<SampleOutcome, MlmcError>
where
    E: SampleEvaluator + ?Sized,
{
    let SampleTask { level, draw } = *task;
    let fine = || evaluate_with_retries(evaluator, level, draw, max_retries);
    let coarse = || {
        level
            .checked_sub(1)
            .map(|coarse_level| evaluate_with_retries(evaluator, coarse_level, draw, max_retries))
            .transpose()
    };

    let (fine, coarse) = if parallel_pair {
        rayon::join(fine, coarse)
    } else {
        (fine(), coarse())
    };

    Ok(SampleOutcome {
        level,
        draw,
        fine: fine?,
        coarse: coarse?,
    })
}

/// Strategy for evaluating a batch of tasks.
///
/// Implementations must return one result per task, in the order of `tasks`, and must not
/// return before every task has finished.
pub trait BatchExecutor {
    fn execute<E>(
        &self,
        evaluator: &E,
        tasks: &[SampleTask],
        max_retries: usize,
    ) -> Vec<Result<SampleOutcome, MlmcError>>
    where
        E: SampleEvaluator + ?Sized;
}

/// Evaluates all tasks one after the other on the calling thread.
#[derive(Debug, Copy, Clone, Default)]
pub struct SerialExecutor;

impl BatchExecutor for SerialExecutor {
    fn execute<E>(
        &self,
        evaluator: &E,
        tasks: &[SampleTask],
        max_retries: usize,
    ) -> Vec<Result<SampleOutcome, MlmcError>>
    where
        E: SampleEvaluator + ?Sized,
    {
        tasks
            .iter()
            .map(|task| evaluate_task(evaluator, task, max_retries, false))
            .collect()
    }
}

/// Evaluates tasks concurrently with `rayon`.
///
/// Uses the global rayon pool unless constructed with a dedicated pool.
#[derive(Debug, Clone, Default)]
pub struct ParallelExecutor {
    pool: Option<Arc<ThreadPool>>,
}

impl ParallelExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor running on a dedicated pool with the given number of threads.
    pub fn with_num_threads(num_threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new().num_threads(num_threads).build()?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }
}

impl BatchExecutor for ParallelExecutor {
    fn execute<E>(
        &self,
        evaluator: &E,
        tasks: &[SampleTask],
        max_retries: usize,
    ) -> Vec<Result<SampleOutcome, MlmcError>>
    where
        E: SampleEvaluator + ?Sized,
    {
        let run = || {
            tasks
                .par_iter()
                .map(|task| evaluate_task(evaluator, task, max_retries, true))
                .collect::<Vec<_>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

/// Handle to a task submitted to a [`SampleBatch`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle(usize);

/// A batch of tasks awaiting evaluation.
#[derive(Debug, Clone, Default)]
pub struct SampleBatch {
    tasks: Vec<SampleTask>,
}

impl SampleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, task: SampleTask) -> TaskHandle {
        self.tasks.push(task);
        TaskHandle(self.tasks.len() - 1)
    }

    pub fn tasks(&self) -> &[SampleTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Evaluates every submitted task and waits for all of them to complete.
    ///
    /// If any task failed, the error of the first failed task in submission order is returned
    /// and no results are made available.
    pub fn join<E, X>(self, evaluator: &E, executor: &X, max_retries: usize) -> Result<BatchResults, MlmcError>
    where
        E: SampleEvaluator + ?Sized,
        X: BatchExecutor,
    {
        let results = executor.execute(evaluator, &self.tasks, max_retries);
        assert_eq!(
            results.len(),
            self.tasks.len(),
            "Executor must produce exactly one result per task."
        );
        let outcomes = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(BatchResults { outcomes })
    }
}

/// Outcomes of a joined [`SampleBatch`], in submission order.
#[derive(Debug, Clone, Default)]
pub struct BatchResults {
    outcomes: Vec<SampleOutcome>,
}

impl BatchResults {
    pub fn get(&self, handle: TaskHandle) -> Option<&SampleOutcome> {
        self.outcomes.get(handle.0)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleOutcome> {
        self.outcomes.iter()
    }
}

impl Index<TaskHandle> for BatchResults {
    type Output = SampleOutcome;

    fn index(&self, handle: TaskHandle) -> &Self::Output {
        &self.outcomes[handle.0]
    }
}
