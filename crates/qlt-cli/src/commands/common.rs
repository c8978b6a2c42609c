//! Shared helpers for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{debug, info};

use qlt_cost::{JsonlTracker, NullTracker, Tracker, minimize};
use qlt_optimize::{OptimizerConfig, OptimizerKind};

use crate::config::ExperimentConfig;
use crate::experiment::{Experiment, Problem, Target};
use crate::results::{LotteryData, ResultCache, StageRecord, TrialLocation, stage_seed};

/// Qubit count from the command line, or the problem's fixed size.
pub fn resolve_qubits(problem: Problem, qubits: Option<usize>) -> Result<usize> {
    qubits
        .or_else(|| problem.fixed_qubits())
        .with_context(|| format!("--qubits is required for {problem}"))
}

/// The configured optimizer, with the command-line choice applied.
pub fn resolve_optimizer(config: &ExperimentConfig, kind: Option<OptimizerKind>) -> OptimizerConfig {
    let mut optimizer = config.optimizer.clone();
    if let Some(kind) = kind {
        optimizer.kind = kind;
    }
    optimizer
}

/// A run log below `runs_dir`, or a tracker that drops everything.
pub fn open_tracker(
    runs_dir: Option<&Path>,
    project: &str,
    run_config: serde_json::Value,
) -> Result<Box<dyn Tracker>> {
    match runs_dir {
        Some(dir) => Ok(Box::new(JsonlTracker::create(dir, project, run_config)?)),
        None => Ok(Box::new(NullTracker)),
    }
}

/// One optimization of a lottery-style experiment.
pub struct StageJob<'a> {
    pub at: TrialLocation,
    /// Trial seed.
    pub seed: u64,
    /// Cache key of the stage.
    pub key: &'a str,
    /// Stage kind for the run log (`unpruned`, `pruned`, ...).
    pub kind: &'a str,
    pub target: &'a Target,
    pub initial_parameters: Vec<f64>,
    /// `None` for an unpruned stage.
    pub pruned_indices: Option<Vec<usize>>,
    pub log_trivial: bool,
}

/// Runs stages of one experiment with one optimizer.
pub struct StageRunner<'a> {
    pub experiment: &'a Experiment,
    pub optimizer: &'a OptimizerConfig,
    /// Run-log directory; `None` disables tracking.
    pub runs_dir: Option<&'a Path>,
}

impl<'a> StageRunner<'a> {
    pub fn new(
        config: &'a ExperimentConfig,
        experiment: &'a Experiment,
        optimizer: &'a OptimizerConfig,
    ) -> Self {
        Self {
            experiment,
            optimizer,
            runs_dir: config.tracking.then_some(config.runs_dir.as_path()),
        }
    }

    fn tracker(&self, job: &StageJob<'_>) -> Result<Box<dyn Tracker>> {
        let experiment = self.experiment;
        let pruned = job.pruned_indices.as_deref().unwrap_or_default();
        let run_config = json!({
            "type": job.kind,
            "stage": job.key,
            "problem": experiment.problem.to_string(),
            "number_of_qubits": experiment.qubits,
            "number_of_layers": experiment.layers,
            "trial": job.at.trial,
            "seed": job.seed,
            "optimizer": self.optimizer.kind.to_string(),
            "pruning": experiment.pruning,
            "parameter_period": experiment.period,
            "weight_decay": experiment.weight_decay,
            "initialization": experiment.initialization,
            "ground_state_energy": experiment.ground_state_energy(),
            "initial_parameters": job.initial_parameters,
            "pruned_parameter_indices": pruned,
            "number_of_pruned_parameters": pruned.len(),
        });
        open_tracker(self.runs_dir, &experiment.project, run_config)
    }

    /// Optimize one stage and build its record.
    pub fn run(&self, job: StageJob<'_>) -> Result<StageRecord> {
        let seed = stage_seed(job.seed, job.key);
        let tracker = self.tracker(&job)?;
        let mut cost = self.experiment.cost(
            job.target,
            job.pruned_indices.clone().unwrap_or_default(),
            tracker,
            seed,
            job.log_trivial,
        )?;
        let optimizer = self.optimizer.build(seed);

        let result = minimize(&optimizer, cost.as_mut(), job.initial_parameters.clone())
            .with_context(|| format!("Stage '{}' of trial {} failed", job.key, job.at.trial))?;
        info!(
            "Trial {} {}: cost {:.6e} after {} evaluations",
            job.at.trial, job.key, result.optimal_value, result.num_evaluations
        );

        Ok(StageRecord {
            initial_parameters: job.initial_parameters,
            seed: job.seed,
            energy: result.optimal_value,
            optimal_parameters: result.optimal_params,
            pruned_indices: job.pruned_indices,
            target_distribution: None,
            target_parameters: None,
            number_of_evaluations: result.num_evaluations,
        })
    }
}

/// The cached stage `key`, or run it, store it and save the cache.
pub fn ensure_stage(
    cache: &mut ResultCache<LotteryData>,
    at: TrialLocation,
    key: &str,
    run: impl FnOnce() -> Result<StageRecord>,
) -> Result<StageRecord> {
    if let Some(record) = cache.data().stage(at, key) {
        debug!("Trial {} {}: cached", at.trial, key);
        return Ok(record.clone());
    }
    let record = run()?;
    cache.data_mut().insert_stage(at, key, record.clone());
    cache.save()?;
    Ok(record)
}

/// [`ensure_stage`] for a stage inside a group.
pub fn ensure_group_stage(
    cache: &mut ResultCache<LotteryData>,
    at: TrialLocation,
    group: &str,
    key: &str,
    run: impl FnOnce() -> Result<StageRecord>,
) -> Result<StageRecord> {
    if let Some(record) = cache.data().group_stage(at, group, key) {
        debug!("Trial {} {}/{}: cached", at.trial, group, key);
        return Ok(record.clone());
    }
    let record = run()?;
    cache
        .data_mut()
        .insert_group_stage(at, group, key, record.clone());
    cache.save()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_qubits() {
        assert_eq!(resolve_qubits(Problem::Compiling, None).unwrap(), 2);
        assert_eq!(resolve_qubits(Problem::VqeTfim, Some(5)).unwrap(), 5);
        assert!(resolve_qubits(Problem::Qcbm, None).is_err());
    }

    #[test]
    fn test_resolve_optimizer() {
        let config = ExperimentConfig::default();
        let optimizer = resolve_optimizer(&config, Some(OptimizerKind::CmaEs));
        assert_eq!(optimizer.kind, OptimizerKind::CmaEs);
        assert_eq!(optimizer.lbfgsb, config.optimizer.lbfgsb);
        assert_eq!(resolve_optimizer(&config, None), config.optimizer);
    }
}
