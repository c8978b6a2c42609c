//! Overparameterization command implementation.
//!
//! Trains the unpruned VQE ansatz repeatedly at every requested depth and
//! records the raw energies and optima, to see where extra layers stop
//! helping.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use tracing::info;

use qlt_cost::minimize;
use qlt_optimize::{OptimizerConfig, OptimizerKind};

use super::common::{open_tracker, resolve_optimizer};
use crate::config::ExperimentConfig;
use crate::experiment::{Experiment, Problem};
use crate::output::{create_progress_bar, print_header, print_result, print_success};
use crate::results::{OverparamData, ResultCache, repetition_seed};

/// What to run.
#[derive(Debug, Clone)]
pub struct OverparamArgs {
    pub problem: Problem,
    pub qubits: usize,
    pub layers: Vec<usize>,
    pub trials: Option<usize>,
    pub optimizer: Option<OptimizerKind>,
    pub output: Option<PathBuf>,
}

/// `<data_dir>/overparameterization/<optimizer>/<project>_<problem>.json`.
pub fn default_path(
    config: &ExperimentConfig,
    problem: Problem,
    optimizer: OptimizerKind,
) -> PathBuf {
    config
        .data_dir
        .join("overparameterization")
        .join(optimizer.to_string())
        .join(format!("{}_{}.json", config.overparam.project, problem))
}

/// Run the study and return the updated cache.
pub fn run(config: &ExperimentConfig, args: &OverparamArgs) -> Result<ResultCache<OverparamData>> {
    if !args.problem.is_vqe() {
        bail!("overparam supports VQE problems only, got {}", args.problem);
    }
    let trials = args.trials.unwrap_or(config.trials);
    let optimizer = resolve_optimizer(config, args.optimizer);
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| default_path(config, args.problem, optimizer.kind));
    let mut cache: ResultCache<OverparamData> = ResultCache::open(path)?;
    let runs_dir = config.tracking.then_some(config.runs_dir.as_path());

    let pb = create_progress_bar((trials * args.layers.len()) as u64, "repetitions");
    for &layers in &args.layers {
        let experiment = Experiment::new(config, args.problem, args.qubits, layers)?;
        pb.set_message(format!("{layers} layers"));

        let done = {
            let block = cache.data_mut().entry(args.qubits.to_string()).or_default();
            block.ground_state_energy = experiment.ground_state_energy().unwrap_or_default();
            block.entries.entry(layers.to_string()).or_default().energies.len()
        };
        pb.inc(done.min(trials) as u64);

        for trial in done..trials {
            let seed = repetition_seed(args.qubits, layers, trial);
            let (energy, params) =
                optimize_once(config, &experiment, &optimizer, runs_dir, trial, seed)?;

            let block = cache.data_mut().entry(args.qubits.to_string()).or_default();
            let record = block.entries.entry(layers.to_string()).or_default();
            record.energies.push(energy);
            record.optimal_parameter_vectors.push(params);
            cache.save()?;
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    Ok(cache)
}

fn optimize_once(
    config: &ExperimentConfig,
    experiment: &Experiment,
    optimizer: &OptimizerConfig,
    runs_dir: Option<&Path>,
    trial: usize,
    seed: u64,
) -> Result<(f64, Vec<f64>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let initial = experiment.random_parameters(experiment.num_parameters(), &mut rng);
    let tracker = open_tracker(
        runs_dir,
        &config.overparam.project,
        json!({
            "type": "overparameterization",
            "problem": experiment.problem.to_string(),
            "number_of_qubits": experiment.qubits,
            "number_of_layers": experiment.layers,
            "trial": trial,
            "seed": seed,
            "optimizer": optimizer.kind.to_string(),
            "ground_state_energy": experiment.ground_state_energy(),
            "initial_parameters": initial,
        }),
    )?;
    let mut cost = experiment.vqe_cost(Vec::new(), 0.0, 0.0)?.with_tracker(tracker);
    let result = minimize(&optimizer.build(seed), &mut cost, initial)?;
    info!(
        "{} layers, repetition {}: energy {:.10} after {} evaluations",
        experiment.layers, trial, result.optimal_value, result.num_evaluations
    );
    Ok((result.optimal_value, result.optimal_params))
}

/// Execute the overparam command.
pub fn execute(config: &ExperimentConfig, args: &OverparamArgs) -> Result<()> {
    print_header(&format!("Overparameterization study for {}", args.problem));
    let cache = run(config, args)?;

    if let Some(block) = cache.data().get(&args.qubits.to_string()) {
        print_result("Ground-state energy", format!("{:.10}", block.ground_state_energy));
        for layers in &args.layers {
            let best = block
                .entries
                .get(&layers.to_string())
                .and_then(|r| r.energies.iter().copied().min_by(f64::total_cmp));
            if let Some(best) = best {
                print_result(&format!("Best energy, {layers} layers"), format!("{best:.10}"));
            }
        }
    }
    print_success(&format!("Results written to {}", cache.path().display()));
    Ok(())
}
