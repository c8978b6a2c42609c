//! Pruning-sweep command implementation.
//!
//! Trains one unpruned QCBM per trial, then for each pruning percentage
//! retrains the pruned circuit from the original start (`pruned`) and from
//! a fresh random start (`pruned_and_randomized`). Results for percentage
//! `p` are grouped under the key `"p"` of the trial.

use std::path::PathBuf;

use anyhow::Result;

use qlt_prune::{PruningRule, prune, select};

use super::common::{StageJob, StageRunner, ensure_group_stage, ensure_stage, resolve_optimizer};
use super::lottery::UNPRUNED;
use crate::config::ExperimentConfig;
use crate::experiment::{Experiment, Target};
use crate::output::{create_progress_bar, print_header, print_result, print_success};
use crate::results::{LotteryData, ResultCache, TrialLocation, stage_rng, trial_seed};

/// Stage keys inside a percentage group.
pub const PRUNED: &str = "pruned";
pub const PRUNED_AND_RANDOMIZED: &str = "pruned_and_randomized";

/// What to run.
#[derive(Debug, Clone)]
pub struct SweepArgs {
    pub qubits: usize,
    pub layers: usize,
    pub trials: Option<usize>,
    pub output: Option<PathBuf>,
}

/// Run the sweep and return the updated cache.
pub fn run(config: &ExperimentConfig, args: &SweepArgs) -> Result<ResultCache<LotteryData>> {
    let trials = args.trials.unwrap_or(config.trials);
    let optimizer = resolve_optimizer(config, None);
    let experiment = Experiment::qcbm_sweep(config, args.qubits, args.layers)?;
    let runner = StageRunner::new(config, &experiment, &optimizer);
    let percentages = &config.qcbm.sweep.percentages;

    let path = match &args.output {
        Some(path) => path.clone(),
        None => experiment.cache_path(&config.data_dir, optimizer.kind),
    };
    let mut cache: ResultCache<LotteryData> = ResultCache::open(path)?;
    let n = experiment.num_parameters();

    let pb = create_progress_bar((trials * (1 + 2 * percentages.len())) as u64, "stages");
    for trial in 0..trials {
        let at = TrialLocation {
            qubits: args.qubits,
            layers: args.layers,
            trial,
        };
        let seed = trial_seed(args.layers, trial);
        pb.set_message(format!("trial {trial}"));

        let unpruned = ensure_stage(&mut cache, at, UNPRUNED, || {
            let mut rng = stage_rng(seed, UNPRUNED);
            let target = experiment.draw_target(&mut rng)?;
            let initial = experiment.random_parameters(n, &mut rng);
            let mut record = runner.run(StageJob {
                at,
                seed,
                key: UNPRUNED,
                kind: "unpruned",
                target: &target,
                initial_parameters: initial,
                pruned_indices: None,
                log_trivial: false,
            })?;
            target.write_to(&mut record);
            Ok(record)
        })?;
        pb.inc(1);
        let target = Target::from_record(&unpruned)?;

        for &fraction in percentages {
            let rule = PruningRule::Percentage { fraction };
            let group = rule.to_string();
            let pruned = select(&unpruned.optimal_parameters, &rule, experiment.period)?;
            let pruned_initial = prune(&unpruned.initial_parameters, &pruned)?;

            ensure_group_stage(&mut cache, at, &group, PRUNED, || {
                runner.run(StageJob {
                    at,
                    seed,
                    key: &format!("{group}/{PRUNED}"),
                    kind: PRUNED,
                    target: &target,
                    initial_parameters: pruned_initial.clone(),
                    pruned_indices: Some(pruned.clone()),
                    log_trivial: false,
                })
            })?;
            pb.inc(1);

            ensure_group_stage(&mut cache, at, &group, PRUNED_AND_RANDOMIZED, || {
                let key = format!("{group}/{PRUNED_AND_RANDOMIZED}");
                let mut rng = stage_rng(seed, &key);
                let initial = experiment.random_parameters(pruned_initial.len(), &mut rng);
                runner.run(StageJob {
                    at,
                    seed,
                    key: &key,
                    kind: PRUNED_AND_RANDOMIZED,
                    target: &target,
                    initial_parameters: initial,
                    pruned_indices: Some(pruned.clone()),
                    log_trivial: false,
                })
            })?;
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    Ok(cache)
}

/// Execute the pruning-sweep command.
pub fn execute(config: &ExperimentConfig, args: &SweepArgs) -> Result<()> {
    print_header("QCBM pruning-percentage sweep");
    let cache = run(config, args)?;
    print_result("Trials", cache.data().trials(args.qubits, args.layers).len());
    print_result("Percentages", format!("{:?}", config.qcbm.sweep.percentages));
    print_success(&format!("Results written to {}", cache.path().display()));
    Ok(())
}
