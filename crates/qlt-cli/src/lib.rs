//! QLT command-line library.
//!
//! Drivers for the pruning experiments on variational circuits. Each
//! command in [`commands`] loads or creates a JSON result cache, skips work
//! that is already cached and saves after every finished optimization, so
//! an interrupted run picks up where it stopped.
//!
//! - `lottery`: the lottery-ticket protocol for VQE, QCBM and compiling
//! - `pruning-sweep`: QCBM retraining over a range of pruning percentages
//! - `overparam`: unpruned VQE training over growing depth
//! - `weight-decay` and `add-energies`: the penalty-weight study
//! - `merge` and `init-config`: file utilities
//!
//! Settings come from [`config::ExperimentConfig`], a YAML file with
//! `QLT_*` environment overrides.

pub mod commands;
pub mod config;
pub mod experiment;
pub mod output;
pub mod results;
