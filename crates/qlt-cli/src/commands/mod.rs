//! CLI command implementations.

pub mod add_energies;
pub mod common;
pub mod init_config;
pub mod lottery;
pub mod merge;
pub mod overparam;
pub mod pruning_sweep;
pub mod version;
pub mod weight_decay;
