//! QLT Prune
//!
//! Bookkeeping for pruning variational-circuit parameters:
//!
//! - selecting prunable parameters by periodic distance from zero, either
//!   under a cutoff or as a fixed share of the vector
//! - drawing random subnetworks of the same size
//! - removing pruned entries before optimization and padding them back in
//!   before the circuit is bound
//! - the periodic weight-decay penalty added to a physical cost
//!
//! # Example
//!
//! ```rust
//! use qlt_prune::{PruningRule, pad, prune, select};
//! use std::f64::consts::PI;
//!
//! let optimal = [0.002, 1.3, 2.0 * PI - 0.001, -2.4];
//! let pruned = select(&optimal, &PruningRule::Percentage { fraction: 0.5 }, 2.0 * PI).unwrap();
//! assert_eq!(pruned, vec![0, 2]);
//!
//! let kept = prune(&optimal, &pruned).unwrap();
//! assert_eq!(kept, vec![1.3, -2.4]);
//! assert_eq!(pad(&kept, &pruned).unwrap().len(), 4);
//! ```

pub mod distance;
pub mod error;
pub mod mask;
pub mod select;

pub use distance::{check_period, periodic_distance, weight_decay_bias};
pub use error::{PruneError, PruneResult};
pub use mask::{PAD_VALUE, PruneMask, pad, prune};
pub use select::{PruningRule, indices_by_percentage, indices_within_cutoff, random_indices, select};
