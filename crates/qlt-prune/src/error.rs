//! Error types for parameter pruning.

use thiserror::Error;

/// Errors produced while selecting, removing or re-inserting parameters.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PruneError {
    /// Period must be finite and strictly positive.
    #[error("Invalid parameter period {0}; must be finite and positive")]
    InvalidPeriod(f64),

    /// Fraction outside `[0, 1]`.
    #[error("Invalid pruning fraction {0}; must lie in [0, 1]")]
    InvalidPercentage(f64),

    /// Cutoff must be finite and non-negative.
    #[error("Invalid pruning cutoff {0}; must be finite and non-negative")]
    InvalidCutoff(f64),

    /// A pruned index points past the end of the vector.
    #[error("Pruned index {index} out of bounds for {len} parameters")]
    IndexOutOfBounds {
        /// Offending index.
        index: usize,
        /// Length of the vector it refers to.
        len: usize,
    },

    /// Pruned indices must be given in ascending order.
    #[error("Pruned indices are not sorted in ascending order")]
    UnsortedIndices,

    /// The same index appears twice.
    #[error("Pruned index {0} appears more than once")]
    DuplicateIndex(usize),

    /// A vector does not have the length the mask expects.
    #[error("Expected {expected} parameters, got {got}")]
    LengthMismatch {
        /// Length required by the mask.
        expected: usize,
        /// Length supplied.
        got: usize,
    },

    /// More indices requested than there are parameters.
    #[error("Cannot choose {requested} indices out of {available}")]
    TooManyIndices {
        /// Indices asked for.
        requested: usize,
        /// Parameters available.
        available: usize,
    },
}

/// Result type for pruning operations.
pub type PruneResult<T> = Result<T, PruneError>;
