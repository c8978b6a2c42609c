//! Removing pruned parameters and putting them back.
//!
//! Indices always refer to positions in the full (unpruned) vector. Pruned
//! positions are refilled with [`PAD_VALUE`], a tiny non-zero angle, so that
//! symbolic gates stay parameterized while acting as the identity.

use serde::Serialize;

use crate::error::{PruneError, PruneResult};

/// Value written at pruned positions by [`pad`].
pub const PAD_VALUE: f64 = 1e-15;

/// Check that `indices` are strictly ascending and below `len`.
fn check_indices(indices: &[usize], len: usize) -> PruneResult<()> {
    for (position, &index) in indices.iter().enumerate() {
        if index >= len {
            return Err(PruneError::IndexOutOfBounds { index, len });
        }
        if position > 0 {
            let previous = indices[position - 1];
            if index == previous {
                return Err(PruneError::DuplicateIndex(index));
            }
            if index < previous {
                return Err(PruneError::UnsortedIndices);
            }
        }
    }
    Ok(())
}

/// Drop the entries at `pruned_indices`.
pub fn prune(parameters: &[f64], pruned_indices: &[usize]) -> PruneResult<Vec<f64>> {
    check_indices(pruned_indices, parameters.len())?;

    let mut kept = Vec::with_capacity(parameters.len() - pruned_indices.len());
    let mut pruned = pruned_indices.iter().peekable();
    for (i, &p) in parameters.iter().enumerate() {
        if pruned.next_if_eq(&&i).is_none() {
            kept.push(p);
        }
    }
    Ok(kept)
}

/// Insert [`PAD_VALUE`] at each of `pruned_indices`.
///
/// Indices are taken in ascending order, so each one names its position in
/// the padded result.
///
/// ```rust
/// use qlt_prune::{PAD_VALUE, pad};
///
/// let padded = pad(&[1.0, 2.0], &[0, 2]).unwrap();
/// assert_eq!(padded, vec![PAD_VALUE, 1.0, PAD_VALUE, 2.0]);
/// ```
pub fn pad(unpadded: &[f64], pruned_indices: &[usize]) -> PruneResult<Vec<f64>> {
    let len = unpadded.len() + pruned_indices.len();
    check_indices(pruned_indices, len)?;

    let mut padded = Vec::with_capacity(len);
    let mut values = unpadded.iter();
    let mut pruned = pruned_indices.iter().peekable();
    for i in 0..len {
        if pruned.next_if_eq(&&i).is_some() {
            padded.push(PAD_VALUE);
        } else if let Some(&v) = values.next() {
            padded.push(v);
        }
    }
    Ok(padded)
}

/// A validated set of pruned positions within a parameter vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneMask {
    num_parameters: usize,
    pruned: Vec<usize>,
}

impl PruneMask {
    /// Mask over `num_parameters` parameters with nothing pruned.
    pub fn none(num_parameters: usize) -> Self {
        Self {
            num_parameters,
            pruned: Vec::new(),
        }
    }

    /// Mask pruning `pruned` (strictly ascending) out of `num_parameters`.
    pub fn new(num_parameters: usize, pruned: Vec<usize>) -> PruneResult<Self> {
        check_indices(&pruned, num_parameters)?;
        Ok(Self {
            num_parameters,
            pruned,
        })
    }

    /// Length of the full parameter vector.
    pub fn num_parameters(&self) -> usize {
        self.num_parameters
    }

    /// Number of pruned positions.
    pub fn num_pruned(&self) -> usize {
        self.pruned.len()
    }

    /// Number of parameters left to optimize.
    pub fn num_kept(&self) -> usize {
        self.num_parameters - self.pruned.len()
    }

    /// Pruned positions, ascending.
    pub fn pruned_indices(&self) -> &[usize] {
        &self.pruned
    }

    /// Whether position `index` is pruned.
    pub fn is_pruned(&self, index: usize) -> bool {
        self.pruned.binary_search(&index).is_ok()
    }

    /// Full-length vector from the kept parameters.
    pub fn pad(&self, kept: &[f64]) -> PruneResult<Vec<f64>> {
        if kept.len() != self.num_kept() {
            return Err(PruneError::LengthMismatch {
                expected: self.num_kept(),
                got: kept.len(),
            });
        }
        pad(kept, &self.pruned)
    }

    /// Kept parameters from a full-length vector.
    pub fn prune(&self, full: &[f64]) -> PruneResult<Vec<f64>> {
        if full.len() != self.num_parameters {
            return Err(PruneError::LengthMismatch {
                expected: self.num_parameters,
                got: full.len(),
            });
        }
        prune(full, &self.pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_removes_entries() {
        let params = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(prune(&params, &[1, 3]).unwrap(), vec![0.0, 2.0, 4.0]);
        assert_eq!(prune(&params, &[]).unwrap(), params.to_vec());
        assert!(prune(&params, &[0, 1, 2, 3, 4]).unwrap().is_empty());
    }

    #[test]
    fn test_pad_inserts_at_final_positions() {
        let padded = pad(&[0.5, 0.7], &[1, 2]).unwrap();
        assert_eq!(padded, vec![0.5, PAD_VALUE, PAD_VALUE, 0.7]);

        let trailing = pad(&[0.5], &[1, 2]).unwrap();
        assert_eq!(trailing, vec![0.5, PAD_VALUE, PAD_VALUE]);

        assert_eq!(pad(&[], &[0]).unwrap(), vec![PAD_VALUE]);
    }

    #[test]
    fn test_bad_indices() {
        assert_eq!(
            prune(&[1.0, 2.0], &[2]),
            Err(PruneError::IndexOutOfBounds { index: 2, len: 2 })
        );
        assert_eq!(prune(&[1.0, 2.0, 3.0], &[2, 0]), Err(PruneError::UnsortedIndices));
        assert_eq!(prune(&[1.0, 2.0, 3.0], &[1, 1]), Err(PruneError::DuplicateIndex(1)));
        assert_eq!(
            pad(&[1.0], &[3]),
            Err(PruneError::IndexOutOfBounds { index: 3, len: 2 })
        );
    }

    #[test]
    fn test_mask() {
        let mask = PruneMask::new(6, vec![0, 4]).unwrap();
        assert_eq!(mask.num_pruned(), 2);
        assert_eq!(mask.num_kept(), 4);
        assert!(mask.is_pruned(4));
        assert!(!mask.is_pruned(3));

        let full = mask.pad(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(full, vec![PAD_VALUE, 1.0, 2.0, 3.0, PAD_VALUE, 4.0]);
        assert_eq!(mask.prune(&full).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);

        assert_eq!(
            mask.pad(&[1.0]),
            Err(PruneError::LengthMismatch {
                expected: 4,
                got: 1
            })
        );
        assert!(PruneMask::new(3, vec![3]).is_err());
        assert_eq!(PruneMask::none(3).num_kept(), 3);
    }
}
