//! Qubit identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a qubit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl QubitId {
    /// Index of this qubit as a bit position in a basis-state index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

impl From<usize> for QubitId {
    fn from(id: usize) -> Self {
        QubitId(u32::try_from(id).expect("QubitId overflow: exceeds u32::MAX"))
    }
}
