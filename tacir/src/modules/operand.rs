//! SSA value identifiers.
//!
//! Operations refer to each other exclusively through [`Value`]s: a value is
//! produced by exactly one operation result or block argument and may be used
//! by any number of operands.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// SSA value identifier used to name a result or block argument and to
/// reference it from operands.
///
/// Identifiers are unique within a function, nested regions included. Two
/// different functions may reuse the same identifiers freely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Value(pub u32);

impl Value {
    /// Returns the raw index of this value.
    #[inline]
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value(value)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}
