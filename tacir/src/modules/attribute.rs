//! Named attributes attached to operations and functions.
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumTryAs};

/// Ordered attribute dictionary. Ordering keeps printing deterministic.
pub type Attributes = BTreeMap<String, Attribute>;

/// Constant payload of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Attribute {
    /// String literal, printed quoted.
    Str(String),
    Int(i64),
    Bool(bool),
    /// Reference to a function symbol, printed `@name`.
    Symbol(String),
    /// Presence-only marker.
    Unit,
}

impl Attribute {
    /// Returns the string payload for both [`Attribute::Str`] and
    /// [`Attribute::Symbol`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::Str(s) | Attribute::Symbol(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::Str(value.to_string())
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Attribute::Str(value)
    }
}

impl From<i64> for Attribute {
    fn from(value: i64) -> Self {
        Attribute::Int(value)
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Attribute::Bool(value)
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attribute::Str(s) => write!(f, "{:?}", s),
            Attribute::Int(i) => write!(f, "{}", i),
            Attribute::Bool(b) => write!(f, "{}", b),
            Attribute::Symbol(s) => write!(f, "@{}", s),
            Attribute::Unit => write!(f, "unit"),
        }
    }
}
