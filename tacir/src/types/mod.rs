//! Value types of the IR.
//!
//! Types are small owned values rather than interned handles: a function
//! rewritten by a pass keeps carrying the exact types its values were created
//! with, so no registry needs to be threaded around.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumTryAs};

pub mod primary;

pub use primary::{FType, IType, PrimaryBasicType};

/// A single tensor dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Dim {
    Fixed(u64),
    /// Unknown until runtime, printed `?`.
    Dynamic,
}

impl std::fmt::Display for Dim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dim::Fixed(n) => write!(f, "{}", n),
            Dim::Dynamic => write!(f, "?"),
        }
    }
}

/// Ranked tensor type, e.g. `tensor<1x?x4xf32>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TensorType {
    pub shape: Vec<Dim>,
    pub element: PrimaryBasicType,
}

impl std::fmt::Display for TensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tensor<")?;
        for dim in &self.shape {
            write!(f, "{}x", dim)?;
        }
        write!(f, "{}>", self.element)
    }
}

/// Type of an SSA value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    Int(IType),
    Float(FType),
    Tensor(TensorType),
    /// Unit type for values that carry no data (tokens, control results).
    None,
}

impl Type {
    /// Shorthand for a ranked tensor type with fixed dimensions.
    pub fn tensor(shape: impl IntoIterator<Item = u64>, element: impl Into<PrimaryBasicType>) -> Self {
        Type::Tensor(TensorType {
            shape: shape.into_iter().map(Dim::Fixed).collect(),
            element: element.into(),
        })
    }
}

impl From<PrimaryBasicType> for Type {
    fn from(value: PrimaryBasicType) -> Self {
        match value {
            PrimaryBasicType::Int(ty) => Type::Int(ty),
            PrimaryBasicType::Float(ty) => Type::Float(ty),
        }
    }
}

impl From<IType> for Type {
    fn from(value: IType) -> Self {
        Type::Int(value)
    }
}

impl From<FType> for Type {
    fn from(value: FType) -> Self {
        Type::Float(value)
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int(ty) => write!(f, "{}", ty),
            Type::Float(ty) => write!(f, "{}", ty),
            Type::Tensor(ty) => write!(f, "{}", ty),
            Type::None => write!(f, "none"),
        }
    }
}
