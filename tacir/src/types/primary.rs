#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumTryAs};

/// Represents an integer type with a specific bit width.
///
/// Signeness is not represented here; operations that care interpret the bits
/// accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct IType {
    num_bits: u32,
}

impl IType {
    pub const I1: Self = Self { num_bits: 1 };
    pub const I8: Self = Self { num_bits: 8 };
    pub const I16: Self = Self { num_bits: 16 };
    pub const I32: Self = Self { num_bits: 32 };
    pub const I64: Self = Self { num_bits: 64 };
    pub const MIN_BITS: u32 = 1;
    pub const MAX_BITS: u32 = 1 << 16;

    /// Creates a new `IType` with the specified number of bits.
    #[inline]
    pub const fn new(num_bits: u32) -> Option<Self> {
        if num_bits >= Self::MIN_BITS && num_bits <= Self::MAX_BITS {
            Some(Self { num_bits })
        } else {
            None
        }
    }

    /// Returns the number of bits of the integer type.
    #[inline]
    pub const fn num_bits(&self) -> u32 {
        self.num_bits
    }
}

impl std::fmt::Display for IType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.num_bits)
    }
}

/// Represents a floating-point element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FType {
    /// 16-bit floating point value (IEEE-754 binary16).
    F16,

    /// 16-bit "brain" floating point value (7-bit significand).
    BF16,

    /// 32-bit floating point value (IEEE-754 binary32).
    F32,

    /// 64-bit floating point value (IEEE-754 binary64).
    F64,
}

impl FType {
    pub fn to_str(&self) -> &'static str {
        match self {
            FType::F16 => "f16",
            FType::BF16 => "bf16",
            FType::F32 => "f32",
            FType::F64 => "f64",
        }
    }
}

impl std::fmt::Display for FType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Scalar types usable on their own or as tensor elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumTryAs, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrimaryBasicType {
    Int(IType),
    Float(FType),
}

impl std::fmt::Display for PrimaryBasicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryBasicType::Int(ty) => write!(f, "{}", ty),
            PrimaryBasicType::Float(ty) => write!(f, "{}", ty),
        }
    }
}

macro_rules! primary_type_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for PrimaryBasicType {
            fn from(value: $ty) -> Self {
                PrimaryBasicType::$variant(value)
            }
        }
    };
}

primary_type_from!(Int, IType);
primary_type_from!(Float, FType);
