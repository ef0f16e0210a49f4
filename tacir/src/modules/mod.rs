//! IR containers.
//!
//! This module groups the structural pieces of the IR:
//!
//! - `operand`: SSA value identifiers
//! - `attribute`: attribute payloads and dictionaries
//! - `operation`: the generic operation node
//! - `fmt`: textual printer
//! - `parser`: textual parser (feature `chumsky`)
//! - `verify`: SSA and symbol verification
//!
//! Ownership is strictly hierarchical: a [`Module`] owns its [`Function`]s, a
//! function owns its body [`Region`], a region owns its [`Block`]s, a block
//! owns its [`Operation`]s and an operation owns its nested regions.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    modules::{attribute::Attributes, operand::Value, operation::Operation},
    types::Type,
};

pub mod attribute;
pub mod fmt;
pub mod operand;
pub mod operation;
#[cfg(feature = "chumsky")]
pub mod parser;
pub mod verify;

/// Symbol visibility of a function.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Visibility {
    /// Visible from outside the module.
    #[default]
    Public,

    /// Only reachable from within the module. Functions created by outlining
    /// passes are private.
    Private,
}

impl Visibility {
    pub fn to_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// A straight-line sequence of operations with typed block arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Block {
    pub args: Vec<(Value, Type)>,
    pub operations: Vec<Operation>,
}

impl Block {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            args: Vec::new(),
            operations,
        }
    }
}

/// An ordered list of blocks nested in a function or an operation.
///
/// Blocks are laid out in dominance order: values defined in a block are
/// visible to the blocks that follow it in the same region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    pub blocks: Vec<Block>,
}

impl Region {
    /// Region made of a single block.
    pub fn single(block: Block) -> Self {
        Self {
            blocks: vec![block],
        }
    }

    /// Entry block of the region, if any.
    pub fn entry(&self) -> Option<&Block> {
        self.blocks.first()
    }

    /// Visit every operation of the region, nested ones included, in
    /// pre-order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Operation)) {
        for block in &self.blocks {
            for op in &block.operations {
                op.walk(f);
            }
        }
    }
}

/// A function made of a body region and signature metadata.
///
/// Parameters are the arguments of the entry block of `body`. The return
/// values are the operands of the [`Operation::RETURN`] terminating the body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Function {
    pub name: String,
    pub visibility: Visibility,
    pub result_types: Vec<Type>,
    pub attributes: Attributes,
    pub body: Region,
}

impl Function {
    /// Create a public function with an empty entry block taking `params`.
    pub fn new(name: impl Into<String>, params: Vec<(Value, Type)>, result_types: Vec<Type>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            result_types,
            attributes: Attributes::new(),
            body: Region::single(Block {
                args: params,
                operations: Vec::new(),
            }),
        }
    }

    /// Parameters of the function (arguments of the entry block).
    pub fn params(&self) -> &[(Value, Type)] {
        self.body
            .entry()
            .map(|block| block.args.as_slice())
            .unwrap_or(&[])
    }

    pub fn entry_block(&self) -> Option<&Block> {
        self.body.entry()
    }

    pub fn entry_block_mut(&mut self) -> Option<&mut Block> {
        self.body.blocks.first_mut()
    }
}

/// A module containing an ordered list of functions.
///
/// `Module` is the compilation unit boundary for symbol resolution: call
/// operations refer to functions of the same module by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Module {
    pub functions: Vec<Function>,
}

impl Module {
    /// Look up a function by symbol name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|func| func.name == name)
    }
}
