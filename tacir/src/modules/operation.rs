//! Generic operation node.
//!
//! Operations carry no semantics of their own: an
//! operation is a name, a list of operands, a list of typed results, a list
//! of nested regions and an attribute dictionary. Two operation names are
//! reserved by the IR itself, [`Operation::CALL`] and [`Operation::RETURN`].
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    modules::{
        Region,
        attribute::{Attribute, Attributes},
        operand::Value,
    },
    types::Type,
};

/// A single operation within a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Operation {
    pub name: String,
    pub operands: SmallVec<Value, 4>,
    pub results: Vec<(Value, Type)>,
    pub regions: Vec<Region>,
    pub attributes: Attributes,
}

impl Operation {
    /// Name of the direct call operation.
    pub const CALL: &'static str = "func.call";

    /// Name of the function return operation.
    pub const RETURN: &'static str = "func.return";

    /// Attribute holding the callee symbol of a [`Operation::CALL`].
    pub const CALLEE_ATTR: &'static str = "callee";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operands: SmallVec::new(),
            results: Vec::new(),
            regions: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    /// Build a call to `callee`.
    pub fn call(
        callee: impl Into<String>,
        operands: impl IntoIterator<Item = Value>,
        results: impl IntoIterator<Item = (Value, Type)>,
    ) -> Self {
        Self::new(Self::CALL)
            .with_operands(operands)
            .with_results(results)
            .with_attr(Self::CALLEE_ATTR, Attribute::Symbol(callee.into()))
    }

    /// Build a function return.
    pub fn ret(operands: impl IntoIterator<Item = Value>) -> Self {
        Self::new(Self::RETURN).with_operands(operands)
    }

    pub fn with_operand(mut self, value: Value) -> Self {
        self.operands.push(value);
        self
    }

    pub fn with_operands(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        for value in values {
            self.operands.push(value);
        }
        self
    }

    pub fn with_result(mut self, value: Value, ty: impl Into<Type>) -> Self {
        self.results.push((value, ty.into()));
        self
    }

    pub fn with_results(mut self, results: impl IntoIterator<Item = (Value, Type)>) -> Self {
        self.results.extend(results);
        self
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.push(region);
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, attr: impl Into<Attribute>) -> Self {
        self.attributes.insert(name.into(), attr.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// String attribute lookup; `None` when absent or not a string.
    pub fn str_attr(&self, name: &str) -> Option<&str> {
        match self.attributes.get(name) {
            Some(Attribute::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, name: impl Into<String>, attr: impl Into<Attribute>) {
        self.attributes.insert(name.into(), attr.into());
    }

    pub fn is_call(&self) -> bool {
        self.name == Self::CALL
    }

    pub fn is_return(&self) -> bool {
        self.name == Self::RETURN
    }

    /// Callee symbol of a call operation.
    pub fn callee(&self) -> Option<&str> {
        if !self.is_call() {
            return None;
        }
        match self.attributes.get(Self::CALLEE_ATTR) {
            Some(Attribute::Symbol(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Re-target a call operation. No-op on anything that is not a call.
    pub fn set_callee(&mut self, callee: impl Into<String>) {
        if self.is_call() {
            self.attributes
                .insert(Self::CALLEE_ATTR.to_string(), Attribute::Symbol(callee.into()));
        }
    }

    /// Iterate over the values produced by this operation.
    pub fn result_values(&self) -> impl Iterator<Item = Value> + '_ {
        self.results.iter().map(|(value, _)| *value)
    }

    /// Visit this operation and every operation nested in its regions, in
    /// pre-order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Operation)) {
        f(self);
        for region in &self.regions {
            for block in &region.blocks {
                for op in &block.operations {
                    op.walk(f);
                }
            }
        }
    }

    /// All values read by this operation, including values captured by
    /// operations in its nested regions. Order of first appearance, with
    /// duplicates preserved.
    pub fn used_values(&self) -> Vec<Value> {
        let mut used = Vec::new();
        self.walk(&mut |op| used.extend(op.operands.iter().copied()));
        used
    }

    /// All values defined by this operation: its results, plus the block
    /// arguments and results of everything nested below it.
    pub fn defined_values(&self) -> Vec<Value> {
        let mut defined = Vec::new();
        self.walk(&mut |op| {
            defined.extend(op.result_values());
            for region in &op.regions {
                for block in &region.blocks {
                    defined.extend(block.args.iter().map(|(value, _)| *value));
                }
            }
        });
        defined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{modules::Block, types::FType};

    fn nested() -> Operation {
        let inner = Operation::new("tfl.relu")
            .with_operand(Value(1))
            .with_operand(Value(5))
            .with_result(Value(6), FType::F32);
        let region = Region::single(Block {
            args: vec![(Value(5), Type::Float(FType::F32))],
            operations: vec![inner, Operation::new("tfl.yield").with_operand(Value(6))],
        });
        Operation::new("tfl.while")
            .with_operand(Value(0))
            .with_result(Value(2), FType::F32)
            .with_region(region)
    }

    #[test]
    fn used_values_include_captures() {
        assert_eq!(
            nested().used_values(),
            vec![Value(0), Value(1), Value(5), Value(6)]
        );
    }

    #[test]
    fn defined_values_include_block_args() {
        assert_eq!(nested().defined_values(), vec![Value(2), Value(5), Value(6)]);
    }

    #[test]
    fn callee_only_on_calls() {
        let mut call = Operation::call("f", [Value(0)], []);
        assert_eq!(call.callee(), Some("f"));
        call.set_callee("g");
        assert_eq!(call.callee(), Some("g"));

        let mut other = Operation::new("tfl.add");
        other.set_callee("g");
        assert_eq!(other.callee(), None);
    }
}
