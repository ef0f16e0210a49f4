//! Outlining of an operation run into a private function and a call.
use std::collections::{HashMap, HashSet};

use tacir::{
    analysis::{count_uses, count_uses_in, value_types},
    modules::{Function, Visibility, operand::Value, operation::Operation},
    types::Type,
};

use crate::{
    magic::INTERFACE_NAME_PREFIX,
    utils::error::{RaiseError, RaiseResult},
};

/// Type and use information of the function being rewritten.
#[derive(Debug, Clone, Default)]
pub struct FunctionScope {
    types: HashMap<Value, Type>,
    uses: HashMap<Value, usize>,
}

impl FunctionScope {
    pub fn new(function: &Function) -> Self {
        Self {
            types: value_types(function),
            uses: count_uses(&function.body),
        }
    }

    pub fn type_of(&self, value: Value) -> Option<&Type> {
        self.types.get(&value)
    }

    /// Number of uses of `value` anywhere in the function.
    pub fn uses_of(&self, value: Value) -> usize {
        self.uses.get(&value).copied().unwrap_or(0)
    }

    /// Account for operations whose uses `moved` left the function, replaced
    /// by `call`.
    pub fn record_outlining(&mut self, moved: &HashMap<Value, usize>, call: &Operation) {
        for (value, count) in moved {
            if let Some(uses) = self.uses.get_mut(value) {
                *uses = uses.saturating_sub(*count);
            }
        }
        for operand in &call.operands {
            *self.uses.entry(*operand).or_insert(0) += 1;
        }
    }
}

/// A freshly outlined function together with the call replacing its body.
#[derive(Debug, Clone)]
pub struct Outlined {
    pub function: Function,
    pub call: Operation,
}

/// Moves a contiguous run of operations into a new function.
pub trait SubgraphExtractor {
    /// Outline `ops` (in their original order) as interface `id`.
    ///
    /// The returned call must define every value of `ops` still used outside
    /// of them, and take every value they use but do not define.
    fn extract(
        &mut self,
        ops: Vec<Operation>,
        scope: &FunctionScope,
        id: u32,
    ) -> RaiseResult<Outlined>;
}

/// Default extractor.
///
/// Parameters are the values used but not defined by the run, in order of
/// first use. Results are the values defined by the run and still used
/// outside of it, in order of definition. Value identifiers are kept on both
/// sides of the call, so no use needs to be renamed.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineExtractor;

impl SubgraphExtractor for OutlineExtractor {
    fn extract(
        &mut self,
        ops: Vec<Operation>,
        scope: &FunctionScope,
        id: u32,
    ) -> RaiseResult<Outlined> {
        if ops.is_empty() {
            return Err(RaiseError::EmptyPartition);
        }

        let defined = ops
            .iter()
            .flat_map(|op| op.defined_values())
            .collect::<HashSet<_>>();

        let mut seen = HashSet::new();
        let mut params = Vec::new();
        for value in ops.iter().flat_map(|op| op.used_values()) {
            if defined.contains(&value) || !seen.insert(value) {
                continue;
            }
            let ty = scope
                .type_of(value)
                .ok_or(RaiseError::UntypedValue { value })?;
            params.push((value, ty.clone()));
        }

        let inside = count_uses_in(&ops);
        let returns = ops
            .iter()
            .flat_map(|op| op.results.iter())
            .filter(|(value, _)| scope.uses_of(*value) > inside.get(value).copied().unwrap_or(0))
            .cloned()
            .collect::<Vec<_>>();

        let name = format!("{}{}", INTERFACE_NAME_PREFIX, id);
        let call = Operation::call(
            name.clone(),
            params.iter().map(|(value, _)| *value),
            returns.iter().cloned(),
        );

        let mut function = Function::new(
            name,
            params,
            returns.iter().map(|(_, ty)| ty.clone()).collect(),
        );
        function.visibility = Visibility::Private;
        if let Some(entry) = function.entry_block_mut() {
            entry.operations = ops;
            entry
                .operations
                .push(Operation::ret(returns.iter().map(|(value, _)| *value)));
        }

        Ok(Outlined { function, call })
    }
}

#[cfg(test)]
mod tests {
    use tacir::{
        modules::{Block, Region},
        types::FType,
    };

    use super::*;

    fn f32() -> Type {
        Type::Float(FType::F32)
    }

    /// `%1 = a(%0); %2 = b(%1, %0); %3 = c(%2)` followed by `return(%2, %3)`.
    fn sample() -> Function {
        let mut func = Function::new("main", vec![(Value(0), f32())], vec![f32(), f32()]);
        func.entry_block_mut().unwrap().operations = vec![
            Operation::new("a").with_operand(Value(0)).with_result(Value(1), f32()),
            Operation::new("b")
                .with_operands([Value(1), Value(0)])
                .with_result(Value(2), f32()),
            Operation::new("c").with_operand(Value(2)).with_result(Value(3), f32()),
            Operation::ret([Value(2), Value(3)]),
        ];
        func
    }

    #[test]
    fn parameters_and_returns_follow_value_flow() {
        let func = sample();
        let scope = FunctionScope::new(&func);
        let ops = func.entry_block().unwrap().operations[..2].to_vec();

        let Outlined { function, call } = OutlineExtractor.extract(ops, &scope, 7).unwrap();
        assert_eq!(function.name, "func_7");
        assert_eq!(function.visibility, Visibility::Private);
        assert_eq!(function.params(), &[(Value(0), f32())]);
        assert_eq!(function.result_types, vec![f32()]);

        let body = &function.entry_block().unwrap().operations;
        assert_eq!(body.len(), 3);
        assert_eq!(body[2], Operation::ret([Value(2)]));

        assert_eq!(call.callee(), Some("func_7"));
        assert_eq!(call.operands.as_slice(), &[Value(0)]);
        assert_eq!(call.results, vec![(Value(2), f32())]);
    }

    #[test]
    fn captured_values_become_parameters() {
        let mut func = Function::new("main", vec![(Value(0), f32()), (Value(1), f32())], vec![]);
        let region = Region::single(Block::new(vec![
            Operation::new("tfl.yield").with_operand(Value(1)),
        ]));
        func.entry_block_mut().unwrap().operations = vec![
            Operation::new("tfl.while")
                .with_operand(Value(0))
                .with_region(region),
        ];
        let scope = FunctionScope::new(&func);
        let ops = func.entry_block().unwrap().operations.clone();

        let outlined = OutlineExtractor.extract(ops, &scope, 0).unwrap();
        assert_eq!(outlined.call.operands.as_slice(), &[Value(0), Value(1)]);
        assert!(outlined.call.results.is_empty());
    }

    #[test]
    fn empty_run_is_rejected() {
        let scope = FunctionScope::default();
        let err = OutlineExtractor.extract(vec![], &scope, 0).unwrap_err();
        assert!(err.is_empty_partition());
    }

    #[test]
    fn scope_tracks_outlining() {
        let func = sample();
        let mut scope = FunctionScope::new(&func);
        assert_eq!(scope.uses_of(Value(0)), 2);

        let ops = func.entry_block().unwrap().operations[..2].to_vec();
        let moved = count_uses_in(&ops);
        let outlined = OutlineExtractor.extract(ops, &scope, 0).unwrap();
        scope.record_outlining(&moved, &outlined.call);

        assert_eq!(scope.uses_of(Value(0)), 1);
        assert_eq!(scope.uses_of(Value(1)), 0);
        assert_eq!(scope.uses_of(Value(2)), 2);
    }
}
