//! Structural verification of functions and modules.
use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::{
    analysis::value_types,
    modules::{Function, Module, Region, operand::Value},
    types::Type,
    utils::Error,
};

fn join_types<'a>(types: impl IntoIterator<Item = &'a Type>) -> String {
    types
        .into_iter()
        .map(|ty| ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Function {
    /// Check the SSA discipline of the function.
    ///
    /// Every value must be defined exactly once, and every use must be
    /// visible from its definition: values of a block are visible to the
    /// blocks that follow it in the same region, and to every region nested
    /// below the point of definition.
    pub fn check_ssa(&self) -> Result<(), Error> {
        if self.body.blocks.is_empty() {
            return Err(Error::MissingEntryBlock(self.name.clone()));
        }

        // Construct the set of every definition, rejecting duplicates
        let mut defined = BTreeSet::new();
        for block in &self.body.blocks {
            for (value, _) in &block.args {
                if !defined.insert(*value) {
                    return Err(Error::DuplicateDefinition {
                        function: self.name.clone(),
                        duplicate: *value,
                    });
                }
            }
            for op in &block.operations {
                for value in op.defined_values() {
                    if !defined.insert(value) {
                        return Err(Error::DuplicateDefinition {
                            function: self.name.clone(),
                            duplicate: value,
                        });
                    }
                }
            }
        }

        // Now ensure every use is dominated by its definition
        let mut visible = BTreeSet::new();
        self.check_region_dominance(&self.body, &defined, &mut visible)
    }

    fn check_region_dominance(
        &self,
        region: &Region,
        defined: &BTreeSet<Value>,
        visible: &mut BTreeSet<Value>,
    ) -> Result<(), Error> {
        let mut introduced = Vec::new();

        for block in &region.blocks {
            for (value, _) in &block.args {
                visible.insert(*value);
                introduced.push(*value);
            }

            for op in &block.operations {
                for operand in &op.operands {
                    if !visible.contains(operand) {
                        return Err(if defined.contains(operand) {
                            Error::UseBeforeDefinition {
                                function: self.name.clone(),
                                value: *operand,
                            }
                        } else {
                            Error::UndefinedValue {
                                function: self.name.clone(),
                                undefined: *operand,
                            }
                        });
                    }
                }

                for nested in &op.regions {
                    self.check_region_dominance(nested, defined, visible)?;
                }

                for value in op.result_values() {
                    visible.insert(value);
                    introduced.push(value);
                }
            }
        }

        // Values of this region do not escape it
        for value in introduced {
            visible.remove(&value);
        }
        Ok(())
    }

    /// Check that every top-level return matches the declared result types.
    pub fn check_returns(&self) -> Result<(), Error> {
        let types = value_types(self);
        for block in &self.body.blocks {
            for op in block.operations.iter().filter(|op| op.is_return()) {
                if op.operands.len() != self.result_types.len() {
                    return Err(Error::ReturnArityMismatch {
                        function: self.name.clone(),
                        expected: self.result_types.len(),
                        found: op.operands.len(),
                    });
                }

                let found = op
                    .operands
                    .iter()
                    .filter_map(|value| types.get(value))
                    .collect::<Vec<_>>();
                if found.len() == self.result_types.len()
                    && found.iter().zip(&self.result_types).any(|(a, b)| *a != b)
                {
                    return Err(Error::ReturnTypeMismatch {
                        function: self.name.clone(),
                        expected: join_types(&self.result_types),
                        found: join_types(found),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Module {
    /// Verify the whole module.
    ///
    /// Checks, in order: unique function names, SSA discipline and returns of
    /// every function, then that every call resolves to a function of the
    /// module with a matching signature.
    pub fn verify(&self) -> Result<(), Error> {
        let mut signatures = BTreeMap::new();
        for func in &self.functions {
            let params = func.params().iter().map(|(_, ty)| ty).collect::<Vec<_>>();
            if signatures
                .insert(func.name.as_str(), (params, &func.result_types))
                .is_some()
            {
                return Err(Error::DuplicateFunction(func.name.clone()));
            }
        }

        for func in &self.functions {
            func.check_ssa()?;
            func.check_returns()?;

            let types = value_types(func);
            let mut outcome = Ok(());
            func.body.walk(&mut |op| {
                if outcome.is_err() || !op.is_call() {
                    return;
                }

                let Some(callee) = op.callee() else {
                    outcome = Err(Error::MissingCallee {
                        function: func.name.clone(),
                    });
                    return;
                };

                let Some((params, results)) = signatures.get(callee) else {
                    outcome = Err(Error::UndefinedCallee {
                        function: func.name.clone(),
                        callee: callee.to_string(),
                    });
                    return;
                };

                let operand_types = op
                    .operands
                    .iter()
                    .filter_map(|value| types.get(value))
                    .collect::<Vec<_>>();
                let result_types = op.results.iter().map(|(_, ty)| ty).collect::<Vec<_>>();

                if operand_types != *params || result_types.iter().copied().ne(results.iter()) {
                    outcome = Err(Error::CallSignatureMismatch {
                        function: func.name.clone(),
                        callee: callee.to_string(),
                        expected: format!(
                            "{}) -> ({}",
                            join_types(params.iter().copied()),
                            join_types(results.iter())
                        ),
                        found: format!(
                            "{}) -> ({}",
                            join_types(operand_types),
                            join_types(result_types)
                        ),
                    });
                }
            });
            outcome?;
        }

        debug!("verified module with {} functions", self.functions.len());
        Ok(())
    }
}
