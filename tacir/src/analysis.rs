//! Analyses shared by rewriting passes.
use std::collections::HashMap;

use petgraph::prelude::DiGraphMap;

use crate::{
    modules::{Function, Module, Region, operand::Value, operation::Operation},
    types::Type,
};

/// Number of uses of each value over `ops`, nested regions included.
pub fn count_uses_in<'a>(ops: impl IntoIterator<Item = &'a Operation>) -> HashMap<Value, usize> {
    let mut uses = HashMap::new();
    for op in ops {
        op.walk(&mut |op| {
            for operand in &op.operands {
                *uses.entry(*operand).or_insert(0) += 1;
            }
        });
    }
    uses
}

/// Number of uses of each value within `region`.
pub fn count_uses(region: &Region) -> HashMap<Value, usize> {
    count_uses_in(region.blocks.iter().flat_map(|block| block.operations.iter()))
}

/// Type of every value defined in `function`: parameters, block arguments
/// and operation results at any depth.
pub fn value_types(function: &Function) -> HashMap<Value, Type> {
    let mut types = HashMap::new();
    for block in &function.body.blocks {
        types.extend(block.args.iter().cloned());
    }
    function.body.walk(&mut |op| {
        types.extend(op.results.iter().cloned());
        for region in &op.regions {
            for block in &region.blocks {
                types.extend(block.args.iter().cloned());
            }
        }
    });
    types
}

/// Direct call graph of a module.
///
/// Nodes are function names, and an edge `a -> b` weighted `n` means `a`
/// contains `n` call sites targeting `b`. Callees that do not exist in the
/// module still appear as nodes.
pub struct CallGraph<'a> {
    graph: DiGraphMap<&'a str, usize>,
}

impl<'a> CallGraph<'a> {
    pub fn build(module: &'a Module) -> Self {
        let mut graph = DiGraphMap::new();
        for func in &module.functions {
            graph.add_node(func.name.as_str());
            func.body.walk(&mut |op| {
                if let Some(callee) = op.callee() {
                    if let Some(count) = graph.edge_weight_mut(func.name.as_str(), callee) {
                        *count += 1;
                    } else {
                        graph.add_edge(func.name.as_str(), callee, 1);
                    }
                }
            });
        }
        Self { graph }
    }

    /// Functions called from `name`.
    pub fn callees(&self, name: &'a str) -> Vec<&'a str> {
        self.graph
            .neighbors_directed(name, petgraph::Direction::Outgoing)
            .collect()
    }
}
