//! Block partitioning.
//!
//! A block is scanned in order while a pending run of operations sharing one
//! target is grown. The run is flushed (outlined) when an operation with a
//! different target shows up, when an operation that cannot join any run uses
//! one of its results, and at the end of the block.
use std::collections::HashSet;

use log::trace;
use tacir::modules::{Block, operand::Value, operation::Operation};

use crate::{
    extract::FunctionScope,
    raise::Raiser,
    target::{InferenceDeviceType, Target},
    utils::error::RaiseResult,
};

/// Operations waiting to be outlined together.
///
/// Members are tracked by their index in the operation list being rebuilt.
/// Only operations that cannot join a run and do not use a member's result
/// may sit between two members.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    target: Option<InferenceDeviceType>,
    members: Vec<usize>,
    defined: HashSet<Value>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn accepts(&self, device: &InferenceDeviceType) -> bool {
        !self.is_empty() && self.target.as_ref() == Some(device)
    }

    fn push(&mut self, ops: &mut Vec<Operation>, op: Operation) {
        self.defined.extend(op.result_values());
        self.members.push(ops.len());
        ops.push(op);
    }

    fn start(&mut self, device: InferenceDeviceType, ops: &mut Vec<Operation>, op: Operation) {
        self.target = Some(device);
        self.push(ops, op);
    }

    /// Whether `op` reads a result of a member, directly or from one of its
    /// nested regions.
    fn is_used_by(&self, op: &Operation) -> bool {
        !self.is_empty()
            && op
                .used_values()
                .iter()
                .any(|value| self.defined.contains(value))
    }

    /// Remove the members from `ops`.
    ///
    /// Returns the target, the members in their original order and the index
    /// at which the replacing call must be inserted: the slot of the last
    /// member once the members are gone. The target itself is kept.
    pub(crate) fn take(
        &mut self,
        ops: &mut Vec<Operation>,
    ) -> Option<(InferenceDeviceType, Vec<Operation>, usize)> {
        let target = self.target.clone()?;
        let last = *self.members.last()?;
        let members = std::mem::take(&mut self.members);
        self.defined.clear();

        let mut moved = members
            .iter()
            .rev()
            .map(|&index| ops.remove(index))
            .collect::<Vec<_>>();
        moved.reverse();

        Some((target, moved, last + 1 - members.len()))
    }
}

/// Partition `block` in place, outlining every maximal run of operations
/// sharing a target.
///
/// With `suppress_host`, operations targeting the host kind cannot join a run.
pub fn partition_block(
    raiser: &mut Raiser<'_>,
    block: &mut Block,
    scope: &mut FunctionScope,
    suppress_host: bool,
) -> RaiseResult<()> {
    let original = std::mem::take(&mut block.operations);
    let ops = &mut block.operations;
    let mut pending = Pending::default();

    for op in original {
        let device = match raiser.classify(&op) {
            Target::Targeted(device) if !(suppress_host && raiser.is_host(&device)) => device,
            _ => {
                if pending.is_used_by(&op) {
                    trace!("`{}` uses a pending result, flushing", op.name);
                    raiser.flush(&mut pending, ops, scope, suppress_host)?;
                }
                ops.push(op);
                continue;
            }
        };

        if pending.accepts(&device) {
            pending.push(ops, op);
        } else {
            raiser.flush(&mut pending, ops, scope, suppress_host)?;
            pending.start(device, ops, op);
        }
    }

    raiser.flush(&mut pending, ops, scope, suppress_host)
}
