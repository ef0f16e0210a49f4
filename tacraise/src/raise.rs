//! Raise orchestration: outlining of flushed partitions and recursion into
//! the nested regions of host functions.
use std::collections::BTreeMap;

use log::{debug, trace};
use tacir::{
    analysis::count_uses_in,
    modules::{Function, operation::Operation},
};

use crate::{
    extract::{FunctionScope, Outlined, SubgraphExtractor},
    partition::{Pending, partition_block},
    stamp::stamp,
    target::{InferenceDeviceType, Target, TargetClassifier},
    utils::error::RaiseResult,
};

/// Source of interface identifiers, shared by every extraction of one run.
#[derive(Debug, Default)]
pub struct InterfaceCounter {
    next: u32,
}

impl InterfaceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next identifier. The first one is `0`.
    pub fn advance(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Summary of one raise run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaiseStatistics {
    /// Functions raised in total.
    pub raised: usize,
    /// Functions raised from nested regions of host functions.
    pub nested: usize,
    /// Functions raised per `<device>_<precision>`.
    pub per_target: BTreeMap<String, usize>,
}

impl RaiseStatistics {
    fn record(&mut self, target: &InferenceDeviceType, nested: bool) {
        self.raised += 1;
        if nested {
            self.nested += 1;
        }
        *self.per_target.entry(target.to_string()).or_insert(0) += 1;
    }
}

impl std::fmt::Display for RaiseStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "raised {} subgraphs ({} from nested regions)",
            self.raised, self.nested
        )?;
        for (i, (target, count)) in self.per_target.iter().enumerate() {
            write!(f, "{}{}={}", if i == 0 { ": " } else { ", " }, target, count)?;
        }
        Ok(())
    }
}

/// Drives partitioning over functions, outlines every flushed partition and
/// collects the raised functions.
///
/// Raised functions are kept in creation order, except that a host function
/// is placed before the functions raised from its own nested regions.
pub struct Raiser<'a> {
    classifier: &'a dyn TargetClassifier,
    extractor: &'a mut dyn SubgraphExtractor,
    host_device: &'a str,
    counter: &'a mut InterfaceCounter,
    raised: Vec<Function>,
    statistics: RaiseStatistics,
}

impl<'a> Raiser<'a> {
    pub fn new(
        classifier: &'a dyn TargetClassifier,
        extractor: &'a mut dyn SubgraphExtractor,
        host_device: &'a str,
        counter: &'a mut InterfaceCounter,
    ) -> Self {
        Self {
            classifier,
            extractor,
            host_device,
            counter,
            raised: Vec::new(),
            statistics: RaiseStatistics::default(),
        }
    }

    pub(crate) fn classify(&self, op: &Operation) -> Target {
        let target = self.classifier.classify(op);
        trace!("`{}` classified as {:?}", op.name, target);
        target
    }

    pub(crate) fn is_host(&self, device: &InferenceDeviceType) -> bool {
        device.is_host(self.host_device)
    }

    /// Partition every top-level block of `function`.
    pub fn raise_function(&mut self, function: &mut Function) -> RaiseResult<()> {
        let mut scope = FunctionScope::new(function);
        for block in &mut function.body.blocks {
            partition_block(self, block, &mut scope, false)?;
        }
        Ok(())
    }

    /// Outline the pending partition of `ops` and splice the call in its
    /// place. No-op when nothing is pending.
    pub(crate) fn flush(
        &mut self,
        pending: &mut Pending,
        ops: &mut Vec<Operation>,
        scope: &mut FunctionScope,
        suppress_host: bool,
    ) -> RaiseResult<()> {
        let Some((target, moved, position)) = pending.take(ops) else {
            return Ok(());
        };

        let moved_uses = count_uses_in(&moved);
        let members = moved.len();
        let id = self.counter.advance();
        let Outlined {
            mut function,
            mut call,
        } = self.extractor.extract(moved, scope, id)?;
        let name = stamp(&mut function, &mut call, id)?;
        debug!(
            "raised {} operations targeting {} as `{}`",
            members, target, name
        );

        scope.record_outlining(&moved_uses, &call);
        ops.insert(position, call);
        self.statistics.record(&target, suppress_host);

        let slot = self.raised.len();
        if self.is_host(&target) {
            self.raise_nested(&mut function)?;
        }
        self.raised.insert(slot, function);
        Ok(())
    }

    /// Raise the nested regions of the host operations of a freshly raised
    /// host function. Host runs are not raised again at that level.
    fn raise_nested(&mut self, function: &mut Function) -> RaiseResult<()> {
        let mut scope = FunctionScope::new(function);
        for block in &mut function.body.blocks {
            for op in &mut block.operations {
                let is_host = self
                    .classify(op)
                    .device()
                    .is_some_and(|device| self.is_host(device));
                if !is_host {
                    continue;
                }

                for region in &mut op.regions {
                    for nested in &mut region.blocks {
                        partition_block(self, nested, &mut scope, true)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Raised functions, in module order, and the run summary.
    pub fn finish(self) -> (Vec<Function>, RaiseStatistics) {
        (self.raised, self.statistics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extract::OutlineExtractor, target::AttributeClassifier, tests_utils::parse_module_or_panic,
    };

    #[test]
    fn counter_starts_at_zero() {
        let mut counter = InterfaceCounter::new();
        assert_eq!(counter.advance(), 0);
        assert_eq!(counter.advance(), 1);
        assert_eq!(counter.advance(), 2);
    }

    #[test]
    fn statistics_summary() {
        let mut stats = RaiseStatistics::default();
        stats.record(&InferenceDeviceType::new("GPU", "FLOAT"), false);
        stats.record(&InferenceDeviceType::new("CPU", "FLOAT"), true);
        assert_eq!(
            stats.to_string(),
            "raised 2 subgraphs (1 from nested regions): CPU_FLOAT=1, GPU_FLOAT=1"
        );
    }

    #[test]
    fn counter_is_shared_across_functions() {
        let mut module = parse_module_or_panic(
            r#"
            func @a(%x: f32) {
              %y = "tfl.relu"(%x) {tac.device = "GPU", tac.inference_type = "FLOAT"} : f32
            }
            func @b(%x: f32) {
              %y = "tfl.relu"(%x) {tac.device = "GPU", tac.inference_type = "FLOAT"} : f32
            }
            "#,
        );

        let classifier = AttributeClassifier::default();
        let mut extractor = OutlineExtractor;
        let mut counter = InterfaceCounter::new();
        let mut raiser = Raiser::new(&classifier, &mut extractor, "CPU", &mut counter);
        for func in &mut module.functions {
            raiser.raise_function(func).unwrap();
        }
        let (raised, stats) = raiser.finish();

        let names = raised.iter().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["func_0_GPU_FLOAT", "func_1_GPU_FLOAT"]);
        assert_eq!(stats.raised, 2);
        assert_eq!(counter.advance(), 2);
    }
}
