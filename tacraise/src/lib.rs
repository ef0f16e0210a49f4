//! Target subgraph raising for target-annotated IR.
//!
//! Operations annotated with a target (a hardware kind plus an inference
//! precision) are grouped into maximal contiguous runs, each run is outlined
//! into a private function and replaced in place by a call. Runs targeting the
//! host kind may contain control flow whose nested regions hold further
//! targeted work; those regions are raised recursively.
//!
//! Most consumers only need [`pass::RaiseTargetSubgraphsPass`] or a
//! [`pass::PassPipeline`] built from registered pass arguments.

pub mod extract;
pub mod magic;
pub mod partition;
pub mod pass;
pub mod raise;
pub mod stamp;
pub mod target;
#[cfg(any(test, feature = "test-utils"))]
pub mod tests_utils;
pub mod utils;

pub extern crate inventory;
