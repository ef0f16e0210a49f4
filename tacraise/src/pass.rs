//! Module passes and their static registry.
//!
//! Passes are registered at link time with [`register_pass!`](crate::register_pass)
//! and looked up by their command-line argument, so tools can build a
//! [`PassPipeline`] from names alone.
use log::{debug, info};
use tacir::{
    analysis::CallGraph,
    modules::{Function, Module},
};

use crate::{
    extract::{OutlineExtractor, SubgraphExtractor},
    magic::{ATTR_DEVICE, ATTR_INTERFACE_NAME, RAISE_PASS_ARGUMENT},
    raise::{InterfaceCounter, RaiseStatistics, Raiser},
    target::{AttributeClassifier, TargetClassifier},
    utils::{
        conf::RaiseConfig,
        error::{RaiseError, RaiseResult},
    },
};

/// Identification of a pass.
///
/// This trait should not be directly implemented, instead the user should
/// implement [`PassStatic`] which automatically implements this trait.
pub trait DynPassBase {
    /// Command-line argument selecting the pass.
    fn argument(&self) -> &'static str;

    /// One-line human readable summary.
    fn description(&self) -> &'static str;
}

/// A transformation over a whole module.
pub trait Pass: DynPassBase {
    fn run_on_module(&mut self, module: &mut Module) -> RaiseResult<()>;
}

/// Static, non-dynamic side of a pass.
pub trait PassStatic: Sized {
    const ARGUMENT: &'static str;
    const DESCRIPTION: &'static str;

    /// Constructs the pass from the tool configuration.
    fn new(config: &RaiseConfig) -> RaiseResult<Self>;
}

impl<T: PassStatic> DynPassBase for T {
    fn argument(&self) -> &'static str {
        T::ARGUMENT
    }

    fn description(&self) -> &'static str {
        T::DESCRIPTION
    }
}

/// Inventory containing pass registrations.
pub struct PassRegistration {
    pub argument: &'static str,
    pub description: &'static str,
    pub constructor: fn(&RaiseConfig) -> RaiseResult<Box<dyn Pass>>,
}
inventory::collect!(PassRegistration);

#[macro_export]
macro_rules! register_pass {
    (
        $pass:ty
    ) => {
        $crate::inventory::submit! {
            $crate::pass::PassRegistration {
                argument: <$pass as $crate::pass::PassStatic>::ARGUMENT,
                description: <$pass as $crate::pass::PassStatic>::DESCRIPTION,
                constructor: |config: &$crate::utils::conf::RaiseConfig| -> $crate::utils::error::RaiseResult<Box<dyn $crate::pass::Pass>> {
                    let pass = <$pass as $crate::pass::PassStatic>::new(config)?;
                    Ok(Box::new(pass))
                },
            }
        }
    };
    () => {};
}

/// An ordered list of passes run one after the other.
#[derive(Default)]
pub struct PassPipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl PassPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every registered pass, sorted by argument.
    pub fn registered() -> Vec<&'static PassRegistration> {
        let mut registrations = inventory::iter::<PassRegistration>
            .into_iter()
            .collect::<Vec<_>>();
        registrations.sort_by_key(|registration| registration.argument);
        registrations
    }

    /// Build a pipeline from registered pass arguments, in order.
    pub fn from_arguments<'a>(
        arguments: impl IntoIterator<Item = &'a str>,
        config: &RaiseConfig,
    ) -> RaiseResult<Self> {
        let mut pipeline = Self::new();
        for argument in arguments {
            let registration = inventory::iter::<PassRegistration>
                .into_iter()
                .find(|registration| registration.argument == argument)
                .ok_or_else(|| RaiseError::UnknownPass(argument.to_string()))?;
            pipeline.add((registration.constructor)(config)?);
        }
        Ok(pipeline)
    }

    pub fn add(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    pub fn arguments(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.argument()).collect()
    }

    pub fn run(&mut self, module: &mut Module) -> RaiseResult<()> {
        for pass in &mut self.passes {
            debug!("running pass `{}`", pass.argument());
            pass.run_on_module(module)?;
        }
        Ok(())
    }
}

/// Groups target-annotated operations into raised functions.
///
/// The module is only modified when the whole run succeeds.
pub struct RaiseTargetSubgraphsPass {
    host_device: String,
    verify_after: bool,
    classifier: Box<dyn TargetClassifier>,
    extractor: Box<dyn SubgraphExtractor>,
    statistics: RaiseStatistics,
}

impl RaiseTargetSubgraphsPass {
    pub fn with_classifier(mut self, classifier: impl TargetClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn with_extractor(mut self, extractor: impl SubgraphExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Summary of the last successful run.
    pub fn statistics(&self) -> &RaiseStatistics {
        &self.statistics
    }

    fn is_raised(function: &Function) -> bool {
        function.attributes.contains_key(ATTR_INTERFACE_NAME)
    }

    /// Only functions raised for the host kind may call other raised
    /// functions.
    fn check_cross_target_calls(&self, module: &Module) -> RaiseResult<()> {
        let graph = CallGraph::build(module);
        for caller in module.functions.iter().filter(|f| Self::is_raised(f)) {
            let device = caller
                .attributes
                .get(ATTR_DEVICE)
                .and_then(|attr| attr.as_str());
            if device == Some(self.host_device.as_str()) {
                continue;
            }

            for callee in graph.callees(&caller.name) {
                if module.function(callee).is_some_and(Self::is_raised) {
                    return Err(RaiseError::IllegalCrossTargetCall {
                        caller: caller.name.clone(),
                        callee: callee.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl PassStatic for RaiseTargetSubgraphsPass {
    const ARGUMENT: &'static str = RAISE_PASS_ARGUMENT;
    const DESCRIPTION: &'static str =
        "Merge target-annotated operations together and raise them as functions.";

    fn new(config: &RaiseConfig) -> RaiseResult<Self> {
        Ok(Self {
            host_device: config.host_device.clone(),
            verify_after: config.verify_after,
            classifier: Box::new(AttributeClassifier::default()),
            extractor: Box::new(OutlineExtractor),
            statistics: RaiseStatistics::default(),
        })
    }
}

impl Pass for RaiseTargetSubgraphsPass {
    fn run_on_module(&mut self, module: &mut Module) -> RaiseResult<()> {
        let mut functions = module.functions.clone();
        let mut counter = InterfaceCounter::new();
        let mut raiser = Raiser::new(
            self.classifier.as_ref(),
            self.extractor.as_mut(),
            &self.host_device,
            &mut counter,
        );
        for function in &mut functions {
            raiser.raise_function(function)?;
        }
        let (raised, statistics) = raiser.finish();
        functions.extend(raised);

        let candidate = Module { functions };
        if self.verify_after {
            candidate.verify()?;
            self.check_cross_target_calls(&candidate)?;
        }

        info!("{}", statistics);
        *module = candidate;
        self.statistics = statistics;
        Ok(())
    }
}

crate::register_pass!(RaiseTargetSubgraphsPass);
