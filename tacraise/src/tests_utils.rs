use tacir::modules::{Function, Module, parser::parse_module};

use crate::{
    magic::ATTR_INTERFACE_NAME,
    pass::{Pass, PassStatic, RaiseTargetSubgraphsPass},
    raise::RaiseStatistics,
    utils::conf::RaiseConfig,
};

/// Host run, GPU run, host run (`[A, B]`, `[C]`, `[D]`).
pub const HOST_GPU_HOST: &str = r#"
func @main(%x: f32) -> (f32, f32, f32, f32) {
  %a = "tfl.a"(%x) {tac.device = "CPU", tac.inference_type = "FLOAT"} : f32
  %b = "tfl.b"(%x) {tac.device = "CPU", tac.inference_type = "FLOAT"} : f32
  %c = "tfl.c"(%x) {tac.device = "GPU", tac.inference_type = "FLOAT"} : f32
  %d = "tfl.d"(%x) {tac.device = "CPU", tac.inference_type = "FLOAT"} : f32
  "func.return"(%a, %b, %c, %d)
}
"#;

/// Host loop whose body holds a GPU run around an independent host op.
pub const HOST_WITH_NESTED_GPU: &str = r#"
func @main(%x: f32) -> (f32) {
  %h = "tfl.while"(%x) ({
    ^bb0(%arg: f32):
    %g = "tfl.relu"(%arg) {tac.device = "GPU", tac.inference_type = "FLOAT"} : f32
    %k = "tfl.cast"(%arg) {tac.device = "CPU", tac.inference_type = "FLOAT"} : f32
    %g2 = "tfl.add"(%g, %k) {tac.device = "GPU", tac.inference_type = "FLOAT"} : f32
    "tfl.yield"(%g2)
  }) {tac.device = "CPU", tac.inference_type = "FLOAT"} : f32
  "func.return"(%h)
}
"#;

pub fn parse_module_or_panic(source: &str) -> Module {
    parse_module(source).unwrap_or_else(|err| panic!("failed to parse test module: {err}"))
}

/// Run the raise pass with the default configuration.
pub fn run_raise(module: &mut Module) -> RaiseStatistics {
    run_raise_with(module, &RaiseConfig::default())
}

pub fn run_raise_with(module: &mut Module, config: &RaiseConfig) -> RaiseStatistics {
    let mut pass = RaiseTargetSubgraphsPass::new(config)
        .unwrap_or_else(|err| panic!("failed to build pass: {err}"));
    pass.run_on_module(module)
        .unwrap_or_else(|err| panic!("raise failed: {err}"));
    pass.statistics().clone()
}

/// Functions created by the raise pass, in module order.
pub fn raised_functions(module: &Module) -> Vec<&Function> {
    module
        .functions
        .iter()
        .filter(|func| func.attributes.contains_key(ATTR_INTERFACE_NAME))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_verify() {
        for source in [HOST_GPU_HOST, HOST_WITH_NESTED_GPU] {
            parse_module_or_panic(source).verify().unwrap();
        }
    }

    #[test]
    fn nested_fixture_raises_twice() {
        let mut module = parse_module_or_panic(HOST_WITH_NESTED_GPU);
        let stats = run_raise(&mut module);
        assert_eq!(stats.raised, 2);
        assert_eq!(stats.nested, 1);
        let names = raised_functions(&module)
            .iter()
            .map(|f| f.name.clone())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["func_0_CPU_FLOAT", "func_1_GPU_FLOAT"]);
    }
}
