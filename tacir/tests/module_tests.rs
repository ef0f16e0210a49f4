use tacir::{
    analysis::{CallGraph, count_uses, value_types},
    modules::{
        Module, Visibility,
        attribute::Attribute,
        operand::Value,
        parser::{extend_module_from_path, extend_module_from_string, parse_module},
    },
    types::{FType, Type},
    utils::Error,
};

const PIPELINE_SOURCE: &str = r#"
func @main(%input: tensor<1x4xf32>) -> (tensor<1x4xf32>) {
  %a = "tfl.relu"(%input) {tac.device = "GPU", tac.inference_type = "FLOAT"} : tensor<1x4xf32>
  %b = "func.call"(%a) {callee = @helper} : tensor<1x4xf32>
  "func.return"(%b)
}

func private @helper(%x: tensor<1x4xf32>) -> (tensor<1x4xf32>) {
  %y = "tfl.abs"(%x) : tensor<1x4xf32>
  "func.return"(%y)
}
"#;

fn parse_pipeline() -> Module {
    parse_module(PIPELINE_SOURCE).expect("failed to parse pipeline")
}

#[test]
fn parsed_module_verifies() {
    let module = parse_pipeline();
    module.verify().expect("pipeline should verify");

    let helper = module.function("helper").expect("helper present");
    assert_eq!(helper.visibility, Visibility::Private);
    assert_eq!(helper.params()[0].0, Value(0));
}

#[test]
fn value_names_restart_in_every_function() {
    let module = parse_pipeline();
    let main = module.function("main").unwrap();
    let helper = module.function("helper").unwrap();
    assert_eq!(main.params()[0].0, Value(0));
    assert_eq!(helper.entry_block().unwrap().operations[0].results[0].0, Value(1));
}

#[test]
fn printed_module_round_trips() {
    let module = parse_pipeline();
    let printed = module.to_string();
    let reparsed = parse_module(&printed).expect("printed module parses");
    assert_eq!(reparsed, module);
    assert_eq!(reparsed.to_string(), printed);
}

#[test]
fn call_operations_expose_their_callee() {
    let module = parse_pipeline();
    let main = module.function("main").unwrap();
    let call = &main.entry_block().unwrap().operations[1];
    assert!(call.is_call());
    assert_eq!(call.callee(), Some("helper"));
    assert_eq!(
        call.attr("callee"),
        Some(&Attribute::Symbol("helper".into()))
    );

    let graph = CallGraph::build(&module);
    assert_eq!(graph.callees("main"), vec!["helper"]);
    assert!(graph.callees("helper").is_empty());
}

#[test]
fn analyses_see_every_value() {
    let module = parse_pipeline();
    let main = module.function("main").unwrap();
    let uses = count_uses(&main.body);
    assert_eq!(uses[&Value(0)], 1);
    assert_eq!(uses[&Value(1)], 1);
    assert_eq!(uses[&Value(2)], 1);

    let types = value_types(main);
    assert_eq!(types.len(), 3);
    assert!(types[&Value(1)].is_tensor());
}

#[test]
fn extending_with_existing_function_fails() {
    let mut module = parse_pipeline();
    let err = extend_module_from_string(&mut module, "func @helper() { }").unwrap_err();
    assert_eq!(err, Error::DuplicateFunction("helper".into()));
    assert_eq!(module.functions.len(), 2);
}

#[test]
fn syntax_errors_carry_positions() {
    let err = parse_module("func @main( {").unwrap_err();
    assert!(err.is_parser_errors());
    match err {
        Error::ParserErrors { errors } => {
            assert!(!errors.is_empty());
            assert!(errors[0].file.is_none());
            assert!(errors[0].start <= errors[0].end);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn reading_a_missing_file_fails_with_io_error() {
    let mut module = Module::default();
    let err = extend_module_from_path(&mut module, "/nonexistent/module.tac").unwrap_err();
    assert!(err.is_io_error());
}

#[test]
fn reading_from_path_records_file_name() {
    let path = std::env::temp_dir().join(format!("tacir-{}.tac", std::process::id()));
    std::fs::write(&path, "func @main() {\n  \"func.return\"(%nope)\n}\n").unwrap();

    let mut module = Module::default();
    extend_module_from_path(&mut module, &path).unwrap();
    let err = module.verify().unwrap_err();
    assert!(err.is_undefined_value());

    std::fs::write(&path, "func @main() { oops }").unwrap();
    let err = extend_module_from_path(&mut Module::default(), &path).unwrap_err();
    std::fs::remove_file(&path).ok();
    match err {
        Error::ParserErrors { errors } => {
            assert_eq!(errors[0].file.as_deref(), Some(path.display().to_string().as_str()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn scalar_types_parse() {
    let module = parse_module(
        r#"func @f(%a: i32, %b: bf16, %c: none) -> (f32) {
  %d = "tfl.cast"(%a, %b, %c) : f32
  "func.return"(%d)
}"#,
    )
    .unwrap();
    let func = module.function("f").unwrap();
    let types = func.params().iter().map(|(_, ty)| ty.clone()).collect::<Vec<_>>();
    assert_eq!(types[1], Type::Float(FType::BF16));
    assert_eq!(types[2], Type::None);
    module.verify().unwrap();
}
