//! Parser for the textual IR produced by [`crate::modules::fmt`].
//!
//! Value names (`%x`, `%0`, ...) are mapped to fresh [`Value`] identifiers in
//! order of first appearance, so printed modules can be parsed back and
//! hand-written ones may use descriptive names.
use std::{cell::RefCell, collections::BTreeMap, path::Path, rc::Rc};

use chumsky::prelude::*;
use smallvec::SmallVec;

use crate::{
    modules::{
        Block, Function, Module, Region, Visibility,
        attribute::{Attribute, Attributes},
        operand::Value,
        operation::Operation,
    },
    types::{Dim, FType, IType, PrimaryBasicType, TensorType, Type},
    utils::{Error, ParserError},
};

type ParseErr<'src> = extra::Err<Rich<'src, char>>;

/// Shared mapping from textual value names to [`Value`] identifiers.
#[derive(Clone, Default)]
pub struct ValueNamer {
    names: Rc<RefCell<BTreeMap<String, Value>>>,
}

impl ValueNamer {
    /// Resolve `name`, allocating the next identifier on first use.
    pub fn get(&self, name: &str) -> Value {
        let names = &mut *self.names.borrow_mut();
        if let Some(value) = names.get(name) {
            *value
        } else {
            let value = Value(names.len() as u32);
            names.insert(name.to_string(), value);
            value
        }
    }

    /// Forget every name; identifiers restart from `%0`.
    pub fn reset(&self) {
        self.names.borrow_mut().clear();
    }
}

impl<const N: usize> chumsky::container::Container<Value> for SmallVec<Value, N> {
    fn with_capacity(n: usize) -> Self {
        SmallVec::with_capacity(n)
    }

    fn push(&mut self, item: Value) {
        SmallVec::push(self, item)
    }
}

pub fn whitespace<'src>() -> impl Parser<'src, &'src str, (), ParseErr<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_whitespace())
        .repeated()
        .at_least(1)
        .ignored()
        .labelled("whitespace")
}

pub fn itype_parser<'src>() -> impl Parser<'src, &'src str, IType, ParseErr<'src>> + Clone {
    just('i')
        .ignore_then(text::int(10).try_map(|digits: &str, span| {
            let width: u32 = digits.parse().map_err(|_| {
                Rich::custom(span, format!("invalid integer type width: {}", digits))
            })?;

            IType::new(width).ok_or_else(|| {
                Rich::custom(
                    span,
                    format!(
                        "integer type width must be within {}..={}, got {}",
                        IType::MIN_BITS,
                        IType::MAX_BITS,
                        width
                    ),
                )
            })
        }))
        .labelled("integer type")
}

pub fn ftype_parser<'src>() -> impl Parser<'src, &'src str, FType, ParseErr<'src>> + Clone {
    choice((
        just("f16").to(FType::F16),
        just("bf16").to(FType::BF16),
        just("f32").to(FType::F32),
        just("f64").to(FType::F64),
    ))
    .labelled("floating-point type")
}

pub fn primary_type_parser<'src>()
-> impl Parser<'src, &'src str, PrimaryBasicType, ParseErr<'src>> + Clone {
    choice((
        itype_parser().map(PrimaryBasicType::Int),
        ftype_parser().map(PrimaryBasicType::Float),
    ))
    .labelled("primitive type")
}

pub fn type_parser<'src>() -> impl Parser<'src, &'src str, Type, ParseErr<'src>> + Clone {
    let dim = choice((
        just('?').to(Dim::Dynamic),
        text::int(10).try_map(|digits: &str, span| {
            digits
                .parse::<u64>()
                .map(Dim::Fixed)
                .map_err(|_| Rich::custom(span, format!("invalid tensor dimension: {}", digits)))
        }),
    ))
    .then_ignore(just('x'))
    .labelled("tensor dimension");

    let tensor = just("tensor<")
        .ignore_then(dim.repeated().collect::<Vec<_>>())
        .then(primary_type_parser())
        .then_ignore(just('>'))
        .map(|(shape, element)| Type::Tensor(TensorType { shape, element }))
        .labelled("tensor type");

    choice((
        tensor,
        just("none").to(Type::None),
        primary_type_parser().map(Type::from),
    ))
    .labelled("type")
}

fn identifier_parser<'src>(
    extra_chars: &'static str,
) -> impl Parser<'src, &'src str, &'src str, ParseErr<'src>> + Clone {
    any()
        .filter(move |c: &char| c.is_ascii_alphanumeric() || *c == '_' || extra_chars.contains(*c))
        .repeated()
        .at_least(1)
        .to_slice()
}

pub fn symbol_parser<'src>() -> impl Parser<'src, &'src str, String, ParseErr<'src>> + Clone {
    just('@')
        .ignore_then(identifier_parser(".$"))
        .map(|s: &str| s.to_string())
        .labelled("symbol")
}

pub fn string_parser<'src>() -> impl Parser<'src, &'src str, String, ParseErr<'src>> + Clone {
    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('"'),
        just('n').to('\n'),
        just('t').to('\t'),
    )));

    none_of("\\\"")
        .or(escape)
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .labelled("string literal")
}

pub fn attribute_parser<'src>() -> impl Parser<'src, &'src str, Attribute, ParseErr<'src>> + Clone
{
    let integer = just('-')
        .or_not()
        .then(text::int(10))
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<i64>()
                .map_err(|_| Rich::custom(span, format!("integer attribute out of range: {}", s)))
        })
        .labelled("integer");

    choice((
        string_parser().map(Attribute::Str),
        symbol_parser().map(Attribute::Symbol),
        just("true").to(Attribute::Bool(true)),
        just("false").to(Attribute::Bool(false)),
        just("unit").to(Attribute::Unit),
        integer.map(Attribute::Int),
    ))
    .labelled("attribute")
}

pub fn attribute_dict_parser<'src>()
-> impl Parser<'src, &'src str, Attributes, ParseErr<'src>> + Clone {
    identifier_parser(".")
        .labelled("attribute name")
        .then_ignore(just('=').padded())
        .then(attribute_parser())
        .padded()
        .separated_by(just(','))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just('{'), just('}'))
        .map(|entries| {
            entries
                .into_iter()
                .map(|(name, attr)| (name.to_string(), attr))
                .collect::<Attributes>()
        })
        .labelled("attribute dictionary")
}

pub fn value_parser<'src>(
    namer: ValueNamer,
) -> impl Parser<'src, &'src str, Value, ParseErr<'src>> + Clone {
    just('%')
        .ignore_then(identifier_parser(""))
        .map(move |name: &str| namer.get(name))
        .labelled("value")
}

fn typed_value_parser<'src>(
    namer: ValueNamer,
) -> impl Parser<'src, &'src str, (Value, Type), ParseErr<'src>> + Clone {
    value_parser(namer)
        .then_ignore(just(':').padded())
        .then(type_parser())
}

fn block_label_parser<'src>(
    namer: ValueNamer,
) -> impl Parser<'src, &'src str, Vec<(Value, Type)>, ParseErr<'src>> + Clone {
    just('^')
        .ignore_then(text::ascii::ident())
        .ignore_then(
            typed_value_parser(namer)
                .padded()
                .separated_by(just(','))
                .collect::<Vec<_>>()
                .delimited_by(just('('), just(')'))
                .or_not(),
        )
        .then_ignore(just(':'))
        .map(|args| args.unwrap_or_default())
        .labelled("block label")
}

pub fn operation_parser<'src>(
    namer: ValueNamer,
) -> impl Parser<'src, &'src str, Operation, ParseErr<'src>> + Clone {
    recursive(move |operation| {
        let value = value_parser(namer.clone());

        let entry_block = block_label_parser(namer.clone())
            .padded()
            .or_not()
            .then(operation.clone().padded().repeated().collect::<Vec<_>>())
            .map(|(args, operations)| Block {
                args: args.unwrap_or_default(),
                operations,
            });

        let labelled_block = block_label_parser(namer.clone())
            .padded()
            .then(operation.clone().padded().repeated().collect::<Vec<_>>())
            .map(|(args, operations)| Block { args, operations });

        let region = entry_block
            .then(labelled_block.repeated().collect::<Vec<_>>())
            .delimited_by(just('{').padded(), just('}').padded())
            .map(|(entry, rest)| {
                let mut blocks = vec![entry];
                blocks.extend(rest);
                Region { blocks }
            })
            .labelled("region");

        let regions = region
            .separated_by(just(',').padded())
            .at_least(1)
            .collect::<Vec<_>>()
            .delimited_by(just('(').padded(), just(')').padded());

        let results = value
            .clone()
            .padded()
            .separated_by(just(','))
            .at_least(1)
            .collect::<Vec<_>>()
            .then_ignore(just('='))
            .or_not();

        let operands = value
            .padded()
            .separated_by(just(','))
            .collect::<SmallVec<Value, 4>>()
            .delimited_by(just('('), just(')'))
            .labelled("operand list");

        let types = just(':')
            .padded()
            .ignore_then(
                type_parser()
                    .padded()
                    .separated_by(just(','))
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .or_not();

        results
            .padded()
            .then(string_parser().labelled("operation name"))
            .then(operands.padded())
            .then(regions.or_not())
            .then(attribute_dict_parser().padded().or_not())
            .then(types)
            .validate(
                |(((((results, name), operands), regions), attributes), types), extra, emit| {
                    let results = results.unwrap_or_default();
                    let types = types.unwrap_or_default();
                    if results.len() != types.len() {
                        emit.emit(Rich::custom(
                            extra.span(),
                            format!(
                                "operation `{}` defines {} results but lists {} result types",
                                name,
                                results.len(),
                                types.len()
                            ),
                        ));
                    }

                    Operation {
                        name,
                        operands,
                        results: results.into_iter().zip(types).collect(),
                        regions: regions.unwrap_or_default(),
                        attributes: attributes.unwrap_or_default(),
                    }
                },
            )
            .labelled("operation")
    })
}

pub fn function_parser<'src>(
    namer: ValueNamer,
) -> impl Parser<'src, &'src str, Function, ParseErr<'src>> {
    let operation = operation_parser(namer.clone());
    let scope = namer.clone();

    let visibility = choice((
        just("public").to(Visibility::Public),
        just("private").to(Visibility::Private),
    ))
    .labelled("visibility");

    let params = typed_value_parser(namer.clone())
        .padded()
        .separated_by(just(','))
        .collect::<Vec<_>>()
        .delimited_by(just('('), just(')'))
        .labelled("parameter list");

    let result_types = just("->")
        .padded()
        .ignore_then(
            type_parser()
                .padded()
                .separated_by(just(','))
                .collect::<Vec<_>>()
                .delimited_by(just('('), just(')')),
        )
        .or_not();

    let attributes = just("attributes")
        .padded()
        .ignore_then(attribute_dict_parser())
        .or_not();

    let labelled_block = block_label_parser(namer)
        .padded()
        .then(operation.clone().padded().repeated().collect::<Vec<_>>())
        .map(|(args, operations)| Block { args, operations });

    let body = operation
        .padded()
        .repeated()
        .collect::<Vec<_>>()
        .then(labelled_block.repeated().collect::<Vec<_>>())
        .delimited_by(just('{').padded(), just('}').padded());

    // Value names are scoped to a function; `then` keeps the reset in emitting mode
    just("func")
        .map(move |_| scope.reset())
        .then_ignore(whitespace())
        .then(visibility.then_ignore(whitespace()).or_not())
        .map(|((), visibility)| visibility)
        .then(symbol_parser())
        .then(params.padded())
        .then(result_types)
        .then(attributes.padded())
        .then(body)
        .map(
            |(((((visibility, name), params), result_types), attributes), (entry, rest))| {
                let mut blocks = vec![Block {
                    args: params,
                    operations: entry,
                }];
                blocks.extend(rest);

                Function {
                    name,
                    visibility: visibility.unwrap_or_default(),
                    result_types: result_types.unwrap_or_default(),
                    attributes: attributes.unwrap_or_default(),
                    body: Region { blocks },
                }
            },
        )
        .labelled("function")
}

pub fn module_parser<'src>() -> impl Parser<'src, &'src str, Vec<Function>, ParseErr<'src>> {
    function_parser(ValueNamer::default())
        .padded()
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
}

fn extend_module_impl(module: &mut Module, source: &str, file: Option<&str>) -> Result<(), Error> {
    let functions = module_parser().parse(source).into_result().map_err(|errors| {
        Error::ParserErrors {
            errors: errors
                .into_iter()
                .map(|error| ParserError {
                    file: file.map(|f| f.to_string()),
                    start: error.span().start,
                    end: error.span().end,
                    message: error.to_string(),
                })
                .collect(),
        }
    })?;

    for function in functions {
        if module.function(&function.name).is_some() {
            return Err(Error::DuplicateFunction(function.name));
        }
        module.functions.push(function);
    }

    Ok(())
}

/// Parse `source` and append its functions to `module`.
pub fn extend_module_from_string(module: &mut Module, source: &str) -> Result<(), Error> {
    extend_module_impl(module, source, None)
}

/// Read and parse the file at `path`, appending its functions to `module`.
pub fn extend_module_from_path(module: &mut Module, path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| Error::IoError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    extend_module_impl(module, &source, Some(&path.display().to_string()))
}

/// Parse a standalone module.
pub fn parse_module(source: &str) -> Result<Module, Error> {
    let mut module = Module::default();
    extend_module_from_string(&mut module, source)?;
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tensor_types() {
        let ty = type_parser().parse("tensor<1x?x4xf32>").into_result().unwrap();
        assert_eq!(ty.to_string(), "tensor<1x?x4xf32>");
        assert_eq!(
            type_parser().parse("i8").into_result().unwrap(),
            Type::Int(IType::I8)
        );
    }

    #[test]
    fn parses_attribute_dictionary() {
        let attrs = attribute_dict_parser()
            .parse(r#"{tac.device = "GPU", n = -3, f = false, callee = @func_0, m = unit}"#)
            .into_result()
            .unwrap();
        assert_eq!(attrs["tac.device"], Attribute::Str("GPU".into()));
        assert_eq!(attrs["n"], Attribute::Int(-3));
        assert_eq!(attrs["f"], Attribute::Bool(false));
        assert_eq!(attrs["callee"], Attribute::Symbol("func_0".into()));
        assert_eq!(attrs["m"], Attribute::Unit);
    }

    #[test]
    fn parses_function_with_nested_region() {
        let module = parse_module(
            r#"
            func @main(%x: f32) -> (f32) {
              %y = "tfl.while"(%x) ({
                ^bb0(%a: f32):
                %b = "tfl.relu"(%a) {tac.device = "GPU", tac.inference_type = "FLOAT"} : f32
                "tfl.yield"(%b)
              }) {tac.device = "CPU", tac.inference_type = "FLOAT"} : f32
              "func.return"(%y)
            }
            "#,
        )
        .unwrap();

        let func = module.function("main").unwrap();
        assert_eq!(func.params().len(), 1);
        let entry = func.entry_block().unwrap();
        assert_eq!(entry.operations.len(), 2);
        let while_op = &entry.operations[0];
        assert_eq!(while_op.str_attr("tac.device"), Some("CPU"));
        let nested = &while_op.regions[0].blocks[0];
        assert_eq!(nested.args.len(), 1);
        assert_eq!(nested.operations[0].name, "tfl.relu");
    }

    #[test]
    fn result_type_count_must_match() {
        let err = parse_module(r#"func @f() { %a, %b = "x.y"() : f32 }"#).unwrap_err();
        assert!(err.is_parser_errors());
    }

    #[test]
    fn duplicate_functions_are_rejected() {
        let err = parse_module("func @f() { }\nfunc @f() { }").unwrap_err();
        assert_eq!(err, Error::DuplicateFunction("f".into()));
    }

    #[test]
    fn printed_module_parses_back() {
        let source = r#"func private @g(%0: tensor<2xf32>) -> (tensor<2xf32>) attributes {tac.device = "GPU"} {
  %1 = "tfl.abs"(%0) {tac.device = "GPU", tac.inference_type = "FLOAT"} : tensor<2xf32>
  "func.return"(%1)
}
"#;
        let module = parse_module(source).unwrap();
        assert_eq!(module.to_string(), source);
    }
}
