//! Pretty-print helpers for operations, blocks, functions, and modules.
//!
//! The textual form is the one accepted by [`crate::modules::parser`]:
//!
//! ```text
//! func @main(%0: f32) -> (f32) {
//!   %1 = "tfl.relu"(%0) {tac.device = "GPU", tac.inference_type = "FLOAT"} : f32
//!   "func.return"(%1)
//! }
//! ```
use crate::modules::{Block, Function, Module, Region, attribute::Attributes, operation::Operation};

const INDENT: &str = "  ";

fn write_indent(f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    Ok(())
}

fn write_attributes(f: &mut std::fmt::Formatter<'_>, attributes: &Attributes) -> std::fmt::Result {
    write!(f, "{{")?;
    for (i, (name, attr)) in attributes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} = {}", name, attr)?;
    }
    write!(f, "}}")
}

fn write_block_body(
    f: &mut std::fmt::Formatter<'_>,
    block: &Block,
    depth: usize,
) -> std::fmt::Result {
    for op in &block.operations {
        write_indent(f, depth)?;
        writeln!(f, "{}", op.fmt(depth))?;
    }
    Ok(())
}

fn write_block_label(
    f: &mut std::fmt::Formatter<'_>,
    block: &Block,
    index: usize,
    depth: usize,
) -> std::fmt::Result {
    write_indent(f, depth)?;
    write!(f, "^bb{}", index)?;
    if !block.args.is_empty() {
        write!(f, "(")?;
        for (i, (value, ty)) in block.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", value, ty)?;
        }
        write!(f, ")")?;
    }
    writeln!(f, ":")
}

fn write_region(f: &mut std::fmt::Formatter<'_>, region: &Region, depth: usize) -> std::fmt::Result {
    writeln!(f, "{{")?;
    for (index, block) in region.blocks.iter().enumerate() {
        if index > 0 || !block.args.is_empty() {
            write_block_label(f, block, index, depth + 1)?;
        }
        write_block_body(f, block, depth + 1)?;
    }
    write_indent(f, depth)?;
    write!(f, "}}")
}

impl Operation {
    /// Build a formatting helper that renders the operation as if it was
    /// printed at nesting `depth` (used to indent nested regions).
    pub fn fmt(&self, depth: usize) -> impl std::fmt::Display + Copy + '_ {
        #[derive(Clone, Copy)]
        struct Fmt<'a> {
            op: &'a Operation,
            depth: usize,
        }

        impl<'a> std::fmt::Display for Fmt<'a> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let op = self.op;
                if !op.results.is_empty() {
                    for (i, (value, _)) in op.results.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", value)?;
                    }
                    write!(f, " = ")?;
                }

                write!(f, "{:?}(", op.name)?;
                for (i, operand) in op.operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", operand)?;
                }
                write!(f, ")")?;

                if !op.regions.is_empty() {
                    write!(f, " (")?;
                    for (i, region) in op.regions.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write_region(f, region, self.depth)?;
                    }
                    write!(f, ")")?;
                }

                if !op.attributes.is_empty() {
                    write!(f, " ")?;
                    write_attributes(f, &op.attributes)?;
                }

                if !op.results.is_empty() {
                    write!(f, " : ")?;
                    for (i, (_, ty)) in op.results.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", ty)?;
                    }
                }
                Ok(())
            }
        }

        Fmt { op: self, depth }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Operation::fmt(self, 0))
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "func ")?;
        if self.visibility != Default::default() {
            write!(f, "{} ", self.visibility.to_str())?;
        }
        write!(f, "@{}(", self.name)?;
        for (i, (value, ty)) in self.params().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", value, ty)?;
        }
        write!(f, ")")?;

        if !self.result_types.is_empty() {
            write!(f, " -> (")?;
            for (i, ty) in self.result_types.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", ty)?;
            }
            write!(f, ")")?;
        }

        if !self.attributes.is_empty() {
            write!(f, " attributes ")?;
            write_attributes(f, &self.attributes)?;
        }

        writeln!(f, " {{")?;
        for (index, block) in self.body.blocks.iter().enumerate() {
            if index > 0 {
                write_block_label(f, block, index, 1)?;
            }
            write_block_body(f, block, 1)?;
        }
        write!(f, "}}")
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, function) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", function)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        modules::{Block, Function, Region, operand::Value, operation::Operation},
        types::{FType, Type},
    };

    #[test]
    fn operation_prints_generic_form() {
        let op = Operation::new("tfl.add")
            .with_operands([Value(0), Value(1)])
            .with_result(Value(2), FType::F32)
            .with_attr("tac.device", "GPU");
        assert_eq!(
            op.to_string(),
            r#"%2 = "tfl.add"(%0, %1) {tac.device = "GPU"} : f32"#
        );
    }

    #[test]
    fn function_prints_signature_and_nested_region() {
        let mut func = Function::new(
            "main",
            vec![(Value(0), Type::Float(FType::F32))],
            vec![Type::Float(FType::F32)],
        );
        let body = Region::single(Block {
            args: vec![(Value(2), Type::Float(FType::F32))],
            operations: vec![Operation::new("tfl.yield").with_operand(Value(2))],
        });
        let entry = func.entry_block_mut().unwrap();
        entry.operations.push(
            Operation::new("tfl.while")
                .with_operand(Value(0))
                .with_result(Value(1), FType::F32)
                .with_region(body),
        );
        entry.operations.push(Operation::ret([Value(1)]));

        let expected = r#"func @main(%0: f32) -> (f32) {
  %1 = "tfl.while"(%0) ({
    ^bb0(%2: f32):
    "tfl.yield"(%2)
  }) : f32
  "func.return"(%1)
}"#;
        assert_eq!(func.to_string(), expected);
    }
}
