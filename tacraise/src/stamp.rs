use tacir::modules::{Function, attribute::Attribute, operation::Operation};

use crate::{
    magic::{ATTR_DEVICE, ATTR_INFERENCE_TYPE, ATTR_INTERFACE_NAME, INTERFACE_NAME_PREFIX},
    utils::error::{RaiseError, RaiseResult},
};

fn first_op_attr(function: &Function, attribute: &str) -> RaiseResult<String> {
    function
        .entry_block()
        .and_then(|block| block.operations.first())
        .and_then(|op| op.str_attr(attribute))
        .map(|value| value.to_string())
        .ok_or_else(|| RaiseError::MissingTargetAttribute {
            function: function.name.clone(),
            attribute: attribute.to_string(),
        })
}

/// Name a raised function and its call after interface `id`.
///
/// Both receive the interface name plus the device and precision read from
/// the first operation of the function. The function is renamed to
/// `func_<id>_<device>_<precision>` and the call retargeted accordingly.
/// Returns the final name.
pub fn stamp(function: &mut Function, call: &mut Operation, id: u32) -> RaiseResult<String> {
    let interface_name = format!("{}{}", INTERFACE_NAME_PREFIX, id);
    let device = first_op_attr(function, ATTR_DEVICE)?;
    let inference_type = first_op_attr(function, ATTR_INFERENCE_TYPE)?;

    for (name, value) in [
        (ATTR_INTERFACE_NAME, &interface_name),
        (ATTR_DEVICE, &device),
        (ATTR_INFERENCE_TYPE, &inference_type),
    ] {
        function
            .attributes
            .insert(name.to_string(), Attribute::Str(value.clone()));
        call.set_attr(name, value.as_str());
    }

    let final_name = format!("{}_{}_{}", interface_name, device, inference_type);
    function.name = final_name.clone();
    call.set_callee(final_name.as_str());
    Ok(final_name)
}

#[cfg(test)]
mod tests {
    use tacir::{modules::operand::Value, types::FType};

    use super::*;

    fn outlined(first: Operation) -> (Function, Operation) {
        let mut function = Function::new("func_3", vec![(Value(0), FType::F32.into())], vec![]);
        function.entry_block_mut().unwrap().operations = vec![first, Operation::ret([])];
        let call = Operation::call("func_3", [Value(0)], []);
        (function, call)
    }

    #[test]
    fn names_and_attributes_are_propagated() {
        let (mut function, mut call) = outlined(
            Operation::new("tfl.conv")
                .with_operand(Value(0))
                .with_attr(ATTR_DEVICE, "GPU")
                .with_attr(ATTR_INFERENCE_TYPE, "FLOAT"),
        );

        let name = stamp(&mut function, &mut call, 3).unwrap();
        assert_eq!(name, "func_3_GPU_FLOAT");
        assert_eq!(function.name, name);
        assert_eq!(call.callee(), Some("func_3_GPU_FLOAT"));
        for attrs in [&function.attributes, &call.attributes] {
            assert_eq!(attrs[ATTR_INTERFACE_NAME], Attribute::Str("func_3".into()));
            assert_eq!(attrs[ATTR_DEVICE], Attribute::Str("GPU".into()));
            assert_eq!(attrs[ATTR_INFERENCE_TYPE], Attribute::Str("FLOAT".into()));
        }
    }

    #[test]
    fn missing_precision_is_fatal() {
        let (mut function, mut call) =
            outlined(Operation::new("tfl.conv").with_attr(ATTR_DEVICE, "GPU"));
        let err = stamp(&mut function, &mut call, 0).unwrap_err();
        match err {
            RaiseError::MissingTargetAttribute { function, attribute } => {
                assert_eq!(function, "func_3");
                assert_eq!(attribute, ATTR_INFERENCE_TYPE);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
