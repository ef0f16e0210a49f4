//! Target annotations and their classification.
use strum::EnumIs;
use tacir::modules::operation::Operation;

use crate::magic::{ATTR_DEVICE, ATTR_INFERENCE_TYPE};

/// Hardware kind and numeric precision an operation is meant to run with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InferenceDeviceType {
    pub hardware: String,
    pub inference_type: String,
}

impl InferenceDeviceType {
    pub fn new(hardware: impl Into<String>, inference_type: impl Into<String>) -> Self {
        Self {
            hardware: hardware.into(),
            inference_type: inference_type.into(),
        }
    }

    /// Whether this targets the host kind `host`.
    pub fn is_host(&self, host: &str) -> bool {
        self.hardware == host
    }
}

impl std::fmt::Display for InferenceDeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.hardware, self.inference_type)
    }
}

/// Outcome of classifying an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs)]
pub enum Target {
    /// The operation is unconstrained and never joins a partition.
    NoTarget,
    Targeted(InferenceDeviceType),
}

impl Target {
    pub fn device(&self) -> Option<&InferenceDeviceType> {
        match self {
            Target::NoTarget => None,
            Target::Targeted(device) => Some(device),
        }
    }
}

/// Reads the target annotation of an operation.
pub trait TargetClassifier {
    fn classify(&self, op: &Operation) -> Target;
}

/// Classifies operations from their device and precision string attributes.
///
/// An operation is targeted only when it carries both attributes.
#[derive(Debug, Clone)]
pub struct AttributeClassifier {
    device_attr: String,
    inference_type_attr: String,
}

impl Default for AttributeClassifier {
    fn default() -> Self {
        Self::new(ATTR_DEVICE, ATTR_INFERENCE_TYPE)
    }
}

impl AttributeClassifier {
    pub fn new(device_attr: impl Into<String>, inference_type_attr: impl Into<String>) -> Self {
        Self {
            device_attr: device_attr.into(),
            inference_type_attr: inference_type_attr.into(),
        }
    }
}

impl TargetClassifier for AttributeClassifier {
    fn classify(&self, op: &Operation) -> Target {
        match (
            op.str_attr(&self.device_attr),
            op.str_attr(&self.inference_type_attr),
        ) {
            (Some(hardware), Some(inference_type)) => {
                Target::Targeted(InferenceDeviceType::new(hardware, inference_type))
            }
            _ => Target::NoTarget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_attributes_are_required() {
        let classifier = AttributeClassifier::default();
        let op = Operation::new("tfl.add").with_attr(ATTR_DEVICE, "GPU");
        assert!(classifier.classify(&op).is_no_target());

        let op = op.with_attr(ATTR_INFERENCE_TYPE, "FLOAT");
        assert_eq!(
            classifier.classify(&op),
            Target::Targeted(InferenceDeviceType::new("GPU", "FLOAT"))
        );
    }

    #[test]
    fn non_string_attributes_are_ignored() {
        let op = Operation::new("tfl.add")
            .with_attr(ATTR_DEVICE, 1i64)
            .with_attr(ATTR_INFERENCE_TYPE, "FLOAT");
        assert!(AttributeClassifier::default().classify(&op).is_no_target());
    }

    #[test]
    fn host_kind_is_configurable() {
        let device = InferenceDeviceType::new("CPU", "QUANTIZED_INT8");
        assert!(device.is_host("CPU"));
        assert!(!device.is_host("DSP"));
        assert_eq!(device.to_string(), "CPU_QUANTIZED_INT8");
    }
}
