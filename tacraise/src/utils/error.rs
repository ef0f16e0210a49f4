use strum::EnumIs;
use tacir::modules::operand::Value;
use thiserror::Error;

#[derive(Debug, Error, EnumIs)]
pub enum RaiseError {
    #[error(transparent)]
    Ir(#[from] tacir::utils::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration to '{file}': {source}")]
    ConfigSerializeError {
        source: toml::ser::Error,
        file: String,
    },

    #[error("Attempted to outline an empty set of operations")]
    EmptyPartition,

    #[error("Value `{value}` used by an outlined operation has no known type")]
    UntypedValue { value: Value },

    #[error(
        "Raised function `{function}` starts with an operation lacking the string attribute `{attribute}`"
    )]
    MissingTargetAttribute { function: String, attribute: String },

    #[error(
        "Raised function `{caller}` targets a non-host device but calls raised function `{callee}`"
    )]
    IllegalCrossTargetCall { caller: String, callee: String },

    #[error("No pass registered under the argument '{0}'")]
    UnknownPass(String),
}

pub type RaiseResult<T> = Result<T, RaiseError>;
