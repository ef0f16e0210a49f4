/// Attribute naming the hardware kind an operation must run on.
pub const ATTR_DEVICE: &str = "tac.device";

/// Attribute naming the numeric precision an operation runs with.
pub const ATTR_INFERENCE_TYPE: &str = "tac.inference_type";

/// Attribute carrying the interface name of a raised function and its call.
pub const ATTR_INTERFACE_NAME: &str = "tac.interface_name";

/// Hardware kind allowed to invoke every other kind.
pub const DEFAULT_HOST_DEVICE: &str = "CPU";

/// Prefix of interface names, followed by the decimal counter value.
pub const INTERFACE_NAME_PREFIX: &str = "func_";

/// Command-line argument of the raise pass.
pub const RAISE_PASS_ARGUMENT: &str = "tfl-raise-target-subgraphs";

/// Name of the environment variable containing the path to the configuration file.
/// If not set, defaults to
///  (1) on Linux and macOS: `$XDG_CONFIG_HOME/tacraise/config.toml` or `$HOME/.config/tacraise/config.toml`
///  (2) on Windows: `%APPDATA%\tacraise\config.toml`
pub const ENV_CONFIG_PATH: &str = "TACRAISE_CONFIG_PATH";
