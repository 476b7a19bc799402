//! Typed access to environment variables.
//!
//! Every reading function looks the variable up anew, converts its text to the requested
//! type and quietly falls back to the default (or `None`) when the variable is unset,
//! malformed, or the type is not supported. Configuration reading should never bring
//! a program down at startup. Use [require_from_env] for the rare cases it should.
//!
//! ### Example:
//! ```rust,no_run
//! use common_env::{parse_from_env, parse_from_env_or, parse_list_from_env};
//!
//! let port = parse_from_env_or("PORT", 8080u16);
//! let workers = parse_from_env::<u32>("WORKERS");
//! let peers: Vec<String> = parse_list_from_env("PEERS");
//! ```
pub mod kind;
pub mod reader;
pub mod source;
pub mod time;
pub mod value;

pub use kind::EnvKind;
pub use reader::{TypedEnvReader, DEFAULT_SEPARATOR};
pub use source::{EnvSource, ProcessEnv};
pub use time::{OffsetTime, ZonedDateTime};
pub use value::EnvValue;

/// Read `name` and parse it as `T`, the type of `default`.
/// Returns `default` if the variable is unset or cannot be parsed.
pub fn parse_from_env_or<T: EnvValue>(name: &str, default: T) -> T {
    TypedEnvReader::process().parse_or(name, default)
}

/// Read `name` and parse it as `T`. Returns `None` if the variable is unset or cannot be parsed.
pub fn parse_from_env<T: EnvValue>(name: &str) -> Option<T> {
    TypedEnvReader::process().parse(name)
}

/// Read `name` and convert it with `parser`. Errors of the parser are returned as is.
pub fn parse_from_env_with<T, E, F>(name: &str, parser: F) -> Result<Option<T>, E>
where
    F: FnOnce(&str) -> Result<T, E>,
{
    TypedEnvReader::process().parse_with(name, parser)
}

/// Read `name` and convert it with `parser`, `default` if the variable is unset.
pub fn parse_from_env_or_with<T, E, F>(name: &str, default: T, parser: F) -> Result<T, E>
where
    F: FnOnce(&str) -> Result<T, E>,
{
    TypedEnvReader::process().parse_or_with(name, default, parser)
}

/// Read `name` as a comma separated list of `T`. Blank and malformed items are skipped.
pub fn parse_list_from_env<T: EnvValue>(name: &str) -> Vec<T> {
    TypedEnvReader::process().parse_list(name)
}

/// Read `name` as a list of `T` separated by `separator`. Blank and malformed items are skipped.
pub fn parse_list_from_env_separated<T: EnvValue>(name: &str, separator: char) -> Vec<T> {
    TypedEnvReader::process().parse_list_separated(name, separator)
}

/// Read `name` as a list separated by `separator` and convert every item with `parser`.
pub fn parse_list_from_env_with<T, E, F>(
    name: &str,
    separator: char,
    parser: F,
) -> Result<Vec<T>, E>
where
    F: FnMut(&str) -> Result<T, E>,
{
    TypedEnvReader::process().parse_list_with(name, separator, parser)
}

/// Read `name` and parse it as `T`, reporting why it failed.
pub fn require_from_env<T: EnvValue>(name: &str) -> anyhow::Result<T> {
    TypedEnvReader::process().require(name)
}

/// Convert raw text to `T`. Returns `None` for malformed text and unsupported types.
pub fn convert_to_type<T: EnvValue>(value: &str) -> Option<T> {
    T::convert(value).ok()
}
