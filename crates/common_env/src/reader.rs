use std::borrow::Cow;

use anyhow::Context;
use common_errors::ConversionError;
use log::debug;

use crate::{
    source::{EnvSource, ProcessEnv},
    value::EnvValue,
};

/// Separator used by [TypedEnvReader::parse_list] when none is given.
pub const DEFAULT_SEPARATOR: char = ',';

/// # TypedEnvReader
///
/// Reads variables from an [EnvSource] and converts them to typed values.
///
/// The lenient methods never fail: an unset variable, a malformed value and an
/// unsupported target type all end up as the default (or `None`).
/// Use [TypedEnvReader::require] when the reason of a failure matters.
///
/// ### Example:
/// ```rust
/// use std::collections::HashMap;
/// use common_env::TypedEnvReader;
///
/// let source = HashMap::from([
///     ("APP_PORT".to_owned(), "8080".to_owned()),
///     ("APP_WORKERS".to_owned(), "many".to_owned()),
/// ]);
/// let reader = TypedEnvReader::new(source).with_prefix("APP_");
/// assert_eq!(reader.parse_or("PORT", 80), 8080);
/// assert_eq!(reader.parse_or("WORKERS", 4), 4);
/// assert_eq!(reader.parse::<bool>("DEBUG"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypedEnvReader<S = ProcessEnv> {
    source: S,
    prefix: Option<String>,
}

impl TypedEnvReader<ProcessEnv> {
    /// Reader over the environment of the current process.
    pub fn process() -> Self {
        Self::new(ProcessEnv)
    }
}

impl<S: EnvSource> TypedEnvReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            prefix: None,
        }
    }

    /// Prepend `prefix` to every variable name looked up by this reader.
    pub fn with_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Get the parsed value of `name`, or `default` if it is unset or cannot be parsed.
    pub fn parse_or<T: EnvValue>(&self, name: &str, default: T) -> T {
        self.lookup(name).unwrap_or(default)
    }

    /// Get the parsed value of `name`, or `None` if it is unset or cannot be parsed.
    pub fn parse<T: EnvValue>(&self, name: &str) -> Option<T> {
        self.lookup(name).ok()
    }

    /// Apply `parser` to the raw value of `name`.
    ///
    /// Returns `Ok(None)` without calling the parser if the variable is unset.
    /// Errors of the parser are returned as is.
    pub fn parse_with<T, E, F>(&self, name: &str, parser: F) -> Result<Option<T>, E>
    where
        F: FnOnce(&str) -> Result<T, E>,
    {
        self.raw(name).map(|raw| parser(&raw)).transpose()
    }

    /// Same as [TypedEnvReader::parse_with], but falls back to `default` if the variable is unset.
    pub fn parse_or_with<T, E, F>(&self, name: &str, default: T, parser: F) -> Result<T, E>
    where
        F: FnOnce(&str) -> Result<T, E>,
    {
        Ok(self.parse_with(name, parser)?.unwrap_or(default))
    }

    /// Comma separated list, see [TypedEnvReader::parse_list_separated].
    pub fn parse_list<T: EnvValue>(&self, name: &str) -> Vec<T> {
        self.parse_list_separated(name, DEFAULT_SEPARATOR)
    }

    /// Split the value of `name` by `separator` and parse every item.
    ///
    /// Items are trimmed, blank items are skipped and items that cannot be parsed are dropped.
    /// The order of the remaining items is kept. An unset variable gives an empty list.
    pub fn parse_list_separated<T: EnvValue>(&self, name: &str, separator: char) -> Vec<T> {
        let Some(raw) = self.raw(name) else {
            return Vec::new();
        };
        split_items(&raw, separator)
            .filter_map(|item| match T::convert(item) {
                Ok(value) => Some(value),
                Err(err) => {
                    debug!("Skipping item of '{}': {err}", self.key(name));
                    None
                }
            })
            .collect()
    }

    /// Split the value of `name` like [TypedEnvReader::parse_list_separated] does
    /// and apply `parser` to every item.
    ///
    /// Items are not filtered by the parser result: the first error is returned.
    pub fn parse_list_with<T, E, F>(
        &self,
        name: &str,
        separator: char,
        parser: F,
    ) -> Result<Vec<T>, E>
    where
        F: FnMut(&str) -> Result<T, E>,
    {
        match self.raw(name) {
            Some(raw) => split_items(&raw, separator).map(parser).collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Get the parsed value of `name` or an error describing why it is not available.
    ///
    /// The error chain contains a [ConversionError], see [common_errors::ConversionErrorExt].
    pub fn require<T: EnvValue>(&self, name: &str) -> anyhow::Result<T> {
        self.lookup(name)
            .with_context(|| format!("Cannot read {} from '{}'", T::KIND, self.key(name)))
    }

    fn lookup<T: EnvValue>(&self, name: &str) -> Result<T, ConversionError> {
        let key = self.key(name);
        let raw = self
            .source
            .var(&key)
            .ok_or_else(|| ConversionError::absent(&key))?;
        T::convert(&raw).map_err(|err| {
            if T::KIND.is_supported() {
                debug!("Falling back for '{key}': {err}");
            } else {
                debug!("Falling back for '{key}', its type is not supported: {err}");
            }
            err
        })
    }

    fn raw(&self, name: &str) -> Option<String> {
        self.source.var(&self.key(name))
    }

    fn key<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}{name}")),
            None => Cow::Borrowed(name),
        }
    }
}

fn split_items(raw: &str, separator: char) -> impl Iterator<Item = &str> {
    raw.split(separator)
        .map(str::trim)
        .filter(|item| !item.is_empty())
}
