use std::{any::type_name, error::Error, fmt::Display};

/// # ConversionError
///
/// Every way reading a typed value from the environment can go wrong falls into one of three categories:
/// - `Absent` - the variable is not set at all.
/// - `Malformed` - the variable is set, but its text does not match the grammar of the target type.
/// - `Unsupported` - the target type is outside the closed set of types the reader knows how to parse.
///
/// The lenient entry points of `common_env` collapse all three into the same "no value" outcome.
/// The strict accessor keeps them apart and wraps them into [anyhow::Error].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    Absent(String),
    Malformed { kind: &'static str, reason: String },
    Unsupported(&'static str),
}

impl ConversionError {
    /// Alias for [ConversionError::Absent], immediately convert variable name to string.
    pub fn absent<S: AsRef<str>>(name: S) -> ConversionError {
        ConversionError::Absent(name.as_ref().to_owned())
    }

    /// Alias for [ConversionError::Malformed], immediately convert error to string.
    pub fn malformed<E: Display>(kind: &'static str, e: E) -> ConversionError {
        ConversionError::Malformed {
            kind,
            reason: e.to_string(),
        }
    }

    /// Alias for [ConversionError::Unsupported], takes the name of the requested type.
    pub fn unsupported<T: ?Sized>() -> ConversionError {
        ConversionError::Unsupported(type_name::<T>())
    }
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionError::Absent(name) => write!(f, "Variable '{name}' is not set"),
            ConversionError::Malformed { kind, reason } => {
                write!(f, "Value is not a valid {kind}: {reason}")
            }
            ConversionError::Unsupported(type_name) => {
                write!(f, "Type {type_name} cannot be read from the environment")
            }
        }
    }
}

impl Error for ConversionError {}

pub trait ConversionErrorExt {
    fn as_conversion_error(&self) -> Option<&ConversionError>;
}

impl ConversionErrorExt for anyhow::Error {
    fn as_conversion_error(&self) -> Option<&ConversionError> {
        self.chain()
            .find_map(|err| err.downcast_ref::<ConversionError>())
    }
}
