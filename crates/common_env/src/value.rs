use common_errors::ConversionError;

use crate::kind::EnvKind;

/// # EnvValue
///
/// A type that can be produced from the raw text of an environment variable.
///
/// The trait is implemented for the closed set of supported types:
/// signed integers (`i8`, `i16`, `i32`, `i64`), unsigned integers (`u8`, `u16`, `u32`, `u64`),
/// floats (`f32`, `f64`), `bool`, `String` and the date/time types listed in [crate::time].
///
/// Implementing the trait without overriding [EnvValue::convert] marks a type as
/// unsupported: every conversion attempt fails, so the lenient readers always return
/// the default (or `None`) for it.
///
/// ### Example:
/// ```rust
/// use common_env::{convert_to_type, EnvValue};
///
/// struct Opaque;
/// impl EnvValue for Opaque {}
///
/// assert_eq!(convert_to_type::<i32>("8080"), Some(8080));
/// assert_eq!(convert_to_type::<bool>("yes"), Some(false));
/// assert!(convert_to_type::<Opaque>("anything").is_none());
/// ```
pub trait EnvValue: Sized {
    const KIND: EnvKind = EnvKind::Unsupported;

    fn convert(_raw: &str) -> Result<Self, ConversionError> {
        Err(ConversionError::unsupported::<Self>())
    }
}

macro_rules! impl_env_value_from_str {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl EnvValue for $ty {
                const KIND: EnvKind = EnvKind::$kind;

                fn convert(raw: &str) -> Result<Self, ConversionError> {
                    raw.parse::<$ty>()
                        .map_err(|e| ConversionError::malformed(Self::KIND.name(), e))
                }
            }
        )*
    };
}

impl_env_value_from_str!(
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    u8 => UByte,
    u16 => UShort,
    u32 => UInt,
    u64 => ULong,
    f32 => Float,
    f64 => Double,
);

/// Only a case-insensitive `true` is true. Everything else, including garbage, is `false`.
impl EnvValue for bool {
    const KIND: EnvKind = EnvKind::Boolean;

    fn convert(raw: &str) -> Result<Self, ConversionError> {
        Ok(raw.eq_ignore_ascii_case("true"))
    }
}

impl EnvValue for String {
    const KIND: EnvKind = EnvKind::String;

    fn convert(raw: &str) -> Result<Self, ConversionError> {
        Ok(raw.to_owned())
    }
}
