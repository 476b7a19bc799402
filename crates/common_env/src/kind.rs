use std::fmt::Display;

/// Closed set of semantic types a raw environment value can be converted to.
///
/// Every type implementing [crate::EnvValue] reports exactly one kind. Types that
/// implement the trait without providing a conversion report [EnvKind::Unsupported].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvKind {
    Byte,
    Short,
    Int,
    Long,
    UByte,
    UShort,
    UInt,
    ULong,
    Float,
    Double,
    Boolean,
    String,
    Date,
    LocalDateTime,
    OffsetTime,
    OffsetDateTime,
    ZonedDateTime,
    Instant,
    Unsupported,
}

impl EnvKind {
    pub const fn name(self) -> &'static str {
        match self {
            EnvKind::Byte => "Byte",
            EnvKind::Short => "Short",
            EnvKind::Int => "Int",
            EnvKind::Long => "Long",
            EnvKind::UByte => "UByte",
            EnvKind::UShort => "UShort",
            EnvKind::UInt => "UInt",
            EnvKind::ULong => "ULong",
            EnvKind::Float => "Float",
            EnvKind::Double => "Double",
            EnvKind::Boolean => "Boolean",
            EnvKind::String => "String",
            EnvKind::Date => "Date",
            EnvKind::LocalDateTime => "LocalDateTime",
            EnvKind::OffsetTime => "OffsetTime",
            EnvKind::OffsetDateTime => "OffsetDateTime",
            EnvKind::ZonedDateTime => "ZonedDateTime",
            EnvKind::Instant => "Instant",
            EnvKind::Unsupported => "Unsupported",
        }
    }

    pub const fn is_supported(self) -> bool {
        !matches!(self, EnvKind::Unsupported)
    }
}

impl Display for EnvKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
