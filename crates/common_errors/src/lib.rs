pub mod errors;

pub use errors::{ConversionError, ConversionErrorExt};
