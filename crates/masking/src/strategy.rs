use std::{any::type_name, fmt};

/// Debug with type
pub enum WithType {}

/// Debug without type
pub enum WithoutType {}

/// Masking strategy. Controls how a peeked value is rendered by `Debug` and
/// `Display` implementations of the wrapper types.
pub trait Strategy<T> {
    /// Format the value according to this strategy
    fn fmt(value: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T> Strategy<T> for WithType {
    fn fmt(_: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("*** ")?;
        f.write_str(type_name::<T>())?;
        f.write_str(" ***")
    }
}

impl<T> Strategy<T> for WithoutType {
    fn fmt(_: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("*** ***")
    }
}
