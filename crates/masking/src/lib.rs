//! Personal Identifiable Information protection.
//!
//! Wrapper types and traits for secret management which help ensure they
//! aren't accidentally copied, logged, or otherwise exposed, and also ensure
//! secrets are securely wiped from memory when dropped.

#![warn(missing_docs)]

mod abs;
mod secret;
mod strategy;
mod strong_secret;

#[cfg(feature = "serde")]
mod serde;

pub use crate::{
    abs::{ExposeInterface, ExposeOptionInterface, PeekInterface},
    secret::Secret,
    strategy::{Strategy, WithType, WithoutType},
    strong_secret::{StrongSecret, ZeroizableSecret},
};

#[cfg(feature = "serde")]
pub use crate::serde::SerializableSecret;

/// This module should be included with asterisk.
///
/// `use masking::prelude::*;`
pub mod prelude {
    pub use super::{ExposeInterface, ExposeOptionInterface, PeekInterface, Secret, StrongSecret};
}
