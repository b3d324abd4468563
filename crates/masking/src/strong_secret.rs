//! Structure describing secret.

use std::{fmt, marker::PhantomData};

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::{abs::PeekInterface, strategy::Strategy, WithType};

/// Secret thing that is stored in a more "strong" way: its memory is wiped on
/// drop, and equality is compared in constant time.
pub struct StrongSecret<Secret: ZeroizableSecret, MaskingStrategy = WithType> {
    /// Inner secret value
    pub(crate) inner_secret: Secret,
    pub(crate) masking_strategy: PhantomData<MaskingStrategy>,
}

/// Marker for values whose memory can be securely wiped.
pub trait ZeroizableSecret: Zeroize {}

impl ZeroizableSecret for String {}
impl ZeroizableSecret for Vec<u8> {}

impl<SecretValue: ZeroizableSecret, MaskingStrategy>
    StrongSecret<SecretValue, MaskingStrategy>
{
    /// Take ownership of a secret value
    pub fn new(secret: SecretValue) -> Self {
        Self {
            inner_secret: secret,
            masking_strategy: PhantomData,
        }
    }
}

impl<SecretValue: ZeroizableSecret, MaskingStrategy> PeekInterface<SecretValue>
    for StrongSecret<SecretValue, MaskingStrategy>
{
    fn peek(&self) -> &SecretValue {
        &self.inner_secret
    }

    fn peek_mut(&mut self) -> &mut SecretValue {
        &mut self.inner_secret
    }
}

impl<SecretValue: ZeroizableSecret, MaskingStrategy> From<SecretValue>
    for StrongSecret<SecretValue, MaskingStrategy>
{
    fn from(secret: SecretValue) -> Self {
        Self::new(secret)
    }
}

impl<SecretValue: Clone + ZeroizableSecret, MaskingStrategy> Clone
    for StrongSecret<SecretValue, MaskingStrategy>
{
    fn clone(&self) -> Self {
        Self {
            inner_secret: self.inner_secret.clone(),
            masking_strategy: PhantomData,
        }
    }
}

impl<SecretValue, MaskingStrategy> PartialEq for StrongSecret<SecretValue, MaskingStrategy>
where
    SecretValue: ZeroizableSecret + StrongEq,
{
    fn eq(&self, other: &Self) -> bool {
        StrongEq::strong_eq(self.peek(), other.peek())
    }
}

impl<SecretValue, MaskingStrategy> Eq for StrongSecret<SecretValue, MaskingStrategy> where
    SecretValue: ZeroizableSecret + StrongEq
{
}

impl<SecretValue: ZeroizableSecret, MaskingStrategy> fmt::Debug
    for StrongSecret<SecretValue, MaskingStrategy>
where
    MaskingStrategy: Strategy<SecretValue>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        MaskingStrategy::fmt(&self.inner_secret, f)
    }
}

impl<SecretValue: ZeroizableSecret + Default, MaskingStrategy> Default
    for StrongSecret<SecretValue, MaskingStrategy>
{
    fn default() -> Self {
        SecretValue::default().into()
    }
}

impl<SecretValue: ZeroizableSecret, MaskingStrategy> Drop
    for StrongSecret<SecretValue, MaskingStrategy>
{
    fn drop(&mut self) {
        self.inner_secret.zeroize();
    }
}

/// Equality in constant time where the value supports it.
trait StrongEq {
    fn strong_eq(&self, other: &Self) -> bool;
}

impl StrongEq for String {
    fn strong_eq(&self, other: &Self) -> bool {
        let lhs = self.as_bytes();
        let rhs = other.as_bytes();
        bool::from(lhs.ct_eq(rhs))
    }
}

impl StrongEq for Vec<u8> {
    fn strong_eq(&self, other: &Self) -> bool {
        bool::from(self.ct_eq(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_debug() {
        let secret: StrongSecret<String> = StrongSecret::new("sk_test_123".to_string());
        assert_eq!(format!("{secret:?}"), "*** alloc::string::String ***");
    }

    #[test]
    fn constant_time_eq() {
        let lhs: StrongSecret<String> = StrongSecret::new("abc".to_string());
        let rhs: StrongSecret<String> = StrongSecret::new("abc".to_string());
        assert_eq!(lhs, rhs);
    }
}
