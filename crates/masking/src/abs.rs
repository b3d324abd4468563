//! Abstract data types.

/// Interface to expose a reference to an inner secret
pub trait PeekInterface<S> {
    /// Only method providing access to the secret value via an immutable
    /// reference.
    fn peek(&self) -> &S;

    /// Provide access to the secret value via a mutable reference.
    fn peek_mut(&mut self) -> &mut S;
}

/// Interface that consumes an option and exposes the inner secret.
pub trait ExposeOptionInterface<S> {
    /// Expose option.
    fn expose_option(self) -> S;
}

/// Interface that consumes the wrapper and exposes the inner secret.
pub trait ExposeInterface<S> {
    /// Consume the secret and return the inner value.
    fn expose(self) -> S;
}
