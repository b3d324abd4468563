//! Lookup collaborators for payer identities and tokenized payment-method
//! handles. Both records live in an external service; this module only
//! defines the narrow capabilities the processor needs, so production
//! clients and test fakes are interchangeable.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    core::errors::PayinResult,
    types::api::{RawPayer, RawPaymentMethod},
};

#[async_trait]
pub trait PayerClient: Send + Sync {
    async fn get_raw_payer(&self, payer_id: Uuid) -> PayinResult<RawPayer>;
}

/// Resolves a stored payment method to its provider token.
///
/// Fails with `PaymentMethodNotFound` when the method does not exist and
/// `PaymentMethodPayerMismatch` when it belongs to a different payer; both
/// are terminal for the request.
#[async_trait]
pub trait PaymentMethodClient: Send + Sync {
    async fn get_raw_payment_method(
        &self,
        payer_id: Uuid,
        payment_method_id: Uuid,
    ) -> PayinResult<RawPaymentMethod>;
}
