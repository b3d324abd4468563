//! Parallel projection of the payment lifecycle onto the legacy charge
//! tables kept for pre-migration API clients. Same transitions, different
//! identifiers; `original_total` on the consumer charge never changes after
//! creation.

use std::sync::Arc;

use error_stack::ResultExt;
use storage_models::date_time;
use tracing::instrument;

use crate::{
    core::errors::{ApiErrorResponse, PayinResult},
    db::StorageInterface,
    logger,
    services::gateway::ProviderPaymentIntent,
    types::storage::{
        enums::{CountryCode, StripeChargeStatus},
        LegacyConsumerCharge, LegacyStripeCharge, LegacyStripeChargeUpdate, MinorUnit,
        PaymentIntent,
    },
};

/// Country id used by the legacy tables.
pub fn legacy_country_id(country: CountryCode) -> i32 {
    match country {
        CountryCode::US => 1,
        CountryCode::CA => 2,
        CountryCode::AU => 3,
    }
}

pub struct LegacyPaymentInterface {
    pub payment_repo: Arc<dyn StorageInterface>,
}

impl LegacyPaymentInterface {
    /// Probe for the charge pair written by a prior attempt with the same
    /// idempotency key. A hit means that persistence step already ran.
    pub async fn find_existing_payment_charge(
        &self,
        charge_id: i32,
        idempotency_key: &str,
    ) -> PayinResult<Option<(LegacyConsumerCharge, LegacyStripeCharge)>> {
        let stripe_charge = self
            .payment_repo
            .find_legacy_stripe_charge(charge_id, idempotency_key)
            .await
            .change_context(ApiErrorResponse::InternalServerError)?;
        match stripe_charge {
            None => Ok(None),
            Some(stripe_charge) => {
                let consumer_charge = self
                    .payment_repo
                    .find_legacy_consumer_charge_by_id(charge_id)
                    .await
                    .change_context(ApiErrorResponse::InternalServerError)?
                    .ok_or_else(|| {
                        error_stack::report!(ApiErrorResponse::InternalServerError)
                            .attach_printable("stripe charge exists without its consumer charge")
                    })?;
                Ok(Some((consumer_charge, stripe_charge)))
            }
        }
    }

    /// The most recent intent created against a legacy charge id, used to
    /// resolve the owning cart payment for the legacy surface.
    pub async fn get_associated_payment_intent(
        &self,
        dd_charge_id: i32,
    ) -> PayinResult<Option<PaymentIntent>> {
        self.payment_repo
            .find_payment_intent_for_legacy_charge(dd_charge_id)
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    /// Stamp the provider charge resource and terminal submission status
    /// onto the stripe charge row.
    #[instrument(skip_all, fields(stripe_charge_id = legacy_stripe_charge.id))]
    pub async fn update_state_after_provider_submission(
        &self,
        legacy_stripe_charge: LegacyStripeCharge,
        provider_payment_intent: &ProviderPaymentIntent,
    ) -> PayinResult<LegacyStripeCharge> {
        let stripe_id = provider_payment_intent
            .latest_charge
            .clone()
            .or_else(|| provider_payment_intent.id.clone());
        logger::debug!(
            stripe_charge_id = legacy_stripe_charge.id,
            "stamping provider submission onto legacy charge"
        );
        self.payment_repo
            .update_legacy_stripe_charge(
                legacy_stripe_charge,
                LegacyStripeChargeUpdate::SubmissionUpdate {
                    stripe_id,
                    status: StripeChargeStatus::Succeeded,
                    updated_at: date_time::now(),
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    pub async fn mark_charge_as_failed(
        &self,
        legacy_stripe_charge: LegacyStripeCharge,
        error_reason: String,
    ) -> PayinResult<LegacyStripeCharge> {
        self.payment_repo
            .update_legacy_stripe_charge(
                legacy_stripe_charge,
                LegacyStripeChargeUpdate::FailureUpdate {
                    error_reason,
                    updated_at: date_time::now(),
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    /// Mirror an in-place amount change on an uncaptured intent.
    pub async fn update_charge_after_amount_adjustment(
        &self,
        legacy_stripe_charge: LegacyStripeCharge,
        new_amount: MinorUnit,
    ) -> PayinResult<LegacyStripeCharge> {
        self.payment_repo
            .update_legacy_stripe_charge(
                legacy_stripe_charge,
                LegacyStripeChargeUpdate::AmountUpdate {
                    amount: new_amount,
                    updated_at: date_time::now(),
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    /// Accumulate a settled refund into the legacy bookkeeping.
    pub async fn update_charge_after_refund(
        &self,
        legacy_stripe_charge: LegacyStripeCharge,
        refund_amount: MinorUnit,
    ) -> PayinResult<LegacyStripeCharge> {
        let now = date_time::now();
        let amount_refunded = legacy_stripe_charge.amount_refunded + refund_amount;
        self.payment_repo
            .update_legacy_stripe_charge(
                legacy_stripe_charge,
                LegacyStripeChargeUpdate::RefundUpdate {
                    amount_refunded,
                    refunded_at: now,
                    updated_at: now,
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    pub async fn update_charge_after_payment_cancelled(
        &self,
        legacy_stripe_charge: LegacyStripeCharge,
    ) -> PayinResult<LegacyStripeCharge> {
        self.payment_repo
            .update_legacy_stripe_charge(
                legacy_stripe_charge,
                LegacyStripeChargeUpdate::StatusUpdate {
                    status: StripeChargeStatus::Cancelled,
                    updated_at: date_time::now(),
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    pub async fn update_charge_after_payment_captured(
        &self,
        legacy_stripe_charge: LegacyStripeCharge,
    ) -> PayinResult<LegacyStripeCharge> {
        self.payment_repo
            .update_legacy_stripe_charge(
                legacy_stripe_charge,
                LegacyStripeChargeUpdate::StatusUpdate {
                    status: StripeChargeStatus::Succeeded,
                    updated_at: date_time::now(),
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }
}
