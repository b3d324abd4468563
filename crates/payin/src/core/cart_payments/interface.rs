//! Domain layer over the repository for the cart-payment side of the world.
//! Owns state transitions of payment intents and their provider mirrors and
//! is the single place outbound provider calls originate from.

use std::sync::Arc;

use error_stack::{report, Report, ResultExt};
use masking::Secret;
use storage_models::date_time;
use time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    config,
    core::{
        errors::{
            ApiErrorResponse, CustomResult, GatewayErrorExt, PayinResult, StorageError,
            StorageErrorExt,
        },
        payment_methods::{PayerClient, PaymentMethodClient},
    },
    db::{
        cart_payment::{CartPaymentBundle, CartPaymentBundleNew},
        StorageInterface,
    },
    logger,
    services::gateway::{
        CreatePaymentIntentRequest, ProviderIntentStatus, ProviderPaymentIntent, ProviderRefund,
        PspGateway,
    },
    types::{
        api::{CartPaymentRequest, SplitPayment},
        storage::{
            enums::{CaptureMethod, CountryCode, Currency, IntentStatus, PgpCode, RefundStatus},
            CartPayment, CartPaymentNew, LegacyConsumerChargeNew, LegacyStripeCharge,
            LegacyStripeChargeNew, MinorUnit, PaymentIntent, PaymentIntentAdjustmentHistory,
            PaymentIntentAdjustmentHistoryNew, PaymentIntentNew, PaymentIntentUpdate,
            PgpPaymentIntent, PgpPaymentIntentNew, PgpPaymentIntentUpdate, PgpRefund,
            PgpRefundNew, PgpRefundUpdate, Refund, RefundNew, RefundUpdate,
        },
    },
    utils::OptionExt,
};

/// Where a payment intent sits in its lifecycle, derived purely from the
/// persisted pair plus refund presence. Drives every "what happens next"
/// decision in the processor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PaymentIntentLifecycle {
    New,
    InFlightToProvider,
    AuthorizedAwaitingCapture,
    Captured,
    PartiallyRefunded,
    FullyRefunded,
    Cancelled,
    Failed,
}

pub fn classify_payment_intent(
    payment_intent: &PaymentIntent,
    pgp_payment_intent: &PgpPaymentIntent,
    has_refunds: bool,
) -> PaymentIntentLifecycle {
    match payment_intent.status {
        IntentStatus::Init => {
            if pgp_payment_intent.resource_id.is_some() {
                PaymentIntentLifecycle::InFlightToProvider
            } else {
                PaymentIntentLifecycle::New
            }
        }
        IntentStatus::RequiresCapture => PaymentIntentLifecycle::AuthorizedAwaitingCapture,
        IntentStatus::Succeeded => {
            if has_refunds && payment_intent.amount == MinorUnit::zero() {
                PaymentIntentLifecycle::FullyRefunded
            } else if has_refunds {
                PaymentIntentLifecycle::PartiallyRefunded
            } else {
                PaymentIntentLifecycle::Captured
            }
        }
        IntentStatus::Cancelled => PaymentIntentLifecycle::Cancelled,
        IntentStatus::Failed => PaymentIntentLifecycle::Failed,
    }
}

/// Latest intent that still participates in the cart payment's balance.
pub fn most_recent_active_intent(payment_intents: &[PaymentIntent]) -> Option<&PaymentIntent> {
    payment_intents
        .iter()
        .rev()
        .find(|intent| {
            !matches!(
                intent.status,
                IntentStatus::Cancelled | IntentStatus::Failed
            )
        })
}

pub struct CartPaymentInterface {
    pub payment_repo: Arc<dyn StorageInterface>,
    pub gateway: Arc<dyn PspGateway>,
    pub payer_client: Arc<dyn PayerClient>,
    pub payment_method_client: Arc<dyn PaymentMethodClient>,
    pub payments_settings: config::Payments,
}

impl CartPaymentInterface {
    pub async fn get_cart_payment(&self, cart_payment_id: Uuid) -> PayinResult<CartPayment> {
        self.payment_repo
            .find_cart_payment_by_id(cart_payment_id)
            .await
            .change_context(ApiErrorResponse::InternalServerError)?
            .ok_or_else(|| report!(ApiErrorResponse::CartPaymentNotFound))
    }

    pub async fn get_cart_payment_intents(
        &self,
        cart_payment_id: Uuid,
    ) -> PayinResult<Vec<PaymentIntent>> {
        self.payment_repo
            .find_payment_intents_for_cart_payment(cart_payment_id)
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    pub async fn get_payment_intent_for_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> PayinResult<Option<PaymentIntent>> {
        self.payment_repo
            .find_payment_intent_by_idempotency_key(idempotency_key)
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    /// Exactly one provider mirror exists per intent.
    pub async fn find_pgp_payment_intent(
        &self,
        payment_intent_id: Uuid,
    ) -> PayinResult<PgpPaymentIntent> {
        self.payment_repo
            .find_pgp_payment_intents(payment_intent_id)
            .await
            .change_context(ApiErrorResponse::InternalServerError)?
            .into_iter()
            .next()
            .get_required_value("pgp_payment_intent")
    }

    pub async fn get_payment_intent_adjustment(
        &self,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> PayinResult<Option<PaymentIntentAdjustmentHistory>> {
        self.payment_repo
            .find_payment_intent_adjustment_history(payment_intent_id, idempotency_key)
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    pub async fn find_existing_refund(
        &self,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> PayinResult<Option<(Refund, PgpRefund)>> {
        let refund = self
            .payment_repo
            .find_refund_by_idempotency_key(payment_intent_id, idempotency_key)
            .await
            .change_context(ApiErrorResponse::InternalServerError)?;
        match refund {
            None => Ok(None),
            Some(refund) => {
                let pgp_refund = self
                    .payment_repo
                    .find_pgp_refund_by_refund_id(refund.id)
                    .await
                    .change_context(ApiErrorResponse::InternalServerError)?
                    .get_required_value("pgp_refund")?;
                Ok(Some((refund, pgp_refund)))
            }
        }
    }

    /// Build and persist all INIT rows for a brand-new cart payment in one
    /// transaction. Returns the storage error untranslated so callers can
    /// recognize an idempotency-key race on the unique index.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all, fields(idempotency_key = %idempotency_key))]
    pub async fn create_new_payment(
        &self,
        request: &CartPaymentRequest,
        idempotency_key: &str,
        payment_country: CountryCode,
        currency: Currency,
        customer_resource_id: Option<Secret<String>>,
        payment_method_resource_id: Secret<String>,
        legacy_consumer_id: i64,
        legacy_country_id: i32,
    ) -> CustomResult<CartPaymentBundle, StorageError> {
        use masking::PeekInterface;

        let now = date_time::now();
        let delay_capture = request
            .delay_capture
            .unwrap_or(self.payments_settings.delay_capture_default);
        let capture_method = if delay_capture {
            CaptureMethod::Manual
        } else {
            CaptureMethod::Automatic
        };

        let cart_payment_id = Uuid::new_v4();
        let payment_intent_id = Uuid::new_v4();
        let (payout_account_id, application_fee_amount) = match &request.split_payment {
            Some(SplitPayment {
                payout_account_id,
                application_fee_amount,
            }) => (Some(payout_account_id.clone()), Some(*application_fee_amount)),
            None => (None, None),
        };

        let cart_payment = CartPaymentNew {
            id: cart_payment_id,
            payer_id: request.payer_id,
            payment_method_id: request.payment_method_id,
            amount: request.amount,
            currency,
            country: payment_country,
            delay_capture,
            client_description: request.client_description.clone(),
            payer_statement_description: request.payer_statement_description.clone(),
            reference_id: request.correlation_ids.reference_id.clone(),
            reference_type: request.correlation_ids.reference_type.clone(),
            payout_account_id,
            application_fee_amount,
            metadata: request.metadata.clone(),
            created_at: now,
            updated_at: now,
        };

        let payment_intent = PaymentIntentNew {
            id: payment_intent_id,
            cart_payment_id,
            idempotency_key: idempotency_key.to_owned(),
            amount: request.amount,
            amount_capturable: MinorUnit::zero(),
            amount_received: MinorUnit::zero(),
            application_fee_amount,
            currency,
            country: payment_country,
            capture_method,
            status: IntentStatus::Init,
            statement_descriptor: request.payer_statement_description.clone(),
            // Stamped with the real serial id inside the insert transaction.
            legacy_consumer_charge_id: 0,
            created_at: now,
            updated_at: now,
            capture_after: matches!(capture_method, CaptureMethod::Manual).then(|| {
                now + Duration::seconds(
                    self.payments_settings.default_capture_after_seconds as i64,
                )
            }),
        };

        let pgp_payment_intent = PgpPaymentIntentNew {
            id: Uuid::new_v4(),
            payment_intent_id,
            idempotency_key: idempotency_key.to_owned(),
            pgp_code: PgpCode::Stripe,
            payment_method_resource_id: payment_method_resource_id.peek().clone(),
            customer_resource_id: customer_resource_id
                .as_ref()
                .map(|customer| customer.peek().clone()),
            amount: request.amount,
            amount_capturable: MinorUnit::zero(),
            amount_received: MinorUnit::zero(),
            application_fee_amount,
            currency,
            capture_method,
            status: IntentStatus::Init,
            created_at: now,
            updated_at: now,
        };

        let legacy_consumer_charge = LegacyConsumerChargeNew {
            consumer_id: legacy_consumer_id,
            country_id: legacy_country_id,
            original_total: request.amount,
            currency,
            created_at: now,
        };

        let legacy_stripe_charge = LegacyStripeChargeNew {
            // Stamped inside the insert transaction as well.
            charge_id: 0,
            idempotency_key: idempotency_key.to_owned(),
            amount: request.amount,
            amount_refunded: MinorUnit::zero(),
            currency,
            status: storage_models::enums::StripeChargeStatus::Pending,
            stripe_id: None,
            description: request.client_description.clone(),
            created_at: now,
            updated_at: now,
        };

        self.payment_repo
            .insert_cart_payment_with_intents(CartPaymentBundleNew {
                cart_payment,
                payment_intent,
                pgp_payment_intent,
                legacy_consumer_charge,
                legacy_stripe_charge,
            })
            .await
    }

    /// New intent under an existing cart payment, used when an adjustment
    /// cannot be expressed on the live intent. The legacy stripe charge for
    /// the new attempt lands under the same consumer charge.
    #[instrument(skip_all, fields(cart_payment_id = %cart_payment.id))]
    pub async fn create_new_intent_for_cart_payment(
        &self,
        cart_payment: &CartPayment,
        template: &PaymentIntent,
        idempotency_key: &str,
        amount: MinorUnit,
        description: Option<String>,
        split_payment: Option<&SplitPayment>,
    ) -> CustomResult<(PaymentIntent, PgpPaymentIntent, LegacyStripeCharge), StorageError> {
        let now = date_time::now();
        let payment_intent_id = Uuid::new_v4();
        let application_fee_amount = split_payment
            .map(|split| split.application_fee_amount)
            .or(template.application_fee_amount);

        let template_pgp = self
            .payment_repo
            .find_pgp_payment_intents(template.id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                report!(StorageError::ValueNotFound(format!(
                    "pgp_payment_intent for {}",
                    template.id
                )))
            })?;

        let payment_intent = PaymentIntentNew {
            id: payment_intent_id,
            cart_payment_id: cart_payment.id,
            idempotency_key: idempotency_key.to_owned(),
            amount,
            amount_capturable: MinorUnit::zero(),
            amount_received: MinorUnit::zero(),
            application_fee_amount,
            currency: template.currency,
            country: template.country,
            capture_method: template.capture_method,
            status: IntentStatus::Init,
            statement_descriptor: template.statement_descriptor.clone(),
            legacy_consumer_charge_id: template.legacy_consumer_charge_id,
            created_at: now,
            updated_at: now,
            capture_after: matches!(template.capture_method, CaptureMethod::Manual).then(|| {
                now + Duration::seconds(
                    self.payments_settings.default_capture_after_seconds as i64,
                )
            }),
        };

        let pgp_payment_intent = PgpPaymentIntentNew {
            id: Uuid::new_v4(),
            payment_intent_id,
            idempotency_key: idempotency_key.to_owned(),
            pgp_code: template_pgp.pgp_code,
            payment_method_resource_id: template_pgp.payment_method_resource_id.clone(),
            customer_resource_id: template_pgp.customer_resource_id.clone(),
            amount,
            amount_capturable: MinorUnit::zero(),
            amount_received: MinorUnit::zero(),
            application_fee_amount,
            currency: template.currency,
            capture_method: template.capture_method,
            status: IntentStatus::Init,
            created_at: now,
            updated_at: now,
        };

        let legacy_stripe_charge = LegacyStripeChargeNew {
            charge_id: template.legacy_consumer_charge_id,
            idempotency_key: idempotency_key.to_owned(),
            amount,
            amount_refunded: MinorUnit::zero(),
            currency: template.currency,
            status: storage_models::enums::StripeChargeStatus::Pending,
            stripe_id: None,
            description,
            created_at: now,
            updated_at: now,
        };

        self.payment_repo
            .insert_payment_intent_with_mirrors(
                payment_intent,
                pgp_payment_intent,
                legacy_stripe_charge,
            )
            .await
    }

    /// The single place the provider's create/authorize call happens. In
    /// commando mode the outbound call is skipped and a provisional
    /// acceptance without a provider resource id is fabricated; a later
    /// reconciliation reattaches the real resource.
    #[instrument(skip_all, fields(payment_intent_id = %payment_intent.id))]
    pub async fn submit_payment_to_provider(
        &self,
        cart_payment: &CartPayment,
        payment_intent: &PaymentIntent,
        pgp_payment_intent: &PgpPaymentIntent,
    ) -> PayinResult<ProviderPaymentIntent> {
        if self.gateway.is_commando_mode() {
            logger::info!(
                payment_intent_id = %payment_intent.id,
                "provider unavailable, recording provisional acceptance"
            );
            let (status, amount_capturable, amount_received) =
                match payment_intent.capture_method {
                    CaptureMethod::Manual => (
                        ProviderIntentStatus::RequiresCapture,
                        payment_intent.amount,
                        MinorUnit::zero(),
                    ),
                    CaptureMethod::Automatic => (
                        ProviderIntentStatus::Succeeded,
                        MinorUnit::zero(),
                        payment_intent.amount,
                    ),
                };
            return Ok(ProviderPaymentIntent {
                id: None,
                status,
                amount: payment_intent.amount,
                amount_capturable,
                amount_received,
                latest_charge: None,
            });
        }

        let request = CreatePaymentIntentRequest {
            amount: payment_intent.amount,
            currency: payment_intent.currency,
            customer: pgp_payment_intent
                .customer_resource_id
                .clone()
                .map(Secret::new),
            payment_method: Secret::new(pgp_payment_intent.payment_method_resource_id.clone()),
            capture_method: payment_intent.capture_method,
            description: cart_payment.client_description.clone(),
            statement_descriptor: payment_intent.statement_descriptor.clone(),
            application_fee_amount: payment_intent.application_fee_amount,
            transfer_destination: cart_payment.payout_account_id.clone(),
            idempotency_key: pgp_payment_intent.idempotency_key.clone(),
        };
        self.gateway
            .create_payment_intent(request)
            .await
            .to_provider_response()
    }

    /// Stamp the submission outcome onto the intent and its mirror in
    /// lockstep.
    pub async fn update_state_after_provider_submission(
        &self,
        payment_intent: PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
        provider_payment_intent: &ProviderPaymentIntent,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        let now = date_time::now();
        let status = provider_payment_intent.status.to_intent_status();
        let captured_at = matches!(status, IntentStatus::Succeeded).then_some(now);

        self.payment_repo
            .update_payment_intent_with_mirror(
                payment_intent,
                PaymentIntentUpdate::SubmissionUpdate {
                    status,
                    amount_capturable: provider_payment_intent.amount_capturable,
                    amount_received: provider_payment_intent.amount_received,
                    captured_at,
                    updated_at: now,
                },
                pgp_payment_intent,
                PgpPaymentIntentUpdate::SubmissionUpdate {
                    status,
                    resource_id: provider_payment_intent.id.clone(),
                    charge_resource_id: provider_payment_intent.latest_charge.clone(),
                    amount_capturable: provider_payment_intent.amount_capturable,
                    amount_received: provider_payment_intent.amount_received,
                    captured_at,
                    updated_at: now,
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    pub async fn mark_payment_as_failed(
        &self,
        payment_intent: PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
        error_code: Option<String>,
        error_message: Option<String>,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        let now = date_time::now();
        self.payment_repo
            .update_payment_intent_with_mirror(
                payment_intent,
                PaymentIntentUpdate::FailedUpdate { updated_at: now },
                pgp_payment_intent,
                PgpPaymentIntentUpdate::FailedUpdate {
                    error_code,
                    error_message,
                    updated_at: now,
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    /// In-place amount change for an intent that has not been captured yet.
    /// The provider is not involved before capture; the adjustment is fully
    /// local and leaves an audit row behind.
    #[instrument(skip_all, fields(payment_intent_id = %payment_intent.id))]
    pub async fn adjust_uncaptured_amount(
        &self,
        payment_intent: PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
        new_amount: MinorUnit,
        idempotency_key: &str,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        let now = date_time::now();
        let amount_original = payment_intent.amount;

        let (payment_intent, pgp_payment_intent) = self
            .payment_repo
            .update_payment_intent_with_mirror(
                payment_intent,
                PaymentIntentUpdate::AmountUpdate {
                    amount: new_amount,
                    amount_capturable: new_amount,
                    updated_at: now,
                },
                pgp_payment_intent,
                PgpPaymentIntentUpdate::CapturableAmountUpdate {
                    amount_capturable: new_amount,
                    updated_at: now,
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)?;

        self.payment_repo
            .insert_payment_intent_adjustment_history(PaymentIntentAdjustmentHistoryNew {
                id: Uuid::new_v4(),
                payment_intent_id: payment_intent.id,
                idempotency_key: idempotency_key.to_owned(),
                amount_original,
                amount_delta: new_amount - amount_original,
                amount: new_amount,
                currency: payment_intent.currency,
                created_at: now,
            })
            .await
            .to_duplicate_response(ApiErrorResponse::CartPaymentUpdateConflict)?;

        Ok((payment_intent, pgp_payment_intent))
    }

    pub async fn create_new_refund(
        &self,
        payment_intent: &PaymentIntent,
        refund_amount: MinorUnit,
        idempotency_key: &str,
        reason: Option<String>,
    ) -> PayinResult<(Refund, PgpRefund)> {
        let now = date_time::now();
        let refund_id = Uuid::new_v4();
        self.payment_repo
            .insert_refund_with_mirror(
                RefundNew {
                    id: refund_id,
                    payment_intent_id: payment_intent.id,
                    idempotency_key: idempotency_key.to_owned(),
                    status: RefundStatus::Processing,
                    amount: refund_amount,
                    currency: payment_intent.currency,
                    reason,
                    created_at: now,
                    updated_at: now,
                },
                PgpRefundNew {
                    id: Uuid::new_v4(),
                    refund_id,
                    idempotency_key: idempotency_key.to_owned(),
                    status: RefundStatus::Processing,
                    amount: refund_amount,
                    currency: payment_intent.currency,
                    pgp_code: PgpCode::Stripe,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .to_duplicate_response(ApiErrorResponse::CartPaymentUpdateConflict)
    }

    /// Issue the refund at the provider against the charge behind the
    /// intent.
    #[instrument(skip_all, fields(payment_intent_id = %pgp_payment_intent.payment_intent_id))]
    pub async fn submit_refund_to_provider(
        &self,
        pgp_payment_intent: &PgpPaymentIntent,
        refund: &Refund,
    ) -> PayinResult<ProviderRefund> {
        let charge_resource_id = pgp_payment_intent
            .charge_resource_id
            .clone()
            .or_else(|| pgp_payment_intent.resource_id.clone())
            .get_required_value("charge_resource_id")?;
        self.gateway
            .refund_charge(&charge_resource_id, refund.amount, &refund.idempotency_key)
            .await
            .to_provider_response()
    }

    /// Fold the provider refund outcome back onto the books: refund rows
    /// take the provider status, the intent's remaining amount drops, and
    /// the received amount keeps its historical value.
    pub async fn update_state_after_refund_with_provider(
        &self,
        payment_intent: PaymentIntent,
        refund: Refund,
        pgp_refund: PgpRefund,
        provider_refund: &ProviderRefund,
        new_intent_amount: MinorUnit,
    ) -> PayinResult<PaymentIntent> {
        let now = date_time::now();
        let status = provider_refund.status.to_refund_status();

        self.payment_repo
            .update_refund_with_mirror(
                refund,
                RefundUpdate::StatusUpdate {
                    status,
                    updated_at: now,
                },
                pgp_refund,
                PgpRefundUpdate::ProviderOutcomeUpdate {
                    status,
                    resource_id: Some(provider_refund.id.clone()),
                    updated_at: now,
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)?;

        self.payment_repo
            .update_payment_intent(
                payment_intent,
                PaymentIntentUpdate::AmountAfterRefundUpdate {
                    amount: new_intent_amount,
                    updated_at: now,
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    pub async fn update_state_after_cancel_with_provider(
        &self,
        payment_intent: PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        let now = date_time::now();
        self.payment_repo
            .update_payment_intent_with_mirror(
                payment_intent,
                PaymentIntentUpdate::CancelUpdate {
                    cancelled_at: now,
                    updated_at: now,
                },
                pgp_payment_intent,
                PgpPaymentIntentUpdate::CancelUpdate {
                    cancelled_at: now,
                    updated_at: now,
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    pub async fn update_state_after_capture_with_provider(
        &self,
        payment_intent: PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
        provider_payment_intent: &ProviderPaymentIntent,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        let now = date_time::now();
        let amount_received = if provider_payment_intent.amount_received
            == MinorUnit::zero()
        {
            payment_intent.amount
        } else {
            provider_payment_intent.amount_received
        };
        self.payment_repo
            .update_payment_intent_with_mirror(
                payment_intent,
                PaymentIntentUpdate::CaptureUpdate {
                    amount_received,
                    captured_at: now,
                    updated_at: now,
                },
                pgp_payment_intent,
                PgpPaymentIntentUpdate::CaptureUpdate {
                    amount_received,
                    captured_at: now,
                    updated_at: now,
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }
}

pub fn provider_error_details(
    error: &Report<ApiErrorResponse>,
) -> (Option<String>, Option<String>) {
    match error.current_context() {
        ApiErrorResponse::ProviderError { code, message, .. } => {
            (Some(code.clone()), Some(message.clone()))
        }
        other => (None, Some(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use storage_models::date_time;

    use super::*;

    fn intent(status: IntentStatus, amount: i64) -> PaymentIntent {
        let now = date_time::now();
        PaymentIntent {
            id: Uuid::new_v4(),
            cart_payment_id: Uuid::new_v4(),
            idempotency_key: "key".to_string(),
            amount: MinorUnit::new(amount),
            amount_capturable: MinorUnit::zero(),
            amount_received: MinorUnit::zero(),
            application_fee_amount: None,
            currency: Currency::USD,
            country: CountryCode::US,
            capture_method: CaptureMethod::Automatic,
            status,
            statement_descriptor: None,
            legacy_consumer_charge_id: 1,
            created_at: now,
            updated_at: now,
            captured_at: None,
            cancelled_at: None,
            capture_after: None,
        }
    }

    fn pgp_intent(status: IntentStatus, resource_id: Option<&str>) -> PgpPaymentIntent {
        let now = date_time::now();
        PgpPaymentIntent {
            id: Uuid::new_v4(),
            payment_intent_id: Uuid::new_v4(),
            idempotency_key: "key".to_string(),
            pgp_code: PgpCode::Stripe,
            resource_id: resource_id.map(str::to_owned),
            charge_resource_id: None,
            payment_method_resource_id: "pm_1".to_string(),
            customer_resource_id: None,
            amount: MinorUnit::new(1000),
            amount_capturable: MinorUnit::zero(),
            amount_received: MinorUnit::zero(),
            application_fee_amount: None,
            currency: Currency::USD,
            capture_method: CaptureMethod::Automatic,
            status,
            error_code: None,
            error_message: None,
            created_at: now,
            updated_at: now,
            captured_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn classification_covers_the_lifecycle() {
        assert_eq!(
            classify_payment_intent(
                &intent(IntentStatus::Init, 1000),
                &pgp_intent(IntentStatus::Init, None),
                false,
            ),
            PaymentIntentLifecycle::New
        );
        assert_eq!(
            classify_payment_intent(
                &intent(IntentStatus::Init, 1000),
                &pgp_intent(IntentStatus::Init, Some("pi_1")),
                false,
            ),
            PaymentIntentLifecycle::InFlightToProvider
        );
        assert_eq!(
            classify_payment_intent(
                &intent(IntentStatus::RequiresCapture, 1000),
                &pgp_intent(IntentStatus::RequiresCapture, Some("pi_1")),
                false,
            ),
            PaymentIntentLifecycle::AuthorizedAwaitingCapture
        );
        assert_eq!(
            classify_payment_intent(
                &intent(IntentStatus::Succeeded, 1000),
                &pgp_intent(IntentStatus::Succeeded, Some("pi_1")),
                false,
            ),
            PaymentIntentLifecycle::Captured
        );
        assert_eq!(
            classify_payment_intent(
                &intent(IntentStatus::Succeeded, 500),
                &pgp_intent(IntentStatus::Succeeded, Some("pi_1")),
                true,
            ),
            PaymentIntentLifecycle::PartiallyRefunded
        );
        assert_eq!(
            classify_payment_intent(
                &intent(IntentStatus::Succeeded, 0),
                &pgp_intent(IntentStatus::Succeeded, Some("pi_1")),
                true,
            ),
            PaymentIntentLifecycle::FullyRefunded
        );
        assert_eq!(
            classify_payment_intent(
                &intent(IntentStatus::Cancelled, 0),
                &pgp_intent(IntentStatus::Cancelled, Some("pi_1")),
                false,
            ),
            PaymentIntentLifecycle::Cancelled
        );
        assert_eq!(
            classify_payment_intent(
                &intent(IntentStatus::Failed, 1000),
                &pgp_intent(IntentStatus::Failed, None),
                false,
            ),
            PaymentIntentLifecycle::Failed
        );
    }

    #[test]
    fn most_recent_active_intent_skips_terminal_failures() {
        let mut first = intent(IntentStatus::Succeeded, 1000);
        first.created_at -= Duration::seconds(60);
        let cancelled = intent(IntentStatus::Cancelled, 0);
        let intents = vec![first.clone(), cancelled];
        assert_eq!(most_recent_active_intent(&intents).map(|i| i.id), Some(first.id));

        let empty: Vec<PaymentIntent> = vec![];
        assert!(most_recent_active_intent(&empty).is_none());
    }
}
