//! Top-level orchestration of the cart payment lifecycle: create, adjust up
//! and down, cancel, and deferred capture, with idempotency gating at every
//! step and compensation after provider failures.

pub mod interface;
pub mod legacy;

use error_stack::{report, Report, ResultExt};
use storage_models::date_time;
use tracing::instrument;
use uuid::Uuid;

use self::{
    interface::{
        classify_payment_intent, most_recent_active_intent, provider_error_details,
        CartPaymentInterface, PaymentIntentLifecycle,
    },
    legacy::{legacy_country_id, LegacyPaymentInterface},
};
use crate::{
    core::errors::{ApiErrorResponse, GatewayErrorExt, PayinResult, StorageErrorExt},
    logger,
    types::{
        api::{CartPaymentRequest, LegacyPayment, SplitPayment},
        storage::{
            enums::{CountryCode, Currency, IntentStatus, RefundStatus},
            CartPayment, CartPaymentUpdate, LegacyStripeCharge, MinorUnit, PaymentIntent,
            PgpPaymentIntent,
        },
    },
    utils::{self, OptionExt},
};

pub struct CartPaymentProcessor {
    pub cart_payment_interface: CartPaymentInterface,
    pub legacy_payment_interface: LegacyPaymentInterface,
}

impl CartPaymentProcessor {
    /// Accept a client's request to charge a payment method. Any retry with
    /// the same idempotency key converges to the first outcome.
    #[instrument(skip_all, fields(idempotency_key = %idempotency_key))]
    pub async fn create_payment(
        &self,
        request_cart_payment: &CartPaymentRequest,
        idempotency_key: &str,
        payment_country: CountryCode,
        currency: Currency,
    ) -> PayinResult<CartPayment> {
        if let Some(existing_intent) = self
            .cart_payment_interface
            .get_payment_intent_for_idempotency_key(idempotency_key)
            .await?
        {
            return self.resume_payment_for_intent(existing_intent).await;
        }

        let payer_id = request_cart_payment
            .payer_id
            .get_required_value("payer_id")?;
        let raw_payer = self
            .cart_payment_interface
            .payer_client
            .get_raw_payer(payer_id)
            .await?;
        let raw_payment_method = self
            .cart_payment_interface
            .payment_method_client
            .get_raw_payment_method(payer_id, request_cart_payment.payment_method_id)
            .await?;

        self.submit_new_payment(
            request_cart_payment,
            idempotency_key,
            payment_country,
            currency,
            Some(raw_payer.pgp_customer_resource_id),
            raw_payment_method.pgp_resource_id,
            raw_payer.legacy_consumer_id,
            legacy_country_id(payment_country),
        )
        .await
    }

    /// Create on behalf of a pre-migration client that manages its own payer
    /// and card records at the provider.
    #[instrument(skip_all, fields(idempotency_key = %idempotency_key))]
    pub async fn legacy_create_payment(
        &self,
        request_cart_payment: &CartPaymentRequest,
        idempotency_key: &str,
        legacy_payment: LegacyPayment,
        currency: Currency,
        payment_country: CountryCode,
        _payer_country: CountryCode,
    ) -> PayinResult<(CartPayment, LegacyPayment)> {
        if let Some(existing_intent) = self
            .cart_payment_interface
            .get_payment_intent_for_idempotency_key(idempotency_key)
            .await?
        {
            let cart_payment = self.resume_payment_for_intent(existing_intent).await?;
            return Ok((cart_payment, legacy_payment));
        }

        let cart_payment = self
            .submit_new_payment(
                request_cart_payment,
                idempotency_key,
                payment_country,
                currency,
                Some(legacy_payment.stripe_customer_id.clone()),
                legacy_payment.stripe_card_id.clone(),
                legacy_payment.dd_consumer_id,
                legacy_payment.dd_country_id,
            )
            .await?;
        Ok((cart_payment, legacy_payment))
    }

    /// Adjust the amount of an existing cart payment. Positive deltas charge
    /// more, negative deltas reduce or refund, zero is a no-op.
    #[instrument(skip_all, fields(cart_payment_id = %cart_payment_id, idempotency_key = %idempotency_key))]
    pub async fn update_payment(
        &self,
        cart_payment_id: Uuid,
        idempotency_key: &str,
        _payer_id: Option<Uuid>,
        amount: MinorUnit,
        client_description: Option<String>,
        split_payment: Option<SplitPayment>,
    ) -> PayinResult<CartPayment> {
        let cart_payment = self
            .cart_payment_interface
            .get_cart_payment(cart_payment_id)
            .await?;

        utils::when(amount.is_negative(), || {
            Err(report!(ApiErrorResponse::CartPaymentAmountInvalid)
                .attach_printable("new amount must not be negative"))
        })?;

        if amount == cart_payment.amount {
            return Ok(cart_payment);
        }

        if amount > cart_payment.amount {
            self.update_payment_with_higher_amount(
                &cart_payment,
                amount,
                idempotency_key,
                client_description.clone(),
                split_payment.as_ref(),
            )
            .await?;
        } else {
            self.update_payment_with_lower_amount(&cart_payment, amount, idempotency_key)
                .await?;
        }

        self.cart_payment_interface
            .payment_repo
            .update_cart_payment(
                cart_payment,
                CartPaymentUpdate::AmountUpdate {
                    amount,
                    client_description,
                    updated_at: date_time::now(),
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    /// Legacy surface: the amount arrives as a delta against the charge
    /// resolved through the legacy consumer charge id.
    #[instrument(skip_all, fields(dd_charge_id = dd_charge_id, idempotency_key = %idempotency_key))]
    pub async fn update_payment_for_legacy_charge(
        &self,
        idempotency_key: &str,
        dd_charge_id: i32,
        amount: MinorUnit,
        client_description: Option<String>,
        _dd_additional_payment_info: Option<serde_json::Value>,
        split_payment: Option<SplitPayment>,
    ) -> PayinResult<CartPayment> {
        let payment_intent = self
            .legacy_payment_interface
            .get_associated_payment_intent(dd_charge_id)
            .await?
            .ok_or_else(|| report!(ApiErrorResponse::CartPaymentNotFound))?;
        let cart_payment = self
            .cart_payment_interface
            .get_cart_payment(payment_intent.cart_payment_id)
            .await?;

        let new_amount = cart_payment.amount + amount;
        utils::when(new_amount.is_negative(), || {
            Err(report!(ApiErrorResponse::CartPaymentAmountInvalid)
                .attach_printable("amount delta reduces the cart payment below zero"))
        })?;

        let description = self.get_legacy_client_description(client_description.as_deref());
        self.update_payment(
            cart_payment.id,
            idempotency_key,
            cart_payment.payer_id,
            new_amount,
            description,
            split_payment,
        )
        .await
    }

    /// Cancel every live intent under the cart payment: provider cancel
    /// before capture, full refund after.
    #[instrument(skip_all, fields(cart_payment_id = %cart_payment_id))]
    pub async fn cancel_payment(&self, cart_payment_id: Uuid) -> PayinResult<CartPayment> {
        let cart_payment = self
            .cart_payment_interface
            .get_cart_payment(cart_payment_id)
            .await?;
        let payment_intents = self
            .cart_payment_interface
            .get_cart_payment_intents(cart_payment_id)
            .await?;

        for payment_intent in payment_intents {
            self.cancel_payment_intent(payment_intent).await?;
        }

        self.cart_payment_interface
            .payment_repo
            .update_cart_payment(
                cart_payment,
                CartPaymentUpdate::AmountUpdate {
                    amount: MinorUnit::zero(),
                    client_description: None,
                    updated_at: date_time::now(),
                },
            )
            .await
            .change_context(ApiErrorResponse::InternalServerError)
    }

    pub async fn cancel_payment_for_legacy_charge(
        &self,
        dd_charge_id: i32,
    ) -> PayinResult<CartPayment> {
        let payment_intent = self
            .legacy_payment_interface
            .get_associated_payment_intent(dd_charge_id)
            .await?
            .ok_or_else(|| report!(ApiErrorResponse::CartPaymentNotFound))?;
        self.cancel_payment(payment_intent.cart_payment_id).await
    }

    /// Drive an authorized intent to capture. Invoked by the deferred
    /// capture sweeper once the capture window is due.
    #[instrument(skip_all, fields(payment_intent_id = %payment_intent.id))]
    pub async fn capture_payment(&self, payment_intent: PaymentIntent) -> PayinResult<CartPayment> {
        utils::when(payment_intent.status != IntentStatus::RequiresCapture, || {
            Err(report!(ApiErrorResponse::InternalServerError)
                .attach_printable("capture attempted on an intent that is not awaiting capture"))
        })?;

        let pgp_payment_intent = self
            .cart_payment_interface
            .find_pgp_payment_intent(payment_intent.id)
            .await?;
        let resource_id = pgp_payment_intent
            .resource_id
            .clone()
            .get_required_value("pgp resource_id")?;

        let capture_key = format!("{}-capture", payment_intent.idempotency_key);
        let provider_payment_intent = self
            .cart_payment_interface
            .gateway
            .capture_payment_intent(&resource_id, payment_intent.amount, &capture_key)
            .await
            .map_err(|error| {
                // Pre-call state is preserved; the sweeper will come back.
                logger::warn!(
                    payment_intent_id = %payment_intent.id,
                    "provider capture failed, leaving intent uncaptured"
                );
                error
            })
            .to_provider_response()?;

        let stripe_charge = self
            .find_stripe_charge_for_intent(&payment_intent)
            .await?;
        let (payment_intent, _) = self
            .cart_payment_interface
            .update_state_after_capture_with_provider(
                payment_intent,
                pgp_payment_intent,
                &provider_payment_intent,
            )
            .await?;
        self.legacy_payment_interface
            .update_charge_after_payment_captured(stripe_charge)
            .await?;

        self.cart_payment_interface
            .get_cart_payment(payment_intent.cart_payment_id)
            .await
    }

    /// Truncate a client description to what the legacy tables can hold.
    pub fn get_legacy_client_description(
        &self,
        client_description: Option<&str>,
    ) -> Option<String> {
        let max_length = self
            .cart_payment_interface
            .payments_settings
            .description_max_length;
        client_description.map(|description| {
            if description.chars().count() > max_length {
                description.chars().take(max_length).collect()
            } else {
                description.to_owned()
            }
        })
    }

    // Internal machinery.

    /// Replay of a create: the intent for this idempotency key already
    /// exists. Finish the provider step if it never completed, otherwise
    /// return the stored outcome unchanged.
    async fn resume_payment_for_intent(
        &self,
        payment_intent: PaymentIntent,
    ) -> PayinResult<CartPayment> {
        let cart_payment = self
            .cart_payment_interface
            .get_cart_payment(payment_intent.cart_payment_id)
            .await?;

        if payment_intent.status == IntentStatus::Init {
            logger::info!(
                payment_intent_id = %payment_intent.id,
                "resuming provider submission for a replayed create"
            );
            let pgp_payment_intent = self
                .cart_payment_interface
                .find_pgp_payment_intent(payment_intent.id)
                .await?;
            let stripe_charge = self
                .find_stripe_charge_for_intent(&payment_intent)
                .await?;
            self.submit_payment_and_apply_outcome(
                &cart_payment,
                payment_intent,
                pgp_payment_intent,
                stripe_charge,
            )
            .await?;
        }

        Ok(cart_payment)
    }

    #[allow(clippy::too_many_arguments)]
    async fn submit_new_payment(
        &self,
        request_cart_payment: &CartPaymentRequest,
        idempotency_key: &str,
        payment_country: CountryCode,
        currency: Currency,
        customer_resource_id: Option<masking::Secret<String>>,
        payment_method_resource_id: masking::Secret<String>,
        legacy_consumer_id: i64,
        legacy_country_id: i32,
    ) -> PayinResult<CartPayment> {
        let bundle = match self
            .cart_payment_interface
            .create_new_payment(
                request_cart_payment,
                idempotency_key,
                payment_country,
                currency,
                customer_resource_id,
                payment_method_resource_id,
                legacy_consumer_id,
                legacy_country_id,
            )
            .await
        {
            Ok(bundle) => bundle,
            Err(error) if error.current_context().is_db_unique_violation() => {
                // A concurrent retry won the insert race; converge on its
                // outcome.
                let winning_intent = self
                    .cart_payment_interface
                    .get_payment_intent_for_idempotency_key(idempotency_key)
                    .await?
                    .get_required_value("payment_intent")?;
                return self.resume_payment_for_intent(winning_intent).await;
            }
            Err(error) => {
                return Err(error.change_context(ApiErrorResponse::InternalServerError))
            }
        };

        self.submit_payment_and_apply_outcome(
            &bundle.cart_payment,
            bundle.payment_intent,
            bundle.pgp_payment_intent,
            bundle.legacy_stripe_charge,
        )
        .await?;

        Ok(bundle.cart_payment)
    }

    /// Shared submission tail for create and adjust-up: call the provider,
    /// then stamp the outcome onto the legacy and domain records. A failure
    /// never leaves the intent in INIT.
    async fn submit_payment_and_apply_outcome(
        &self,
        cart_payment: &CartPayment,
        payment_intent: PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
        legacy_stripe_charge: LegacyStripeCharge,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        let provider_payment_intent = match self
            .cart_payment_interface
            .submit_payment_to_provider(cart_payment, &payment_intent, &pgp_payment_intent)
            .await
        {
            Ok(provider_payment_intent) => provider_payment_intent,
            Err(error) => {
                self.update_state_after_provider_error(
                    payment_intent,
                    pgp_payment_intent,
                    legacy_stripe_charge,
                    &error,
                )
                .await?;
                return Err(error);
            }
        };

        if provider_payment_intent.status.to_intent_status() == IntentStatus::Failed {
            let error = report!(ApiErrorResponse::ProviderError {
                code: "unexpected_intent_status".to_string(),
                message: "provider did not settle the submission".to_string(),
                retryable: false,
            });
            self.update_state_after_provider_error(
                payment_intent,
                pgp_payment_intent,
                legacy_stripe_charge,
                &error,
            )
            .await?;
            return Err(error);
        }

        self.legacy_payment_interface
            .update_state_after_provider_submission(
                legacy_stripe_charge,
                &provider_payment_intent,
            )
            .await?;
        self.cart_payment_interface
            .update_state_after_provider_submission(
                payment_intent,
                pgp_payment_intent,
                &provider_payment_intent,
            )
            .await
    }

    /// Provider submission failed: stamp FAILED on the intent, its mirror
    /// and the stripe charge so no record stays in INIT, then let the error
    /// propagate to the caller.
    async fn update_state_after_provider_error(
        &self,
        payment_intent: PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
        legacy_stripe_charge: LegacyStripeCharge,
        error: &Report<ApiErrorResponse>,
    ) -> PayinResult<()> {
        logger::error!(
            payment_intent_id = %payment_intent.id,
            "provider submission failed, marking payment as failed"
        );
        let (error_code, error_message) = provider_error_details(error);
        self.cart_payment_interface
            .mark_payment_as_failed(
                payment_intent,
                pgp_payment_intent,
                error_code,
                error_message.clone(),
            )
            .await?;
        self.legacy_payment_interface
            .mark_charge_as_failed(
                legacy_stripe_charge,
                error_message.unwrap_or_else(|| "provider submission failed".to_string()),
            )
            .await?;
        Ok(())
    }

    /// Adjust-up. In place while the latest intent is still capturable and
    /// the new total stays within what the provider authorized; otherwise
    /// the prior intent is fully compensated and a fresh intent is charged
    /// for the whole new amount.
    async fn update_payment_with_higher_amount(
        &self,
        cart_payment: &CartPayment,
        new_amount: MinorUnit,
        idempotency_key: &str,
        description: Option<String>,
        split_payment: Option<&SplitPayment>,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        let payment_intents = self
            .cart_payment_interface
            .get_cart_payment_intents(cart_payment.id)
            .await?;

        // Replay of this very adjustment?
        if let Some(existing) = payment_intents
            .iter()
            .find(|intent| intent.idempotency_key == idempotency_key)
        {
            let pgp_payment_intent = self
                .cart_payment_interface
                .find_pgp_payment_intent(existing.id)
                .await?;
            if existing.status == IntentStatus::Init {
                let stripe_charge = self.find_stripe_charge_for_intent(existing).await?;
                return self
                    .submit_payment_and_apply_outcome(
                        cart_payment,
                        existing.clone(),
                        pgp_payment_intent,
                        stripe_charge,
                    )
                    .await;
            }
            return Ok((existing.clone(), pgp_payment_intent));
        }

        // Replays that already compensated the prior intent fall back to it
        // as the template even though it is no longer active.
        let latest_intent = most_recent_active_intent(&payment_intents)
            .or(payment_intents.last())
            .get_required_value("payment_intent")?
            .clone();
        let pgp_payment_intent = self
            .cart_payment_interface
            .find_pgp_payment_intent(latest_intent.id)
            .await?;

        // Uncaptured and still within the authorized ceiling: raise in
        // place, no provider round trip needed before capture.
        if latest_intent.status == IntentStatus::RequiresCapture
            && new_amount <= pgp_payment_intent.amount
        {
            if self
                .cart_payment_interface
                .get_payment_intent_adjustment(latest_intent.id, idempotency_key)
                .await?
                .is_some()
            {
                return Ok((latest_intent, pgp_payment_intent));
            }
            let stripe_charge = self.find_stripe_charge_for_intent(&latest_intent).await?;
            let pair = self
                .cart_payment_interface
                .adjust_uncaptured_amount(
                    latest_intent,
                    pgp_payment_intent,
                    new_amount,
                    idempotency_key,
                )
                .await?;
            self.legacy_payment_interface
                .update_charge_after_amount_adjustment(stripe_charge, new_amount)
                .await?;
            return Ok(pair);
        }

        // Compensate the prior intent in full, then charge the new total on
        // a replacement intent. Both steps are idempotent under this key.
        self.compensate_intent_in_full(&latest_intent, pgp_payment_intent, idempotency_key)
            .await?;

        let (payment_intent, pgp_payment_intent, stripe_charge) = self
            .cart_payment_interface
            .create_new_intent_for_cart_payment(
                cart_payment,
                &latest_intent,
                idempotency_key,
                new_amount,
                description,
                split_payment,
            )
            .await
            .to_duplicate_response(ApiErrorResponse::CartPaymentUpdateConflict)?;

        self.submit_payment_and_apply_outcome(
            cart_payment,
            payment_intent,
            pgp_payment_intent,
            stripe_charge,
        )
        .await
    }

    /// Adjust-down. Uncaptured intents are lowered locally; captured ones
    /// are refunded at the provider for the difference.
    async fn update_payment_with_lower_amount(
        &self,
        cart_payment: &CartPayment,
        new_amount: MinorUnit,
        idempotency_key: &str,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        let payment_intents = self
            .cart_payment_interface
            .get_cart_payment_intents(cart_payment.id)
            .await?;
        let latest_intent = most_recent_active_intent(&payment_intents)
            .get_required_value("active payment_intent")?
            .clone();
        let pgp_payment_intent = self
            .cart_payment_interface
            .find_pgp_payment_intent(latest_intent.id)
            .await?;

        let has_refunds = latest_intent.amount < pgp_payment_intent.amount;
        match classify_payment_intent(&latest_intent, &pgp_payment_intent, has_refunds) {
            PaymentIntentLifecycle::AuthorizedAwaitingCapture => {
                if self
                    .cart_payment_interface
                    .get_payment_intent_adjustment(latest_intent.id, idempotency_key)
                    .await?
                    .is_some()
                {
                    return Ok((latest_intent, pgp_payment_intent));
                }
                let stripe_charge = self.find_stripe_charge_for_intent(&latest_intent).await?;
                let pair = self
                    .cart_payment_interface
                    .adjust_uncaptured_amount(
                        latest_intent,
                        pgp_payment_intent,
                        new_amount,
                        idempotency_key,
                    )
                    .await?;
                self.legacy_payment_interface
                    .update_charge_after_amount_adjustment(stripe_charge, new_amount)
                    .await?;
                Ok(pair)
            }
            PaymentIntentLifecycle::Captured | PaymentIntentLifecycle::PartiallyRefunded => {
                let refund_amount = latest_intent.amount - new_amount;
                self.refund_intent(
                    latest_intent,
                    pgp_payment_intent,
                    refund_amount,
                    new_amount,
                    idempotency_key,
                )
                .await
            }
            other => Err(report!(ApiErrorResponse::InternalServerError).attach_printable(
                format!("no adjustable payment intent for amount reduction, found {other:?}"),
            )),
        }
    }

    /// Refund machinery shared by adjust-down, cancellation after capture
    /// and adjust-up compensation. Resumable at every step through the
    /// refund rows keyed by the adjustment idempotency key.
    async fn refund_intent(
        &self,
        payment_intent: PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
        refund_amount: MinorUnit,
        new_intent_amount: MinorUnit,
        idempotency_key: &str,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        let (refund, pgp_refund) = match self
            .cart_payment_interface
            .find_existing_refund(payment_intent.id, idempotency_key)
            .await?
        {
            Some((refund, _)) if refund.status == RefundStatus::Succeeded => {
                // Fully applied by a prior attempt.
                return Ok((payment_intent, pgp_payment_intent));
            }
            Some((refund, pgp_refund)) => (refund, pgp_refund),
            None => {
                self.cart_payment_interface
                    .create_new_refund(&payment_intent, refund_amount, idempotency_key, None)
                    .await?
            }
        };

        let provider_refund = self
            .cart_payment_interface
            .submit_refund_to_provider(&pgp_payment_intent, &refund)
            .await?;

        let stripe_charge = self.find_stripe_charge_for_intent(&payment_intent).await?;
        let payment_intent = self
            .cart_payment_interface
            .update_state_after_refund_with_provider(
                payment_intent,
                refund,
                pgp_refund,
                &provider_refund,
                new_intent_amount,
            )
            .await?;
        self.legacy_payment_interface
            .update_charge_after_refund(stripe_charge, refund_amount)
            .await?;

        Ok((payment_intent, pgp_payment_intent))
    }

    /// Zero out a live intent before a replacement is charged: refund when
    /// captured, provider cancel when still awaiting capture.
    async fn compensate_intent_in_full(
        &self,
        payment_intent: &PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
        idempotency_key: &str,
    ) -> PayinResult<()> {
        match payment_intent.status {
            IntentStatus::Succeeded if payment_intent.amount > MinorUnit::zero() => {
                self.refund_intent(
                    payment_intent.clone(),
                    pgp_payment_intent,
                    payment_intent.amount,
                    MinorUnit::zero(),
                    idempotency_key,
                )
                .await?;
            }
            IntentStatus::Succeeded | IntentStatus::Cancelled => {
                // Already fully refunded or cancelled; nothing left.
            }
            IntentStatus::RequiresCapture => {
                self.cancel_uncaptured_intent(payment_intent.clone(), pgp_payment_intent)
                    .await?;
            }
            other => {
                return Err(report!(ApiErrorResponse::InternalServerError)
                    .attach_printable(format!("cannot compensate an intent in status {other}")))
            }
        }
        Ok(())
    }

    async fn cancel_uncaptured_intent(
        &self,
        payment_intent: PaymentIntent,
        pgp_payment_intent: PgpPaymentIntent,
    ) -> PayinResult<(PaymentIntent, PgpPaymentIntent)> {
        if let Some(resource_id) = pgp_payment_intent.resource_id.clone() {
            let cancel_key = format!("{}-cancel", payment_intent.idempotency_key);
            self.cart_payment_interface
                .gateway
                .cancel_payment_intent(&resource_id, &cancel_key)
                .await
                .to_provider_response()?;
        }
        let stripe_charge = self.find_stripe_charge_for_intent(&payment_intent).await?;
        let pair = self
            .cart_payment_interface
            .update_state_after_cancel_with_provider(payment_intent, pgp_payment_intent)
            .await?;
        self.legacy_payment_interface
            .update_charge_after_payment_cancelled(stripe_charge)
            .await?;
        Ok(pair)
    }

    /// Cancellation of a single intent, dispatched on its lifecycle stage.
    async fn cancel_payment_intent(&self, payment_intent: PaymentIntent) -> PayinResult<()> {
        let pgp_payment_intent = self
            .cart_payment_interface
            .find_pgp_payment_intent(payment_intent.id)
            .await?;

        let has_refunds = payment_intent.amount < pgp_payment_intent.amount;
        match classify_payment_intent(&payment_intent, &pgp_payment_intent, has_refunds) {
            PaymentIntentLifecycle::AuthorizedAwaitingCapture => {
                self.cancel_uncaptured_intent(payment_intent, pgp_payment_intent)
                    .await?;
            }
            PaymentIntentLifecycle::Captured | PaymentIntentLifecycle::PartiallyRefunded => {
                // Post-capture cancel is a refund for everything left.
                let cancel_key = format!("{}-cancel", payment_intent.idempotency_key);
                let amount = payment_intent.amount;
                self.refund_intent(
                    payment_intent,
                    pgp_payment_intent,
                    amount,
                    MinorUnit::zero(),
                    &cancel_key,
                )
                .await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn find_stripe_charge_for_intent(
        &self,
        payment_intent: &PaymentIntent,
    ) -> PayinResult<LegacyStripeCharge> {
        self.legacy_payment_interface
            .find_existing_payment_charge(
                payment_intent.legacy_consumer_charge_id,
                &payment_intent.idempotency_key,
            )
            .await?
            .map(|(_, stripe_charge)| stripe_charge)
            .get_required_value("legacy_stripe_charge")
    }
}
