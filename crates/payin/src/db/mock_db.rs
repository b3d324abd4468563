//! In-memory implementation of every storage interface. Mirrors the
//! uniqueness constraints the real schema enforces so idempotency races
//! behave the same way in tests as against PostgreSQL.

use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use async_trait::async_trait;
use error_stack::report;
use futures::{stream::BoxStream, StreamExt};
use storage_models::{
    cart_payment::CartPaymentUpdateInternal, legacy_charge::LegacyStripeChargeUpdateInternal,
    payment_intent::PaymentIntentUpdateInternal,
    pgp_payment_intent::PgpPaymentIntentUpdateInternal,
    refund::{PgpRefundUpdateInternal, RefundUpdateInternal},
};
use time::PrimitiveDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    cart_payment::{CartPaymentBundle, CartPaymentBundleNew, CartPaymentInterface},
    legacy_charge::LegacyChargeInterface,
    payment_intent::PaymentIntentInterface,
    pgp_payment_intent::PgpPaymentIntentInterface,
    refund::RefundInterface,
};
use crate::{
    core::errors::{self, CustomResult},
    types::storage::{
        CartPayment, CartPaymentUpdate, LegacyConsumerCharge, LegacyConsumerChargeNew,
        LegacyStripeCharge, LegacyStripeChargeNew, LegacyStripeChargeUpdate, PaymentIntent,
        PaymentIntentAdjustmentHistory, PaymentIntentAdjustmentHistoryNew, PaymentIntentNew,
        PaymentIntentUpdate, PgpPaymentIntent, PgpPaymentIntentNew, PgpPaymentIntentUpdate,
        PgpRefund, PgpRefundNew, PgpRefundUpdate, Refund, RefundNew, RefundUpdate,
    },
};

#[derive(Clone, Default)]
pub struct MockDb {
    cart_payments: Arc<Mutex<Vec<CartPayment>>>,
    payment_intents: Arc<Mutex<Vec<PaymentIntent>>>,
    pgp_payment_intents: Arc<Mutex<Vec<PgpPaymentIntent>>>,
    adjustment_history: Arc<Mutex<Vec<PaymentIntentAdjustmentHistory>>>,
    refunds: Arc<Mutex<Vec<Refund>>>,
    pgp_refunds: Arc<Mutex<Vec<PgpRefund>>>,
    legacy_consumer_charges: Arc<Mutex<Vec<LegacyConsumerCharge>>>,
    legacy_stripe_charges: Arc<Mutex<Vec<LegacyStripeCharge>>>,
    consumer_charge_seq: Arc<AtomicI32>,
    stripe_charge_seq: Arc<AtomicI32>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_consumer_charge_id(&self) -> i32 {
        self.consumer_charge_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn next_stripe_charge_id(&self) -> i32 {
        self.stripe_charge_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn build_payment_intent(new: PaymentIntentNew, legacy_charge_id: i32) -> PaymentIntent {
        PaymentIntent {
            id: new.id,
            cart_payment_id: new.cart_payment_id,
            idempotency_key: new.idempotency_key,
            amount: new.amount,
            amount_capturable: new.amount_capturable,
            amount_received: new.amount_received,
            application_fee_amount: new.application_fee_amount,
            currency: new.currency,
            country: new.country,
            capture_method: new.capture_method,
            status: new.status,
            statement_descriptor: new.statement_descriptor,
            legacy_consumer_charge_id: legacy_charge_id,
            created_at: new.created_at,
            updated_at: new.updated_at,
            captured_at: None,
            cancelled_at: None,
            capture_after: new.capture_after,
        }
    }

    fn build_pgp_payment_intent(new: PgpPaymentIntentNew) -> PgpPaymentIntent {
        PgpPaymentIntent {
            id: new.id,
            payment_intent_id: new.payment_intent_id,
            idempotency_key: new.idempotency_key,
            pgp_code: new.pgp_code,
            resource_id: None,
            charge_resource_id: None,
            payment_method_resource_id: new.payment_method_resource_id,
            customer_resource_id: new.customer_resource_id,
            amount: new.amount,
            amount_capturable: new.amount_capturable,
            amount_received: new.amount_received,
            application_fee_amount: new.application_fee_amount,
            currency: new.currency,
            capture_method: new.capture_method,
            status: new.status,
            error_code: None,
            error_message: None,
            created_at: new.created_at,
            updated_at: new.updated_at,
            captured_at: None,
            cancelled_at: None,
        }
    }

    fn build_stripe_charge(
        &self,
        new: LegacyStripeChargeNew,
        legacy_charge_id: i32,
    ) -> LegacyStripeCharge {
        LegacyStripeCharge {
            id: self.next_stripe_charge_id(),
            charge_id: legacy_charge_id,
            idempotency_key: new.idempotency_key,
            amount: new.amount,
            amount_refunded: new.amount_refunded,
            currency: new.currency,
            status: new.status,
            stripe_id: new.stripe_id,
            description: new.description,
            error_reason: None,
            created_at: new.created_at,
            updated_at: new.updated_at,
            refunded_at: None,
        }
    }

    fn build_consumer_charge(&self, new: LegacyConsumerChargeNew) -> LegacyConsumerCharge {
        LegacyConsumerCharge {
            id: self.next_consumer_charge_id(),
            consumer_id: new.consumer_id,
            country_id: new.country_id,
            original_total: new.original_total,
            currency: new.currency,
            created_at: new.created_at,
        }
    }

    fn duplicate(entity: &'static str, key: String) -> error_stack::Report<errors::StorageError> {
        report!(errors::StorageError::DuplicateValue {
            entity,
            key: Some(key),
        })
    }
}

fn apply_cart_payment_update(row: &mut CartPayment, update: CartPaymentUpdate) {
    let internal = CartPaymentUpdateInternal::from(update);
    if let Some(amount) = internal.amount {
        row.amount = amount;
    }
    if internal.client_description.is_some() {
        row.client_description = internal.client_description;
    }
    if let Some(updated_at) = internal.updated_at {
        row.updated_at = updated_at;
    }
}

fn apply_payment_intent_update(row: &mut PaymentIntent, update: PaymentIntentUpdate) {
    let internal = PaymentIntentUpdateInternal::from(update);
    if let Some(amount) = internal.amount {
        row.amount = amount;
    }
    if let Some(amount_capturable) = internal.amount_capturable {
        row.amount_capturable = amount_capturable;
    }
    if let Some(amount_received) = internal.amount_received {
        row.amount_received = amount_received;
    }
    if let Some(status) = internal.status {
        row.status = status;
    }
    if internal.captured_at.is_some() {
        row.captured_at = internal.captured_at;
    }
    if internal.cancelled_at.is_some() {
        row.cancelled_at = internal.cancelled_at;
    }
    if let Some(updated_at) = internal.updated_at {
        row.updated_at = updated_at;
    }
}

fn apply_pgp_payment_intent_update(row: &mut PgpPaymentIntent, update: PgpPaymentIntentUpdate) {
    let internal = PgpPaymentIntentUpdateInternal::from(update);
    if internal.resource_id.is_some() {
        row.resource_id = internal.resource_id;
    }
    if internal.charge_resource_id.is_some() {
        row.charge_resource_id = internal.charge_resource_id;
    }
    if let Some(amount) = internal.amount {
        row.amount = amount;
    }
    if let Some(amount_capturable) = internal.amount_capturable {
        row.amount_capturable = amount_capturable;
    }
    if let Some(amount_received) = internal.amount_received {
        row.amount_received = amount_received;
    }
    if let Some(status) = internal.status {
        row.status = status;
    }
    if internal.error_code.is_some() {
        row.error_code = internal.error_code;
    }
    if internal.error_message.is_some() {
        row.error_message = internal.error_message;
    }
    if internal.captured_at.is_some() {
        row.captured_at = internal.captured_at;
    }
    if internal.cancelled_at.is_some() {
        row.cancelled_at = internal.cancelled_at;
    }
    if let Some(updated_at) = internal.updated_at {
        row.updated_at = updated_at;
    }
}

fn apply_stripe_charge_update(row: &mut LegacyStripeCharge, update: LegacyStripeChargeUpdate) {
    let internal = LegacyStripeChargeUpdateInternal::from(update);
    if let Some(amount) = internal.amount {
        row.amount = amount;
    }
    if let Some(amount_refunded) = internal.amount_refunded {
        row.amount_refunded = amount_refunded;
    }
    if let Some(status) = internal.status {
        row.status = status;
    }
    if internal.stripe_id.is_some() {
        row.stripe_id = internal.stripe_id;
    }
    if internal.error_reason.is_some() {
        row.error_reason = internal.error_reason;
    }
    if internal.refunded_at.is_some() {
        row.refunded_at = internal.refunded_at;
    }
    if let Some(updated_at) = internal.updated_at {
        row.updated_at = updated_at;
    }
}

fn apply_refund_update(row: &mut Refund, update: RefundUpdate) {
    let internal = RefundUpdateInternal::from(update);
    if let Some(status) = internal.status {
        row.status = status;
    }
    if let Some(updated_at) = internal.updated_at {
        row.updated_at = updated_at;
    }
}

fn apply_pgp_refund_update(row: &mut PgpRefund, update: PgpRefundUpdate) {
    let internal = PgpRefundUpdateInternal::from(update);
    if let Some(status) = internal.status {
        row.status = status;
    }
    if internal.resource_id.is_some() {
        row.resource_id = internal.resource_id;
    }
    if let Some(updated_at) = internal.updated_at {
        row.updated_at = updated_at;
    }
}

#[async_trait]
impl CartPaymentInterface for MockDb {
    async fn insert_cart_payment_with_intents(
        &self,
        bundle: CartPaymentBundleNew,
    ) -> CustomResult<CartPaymentBundle, errors::StorageError> {
        let mut intents = self.payment_intents.lock().await;
        if intents.iter().any(|intent| {
            intent.cart_payment_id == bundle.payment_intent.cart_payment_id
                && intent.idempotency_key == bundle.payment_intent.idempotency_key
        }) {
            return Err(Self::duplicate(
                "payment_intent",
                bundle.payment_intent.idempotency_key,
            ));
        }

        let cart_payment = CartPayment {
            id: bundle.cart_payment.id,
            payer_id: bundle.cart_payment.payer_id,
            payment_method_id: bundle.cart_payment.payment_method_id,
            amount: bundle.cart_payment.amount,
            currency: bundle.cart_payment.currency,
            country: bundle.cart_payment.country,
            delay_capture: bundle.cart_payment.delay_capture,
            client_description: bundle.cart_payment.client_description,
            payer_statement_description: bundle.cart_payment.payer_statement_description,
            reference_id: bundle.cart_payment.reference_id,
            reference_type: bundle.cart_payment.reference_type,
            payout_account_id: bundle.cart_payment.payout_account_id,
            application_fee_amount: bundle.cart_payment.application_fee_amount,
            metadata: bundle.cart_payment.metadata,
            created_at: bundle.cart_payment.created_at,
            updated_at: bundle.cart_payment.updated_at,
        };
        let legacy_consumer_charge = self.build_consumer_charge(bundle.legacy_consumer_charge);
        let payment_intent =
            Self::build_payment_intent(bundle.payment_intent, legacy_consumer_charge.id);
        let pgp_payment_intent = Self::build_pgp_payment_intent(bundle.pgp_payment_intent);
        let legacy_stripe_charge =
            self.build_stripe_charge(bundle.legacy_stripe_charge, legacy_consumer_charge.id);

        self.cart_payments.lock().await.push(cart_payment.clone());
        intents.push(payment_intent.clone());
        self.pgp_payment_intents
            .lock()
            .await
            .push(pgp_payment_intent.clone());
        self.legacy_consumer_charges
            .lock()
            .await
            .push(legacy_consumer_charge.clone());
        self.legacy_stripe_charges
            .lock()
            .await
            .push(legacy_stripe_charge.clone());

        Ok(CartPaymentBundle {
            cart_payment,
            payment_intent,
            pgp_payment_intent,
            legacy_consumer_charge,
            legacy_stripe_charge,
        })
    }

    async fn find_cart_payment_by_id(
        &self,
        cart_payment_id: Uuid,
    ) -> CustomResult<Option<CartPayment>, errors::StorageError> {
        Ok(self
            .cart_payments
            .lock()
            .await
            .iter()
            .find(|cart_payment| cart_payment.id == cart_payment_id)
            .cloned())
    }

    async fn update_cart_payment(
        &self,
        this: CartPayment,
        cart_payment: CartPaymentUpdate,
    ) -> CustomResult<CartPayment, errors::StorageError> {
        let mut cart_payments = self.cart_payments.lock().await;
        let row = cart_payments
            .iter_mut()
            .find(|row| row.id == this.id)
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "cart_payment {}",
                    this.id
                )))
            })?;
        apply_cart_payment_update(row, cart_payment);
        Ok(row.clone())
    }
}

#[async_trait]
impl PaymentIntentInterface for MockDb {
    async fn insert_payment_intent_with_mirrors(
        &self,
        payment_intent: PaymentIntentNew,
        pgp_payment_intent: PgpPaymentIntentNew,
        legacy_stripe_charge: LegacyStripeChargeNew,
    ) -> CustomResult<
        (PaymentIntent, PgpPaymentIntent, LegacyStripeCharge),
        errors::StorageError,
    > {
        let mut intents = self.payment_intents.lock().await;
        if intents.iter().any(|intent| {
            intent.cart_payment_id == payment_intent.cart_payment_id
                && intent.idempotency_key == payment_intent.idempotency_key
        }) {
            return Err(Self::duplicate(
                "payment_intent",
                payment_intent.idempotency_key,
            ));
        }
        let mut stripe_charges = self.legacy_stripe_charges.lock().await;
        if stripe_charges.iter().any(|charge| {
            charge.charge_id == legacy_stripe_charge.charge_id
                && charge.idempotency_key == legacy_stripe_charge.idempotency_key
        }) {
            return Err(Self::duplicate(
                "legacy_stripe_charge",
                legacy_stripe_charge.idempotency_key,
            ));
        }

        let legacy_charge_id = payment_intent.legacy_consumer_charge_id;
        let intent = Self::build_payment_intent(payment_intent, legacy_charge_id);
        let pgp_intent = Self::build_pgp_payment_intent(pgp_payment_intent);
        let charge_id = legacy_stripe_charge.charge_id;
        let stripe_charge = self.build_stripe_charge(legacy_stripe_charge, charge_id);

        intents.push(intent.clone());
        self.pgp_payment_intents
            .lock()
            .await
            .push(pgp_intent.clone());
        stripe_charges.push(stripe_charge.clone());

        Ok((intent, pgp_intent, stripe_charge))
    }

    async fn find_payment_intents_for_cart_payment(
        &self,
        cart_payment_id: Uuid,
    ) -> CustomResult<Vec<PaymentIntent>, errors::StorageError> {
        let mut intents: Vec<PaymentIntent> = self
            .payment_intents
            .lock()
            .await
            .iter()
            .filter(|intent| intent.cart_payment_id == cart_payment_id)
            .cloned()
            .collect();
        intents.sort_by_key(|intent| intent.created_at);
        Ok(intents)
    }

    async fn find_payment_intent_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> CustomResult<Option<PaymentIntent>, errors::StorageError> {
        Ok(self
            .payment_intents
            .lock()
            .await
            .iter()
            .find(|intent| intent.idempotency_key == idempotency_key)
            .cloned())
    }

    async fn find_payment_intent_for_legacy_charge(
        &self,
        legacy_consumer_charge_id: i32,
    ) -> CustomResult<Option<PaymentIntent>, errors::StorageError> {
        let intents = self.payment_intents.lock().await;
        Ok(intents
            .iter()
            .filter(|intent| intent.legacy_consumer_charge_id == legacy_consumer_charge_id)
            .max_by_key(|intent| intent.created_at)
            .cloned())
    }

    async fn update_payment_intent(
        &self,
        this: PaymentIntent,
        payment_intent: PaymentIntentUpdate,
    ) -> CustomResult<PaymentIntent, errors::StorageError> {
        let mut intents = self.payment_intents.lock().await;
        let row = intents
            .iter_mut()
            .find(|row| row.id == this.id)
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "payment_intent {}",
                    this.id
                )))
            })?;
        apply_payment_intent_update(row, payment_intent);
        Ok(row.clone())
    }

    async fn update_payment_intent_with_mirror(
        &self,
        this: PaymentIntent,
        payment_intent: PaymentIntentUpdate,
        pgp_this: PgpPaymentIntent,
        pgp_payment_intent: PgpPaymentIntentUpdate,
    ) -> CustomResult<(PaymentIntent, PgpPaymentIntent), errors::StorageError> {
        let intent = self.update_payment_intent(this, payment_intent).await?;
        let pgp_intent = {
            let mut pgp_intents = self.pgp_payment_intents.lock().await;
            let row = pgp_intents
                .iter_mut()
                .find(|row| row.id == pgp_this.id)
                .ok_or_else(|| {
                    report!(errors::StorageError::ValueNotFound(format!(
                        "pgp_payment_intent {}",
                        pgp_this.id
                    )))
                })?;
            apply_pgp_payment_intent_update(row, pgp_payment_intent);
            row.clone()
        };
        Ok((intent, pgp_intent))
    }

    async fn insert_payment_intent_adjustment_history(
        &self,
        history: PaymentIntentAdjustmentHistoryNew,
    ) -> CustomResult<PaymentIntentAdjustmentHistory, errors::StorageError> {
        let mut rows = self.adjustment_history.lock().await;
        if rows.iter().any(|row| {
            row.payment_intent_id == history.payment_intent_id
                && row.idempotency_key == history.idempotency_key
        }) {
            return Err(Self::duplicate(
                "payment_intent_adjustment_history",
                history.idempotency_key,
            ));
        }
        let row = PaymentIntentAdjustmentHistory {
            id: history.id,
            payment_intent_id: history.payment_intent_id,
            idempotency_key: history.idempotency_key,
            amount_original: history.amount_original,
            amount_delta: history.amount_delta,
            amount: history.amount,
            currency: history.currency,
            created_at: history.created_at,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_payment_intent_adjustment_history(
        &self,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> CustomResult<Option<PaymentIntentAdjustmentHistory>, errors::StorageError> {
        Ok(self
            .adjustment_history
            .lock()
            .await
            .iter()
            .find(|row| {
                row.payment_intent_id == payment_intent_id
                    && row.idempotency_key == idempotency_key
            })
            .cloned())
    }

    fn find_payment_intents_that_require_capture_before_cutoff(
        &self,
        cutoff: PrimitiveDateTime,
        _batch_size: i64,
    ) -> BoxStream<'_, CustomResult<PaymentIntent, errors::StorageError>> {
        let payment_intents = Arc::clone(&self.payment_intents);
        futures::stream::once(async move {
            let mut due: Vec<PaymentIntent> = payment_intents
                .lock()
                .await
                .iter()
                .filter(|intent| {
                    intent.status == storage_models::enums::IntentStatus::RequiresCapture
                        && intent
                            .capture_after
                            .map(|capture_after| capture_after <= cutoff)
                            .unwrap_or(false)
                })
                .cloned()
                .collect();
            due.sort_by_key(|intent| intent.id);
            futures::stream::iter(due.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }
}

#[async_trait]
impl PgpPaymentIntentInterface for MockDb {
    async fn find_pgp_payment_intents(
        &self,
        payment_intent_id: Uuid,
    ) -> CustomResult<Vec<PgpPaymentIntent>, errors::StorageError> {
        let mut rows: Vec<PgpPaymentIntent> = self
            .pgp_payment_intents
            .lock()
            .await
            .iter()
            .filter(|row| row.payment_intent_id == payment_intent_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }

    async fn update_pgp_payment_intent(
        &self,
        this: PgpPaymentIntent,
        pgp_payment_intent: PgpPaymentIntentUpdate,
    ) -> CustomResult<PgpPaymentIntent, errors::StorageError> {
        let mut rows = self.pgp_payment_intents.lock().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id == this.id)
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "pgp_payment_intent {}",
                    this.id
                )))
            })?;
        apply_pgp_payment_intent_update(row, pgp_payment_intent);
        Ok(row.clone())
    }
}

#[async_trait]
impl RefundInterface for MockDb {
    async fn insert_refund_with_mirror(
        &self,
        refund: RefundNew,
        pgp_refund: PgpRefundNew,
    ) -> CustomResult<(Refund, PgpRefund), errors::StorageError> {
        let mut refunds = self.refunds.lock().await;
        if refunds.iter().any(|row| {
            row.payment_intent_id == refund.payment_intent_id
                && row.idempotency_key == refund.idempotency_key
        }) {
            return Err(Self::duplicate("refund", refund.idempotency_key));
        }
        let refund_row = Refund {
            id: refund.id,
            payment_intent_id: refund.payment_intent_id,
            idempotency_key: refund.idempotency_key,
            status: refund.status,
            amount: refund.amount,
            currency: refund.currency,
            reason: refund.reason,
            created_at: refund.created_at,
            updated_at: refund.updated_at,
        };
        let pgp_refund_row = PgpRefund {
            id: pgp_refund.id,
            refund_id: pgp_refund.refund_id,
            idempotency_key: pgp_refund.idempotency_key,
            status: pgp_refund.status,
            amount: pgp_refund.amount,
            currency: pgp_refund.currency,
            pgp_code: pgp_refund.pgp_code,
            resource_id: None,
            created_at: pgp_refund.created_at,
            updated_at: pgp_refund.updated_at,
        };
        refunds.push(refund_row.clone());
        self.pgp_refunds.lock().await.push(pgp_refund_row.clone());
        Ok((refund_row, pgp_refund_row))
    }

    async fn find_refund_by_idempotency_key(
        &self,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> CustomResult<Option<Refund>, errors::StorageError> {
        Ok(self
            .refunds
            .lock()
            .await
            .iter()
            .find(|row| {
                row.payment_intent_id == payment_intent_id
                    && row.idempotency_key == idempotency_key
            })
            .cloned())
    }

    async fn find_pgp_refund_by_refund_id(
        &self,
        refund_id: Uuid,
    ) -> CustomResult<Option<PgpRefund>, errors::StorageError> {
        Ok(self
            .pgp_refunds
            .lock()
            .await
            .iter()
            .find(|row| row.refund_id == refund_id)
            .cloned())
    }

    async fn update_refund_with_mirror(
        &self,
        this: Refund,
        refund: RefundUpdate,
        pgp_this: PgpRefund,
        pgp_refund: PgpRefundUpdate,
    ) -> CustomResult<(Refund, PgpRefund), errors::StorageError> {
        let refund_row = {
            let mut refunds = self.refunds.lock().await;
            let row = refunds
                .iter_mut()
                .find(|row| row.id == this.id)
                .ok_or_else(|| {
                    report!(errors::StorageError::ValueNotFound(format!(
                        "refund {}",
                        this.id
                    )))
                })?;
            apply_refund_update(row, refund);
            row.clone()
        };
        let pgp_refund_row = {
            let mut pgp_refunds = self.pgp_refunds.lock().await;
            let row = pgp_refunds
                .iter_mut()
                .find(|row| row.id == pgp_this.id)
                .ok_or_else(|| {
                    report!(errors::StorageError::ValueNotFound(format!(
                        "pgp_refund {}",
                        pgp_this.id
                    )))
                })?;
            apply_pgp_refund_update(row, pgp_refund);
            row.clone()
        };
        Ok((refund_row, pgp_refund_row))
    }
}

#[async_trait]
impl LegacyChargeInterface for MockDb {
    async fn find_legacy_consumer_charge_by_id(
        &self,
        charge_id: i32,
    ) -> CustomResult<Option<LegacyConsumerCharge>, errors::StorageError> {
        Ok(self
            .legacy_consumer_charges
            .lock()
            .await
            .iter()
            .find(|row| row.id == charge_id)
            .cloned())
    }

    async fn find_legacy_stripe_charge(
        &self,
        charge_id: i32,
        idempotency_key: &str,
    ) -> CustomResult<Option<LegacyStripeCharge>, errors::StorageError> {
        Ok(self
            .legacy_stripe_charges
            .lock()
            .await
            .iter()
            .find(|row| row.charge_id == charge_id && row.idempotency_key == idempotency_key)
            .cloned())
    }

    async fn find_legacy_stripe_charges_for_charge(
        &self,
        charge_id: i32,
    ) -> CustomResult<Vec<LegacyStripeCharge>, errors::StorageError> {
        let mut rows: Vec<LegacyStripeCharge> = self
            .legacy_stripe_charges
            .lock()
            .await
            .iter()
            .filter(|row| row.charge_id == charge_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }

    async fn update_legacy_stripe_charge(
        &self,
        this: LegacyStripeCharge,
        stripe_charge: LegacyStripeChargeUpdate,
    ) -> CustomResult<LegacyStripeCharge, errors::StorageError> {
        let mut rows = self.legacy_stripe_charges.lock().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id == this.id)
            .ok_or_else(|| {
                report!(errors::StorageError::ValueNotFound(format!(
                    "legacy_stripe_charge {}",
                    this.id
                )))
            })?;
        apply_stripe_charge_update(row, stripe_charge);
        Ok(row.clone())
    }
}
