use std::collections::VecDeque;

use async_bb8_diesel::{AsyncConnection, AsyncRunQueryDsl};
use async_trait::async_trait;
use diesel::{ExpressionMethods, QueryDsl};
use error_stack::report;
use futures::{stream::BoxStream, StreamExt};
use storage_models::{
    errors::DatabaseError,
    payment_intent::PaymentIntentUpdateInternal,
    pgp_payment_intent::PgpPaymentIntentUpdateInternal,
    schema,
};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::{
    connection,
    core::errors::{self, CustomResult},
    services::Store,
    types::storage::{
        LegacyStripeCharge, LegacyStripeChargeNew, PaymentIntent,
        PaymentIntentAdjustmentHistory, PaymentIntentAdjustmentHistoryNew, PaymentIntentNew,
        PaymentIntentUpdate, PgpPaymentIntent, PgpPaymentIntentNew, PgpPaymentIntentUpdate,
    },
};

#[async_trait]
pub trait PaymentIntentInterface {
    /// New intent under an existing cart payment: the intent, its provider
    /// mirror and the legacy stripe charge land in one transaction.
    async fn insert_payment_intent_with_mirrors(
        &self,
        payment_intent: PaymentIntentNew,
        pgp_payment_intent: PgpPaymentIntentNew,
        legacy_stripe_charge: LegacyStripeChargeNew,
    ) -> CustomResult<
        (PaymentIntent, PgpPaymentIntent, LegacyStripeCharge),
        errors::StorageError,
    >;

    async fn find_payment_intents_for_cart_payment(
        &self,
        cart_payment_id: Uuid,
    ) -> CustomResult<Vec<PaymentIntent>, errors::StorageError>;

    async fn find_payment_intent_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> CustomResult<Option<PaymentIntent>, errors::StorageError>;

    async fn find_payment_intent_for_legacy_charge(
        &self,
        legacy_consumer_charge_id: i32,
    ) -> CustomResult<Option<PaymentIntent>, errors::StorageError>;

    async fn update_payment_intent(
        &self,
        this: PaymentIntent,
        payment_intent: PaymentIntentUpdate,
    ) -> CustomResult<PaymentIntent, errors::StorageError>;

    /// Lockstep status/amount advance of an intent and its provider mirror.
    async fn update_payment_intent_with_mirror(
        &self,
        this: PaymentIntent,
        payment_intent: PaymentIntentUpdate,
        pgp_this: PgpPaymentIntent,
        pgp_payment_intent: PgpPaymentIntentUpdate,
    ) -> CustomResult<(PaymentIntent, PgpPaymentIntent), errors::StorageError>;

    async fn insert_payment_intent_adjustment_history(
        &self,
        history: PaymentIntentAdjustmentHistoryNew,
    ) -> CustomResult<PaymentIntentAdjustmentHistory, errors::StorageError>;

    async fn find_payment_intent_adjustment_history(
        &self,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> CustomResult<Option<PaymentIntentAdjustmentHistory>, errors::StorageError>;

    /// Lazy, finite cursor over intents whose deferred capture is due.
    /// Pages are fetched on demand; the stream is not restartable.
    fn find_payment_intents_that_require_capture_before_cutoff(
        &self,
        cutoff: PrimitiveDateTime,
        batch_size: i64,
    ) -> BoxStream<'_, CustomResult<PaymentIntent, errors::StorageError>>;
}

#[async_trait]
impl PaymentIntentInterface for Store {
    #[tracing::instrument(skip_all)]
    async fn insert_payment_intent_with_mirrors(
        &self,
        payment_intent: PaymentIntentNew,
        pgp_payment_intent: PgpPaymentIntentNew,
        legacy_stripe_charge: LegacyStripeChargeNew,
    ) -> CustomResult<
        (PaymentIntent, PgpPaymentIntent, LegacyStripeCharge),
        errors::StorageError,
    > {
        let conn = connection::pg_connection_write(self).await?;
        conn.transaction_async(|conn| async move {
            let intent: PaymentIntent = diesel::insert_into(schema::payment_intents::table)
                .values(payment_intent)
                .get_result_async(&conn)
                .await?;
            let pgp_intent: PgpPaymentIntent =
                diesel::insert_into(schema::pgp_payment_intents::table)
                    .values(pgp_payment_intent)
                    .get_result_async(&conn)
                    .await?;
            let stripe_charge: LegacyStripeCharge =
                diesel::insert_into(schema::legacy_stripe_charges::table)
                    .values(legacy_stripe_charge)
                    .get_result_async(&conn)
                    .await?;
            Ok::<_, diesel::result::Error>((intent, pgp_intent, stripe_charge))
        })
        .await
        .map_err(|error| {
            report!(errors::StorageError::from(report!(DatabaseError::from(
                error
            ))))
        })
    }

    #[tracing::instrument(skip_all)]
    async fn find_payment_intents_for_cart_payment(
        &self,
        cart_payment_id: Uuid,
    ) -> CustomResult<Vec<PaymentIntent>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        PaymentIntent::find_by_cart_payment_id(&conn, cart_payment_id)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn find_payment_intent_by_idempotency_key(
        &self,
        idempotency_key: &str,
    ) -> CustomResult<Option<PaymentIntent>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        PaymentIntent::find_optional_by_idempotency_key(&conn, idempotency_key)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn find_payment_intent_for_legacy_charge(
        &self,
        legacy_consumer_charge_id: i32,
    ) -> CustomResult<Option<PaymentIntent>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        PaymentIntent::find_optional_by_legacy_consumer_charge_id(
            &conn,
            legacy_consumer_charge_id,
        )
        .await
        .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn update_payment_intent(
        &self,
        this: PaymentIntent,
        payment_intent: PaymentIntentUpdate,
    ) -> CustomResult<PaymentIntent, errors::StorageError> {
        let conn = connection::pg_connection_write(self).await?;
        this.update(&conn, payment_intent)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn update_payment_intent_with_mirror(
        &self,
        this: PaymentIntent,
        payment_intent: PaymentIntentUpdate,
        pgp_this: PgpPaymentIntent,
        pgp_payment_intent: PgpPaymentIntentUpdate,
    ) -> CustomResult<(PaymentIntent, PgpPaymentIntent), errors::StorageError> {
        let conn = connection::pg_connection_write(self).await?;
        conn.transaction_async(|conn| async move {
            let intent: PaymentIntent = diesel::update(
                schema::payment_intents::table
                    .filter(schema::payment_intents::dsl::id.eq(this.id)),
            )
            .set(PaymentIntentUpdateInternal::from(payment_intent))
            .get_result_async(&conn)
            .await?;
            let pgp_intent: PgpPaymentIntent = diesel::update(
                schema::pgp_payment_intents::table
                    .filter(schema::pgp_payment_intents::dsl::id.eq(pgp_this.id)),
            )
            .set(PgpPaymentIntentUpdateInternal::from(pgp_payment_intent))
            .get_result_async(&conn)
            .await?;
            Ok::<_, diesel::result::Error>((intent, pgp_intent))
        })
        .await
        .map_err(|error| {
            report!(errors::StorageError::from(report!(DatabaseError::from(
                error
            ))))
        })
    }

    #[tracing::instrument(skip_all)]
    async fn insert_payment_intent_adjustment_history(
        &self,
        history: PaymentIntentAdjustmentHistoryNew,
    ) -> CustomResult<PaymentIntentAdjustmentHistory, errors::StorageError> {
        let conn = connection::pg_connection_write(self).await?;
        history
            .insert(&conn)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn find_payment_intent_adjustment_history(
        &self,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> CustomResult<Option<PaymentIntentAdjustmentHistory>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        PaymentIntentAdjustmentHistory::find_optional_by_payment_intent_id_idempotency_key(
            &conn,
            payment_intent_id,
            idempotency_key,
        )
        .await
        .map_err(|error| report!(errors::StorageError::from(error)))
    }

    fn find_payment_intents_that_require_capture_before_cutoff(
        &self,
        cutoff: PrimitiveDateTime,
        batch_size: i64,
    ) -> BoxStream<'_, CustomResult<PaymentIntent, errors::StorageError>> {
        struct PageCursor {
            after_id: Option<Uuid>,
            buffered: VecDeque<PaymentIntent>,
            exhausted: bool,
        }

        futures::stream::try_unfold(
            PageCursor {
                after_id: None,
                buffered: VecDeque::new(),
                exhausted: false,
            },
            move |mut cursor| async move {
                loop {
                    if let Some(intent) = cursor.buffered.pop_front() {
                        cursor.after_id = Some(intent.id);
                        return Ok(Some((intent, cursor)));
                    }
                    if cursor.exhausted {
                        return Ok(None);
                    }
                    let conn = connection::pg_connection_read(self).await?;
                    let page = PaymentIntent::find_requiring_capture_before(
                        &conn,
                        cutoff,
                        cursor.after_id,
                        batch_size,
                    )
                    .await
                    .map_err(|error| report!(errors::StorageError::from(error)))?;
                    if (page.len() as i64) < batch_size {
                        cursor.exhausted = true;
                    }
                    cursor.buffered = page.into();
                }
            },
        )
        .boxed()
    }
}
