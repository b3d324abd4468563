use async_bb8_diesel::{AsyncConnection, AsyncRunQueryDsl};
use async_trait::async_trait;
use error_stack::report;
use storage_models::{errors::DatabaseError, schema};
use uuid::Uuid;

use crate::{
    connection,
    core::errors::{self, CustomResult},
    services::Store,
    types::storage::{
        CartPayment, CartPaymentNew, CartPaymentUpdate, LegacyConsumerCharge,
        LegacyConsumerChargeNew, LegacyStripeCharge, LegacyStripeChargeNew, PaymentIntent,
        PaymentIntentNew, PgpPaymentIntent, PgpPaymentIntentNew,
    },
};

/// Row set persisted atomically when a brand-new cart payment is accepted.
/// The serial legacy charge id is assigned inside the transaction and
/// stamped onto the intent and stripe-charge rows before their inserts.
#[derive(Clone, Debug)]
pub struct CartPaymentBundleNew {
    pub cart_payment: CartPaymentNew,
    pub payment_intent: PaymentIntentNew,
    pub pgp_payment_intent: PgpPaymentIntentNew,
    pub legacy_consumer_charge: LegacyConsumerChargeNew,
    pub legacy_stripe_charge: LegacyStripeChargeNew,
}

#[derive(Clone, Debug)]
pub struct CartPaymentBundle {
    pub cart_payment: CartPayment,
    pub payment_intent: PaymentIntent,
    pub pgp_payment_intent: PgpPaymentIntent,
    pub legacy_consumer_charge: LegacyConsumerCharge,
    pub legacy_stripe_charge: LegacyStripeCharge,
}

#[async_trait]
pub trait CartPaymentInterface {
    async fn insert_cart_payment_with_intents(
        &self,
        bundle: CartPaymentBundleNew,
    ) -> CustomResult<CartPaymentBundle, errors::StorageError>;

    async fn find_cart_payment_by_id(
        &self,
        cart_payment_id: Uuid,
    ) -> CustomResult<Option<CartPayment>, errors::StorageError>;

    async fn update_cart_payment(
        &self,
        this: CartPayment,
        cart_payment: CartPaymentUpdate,
    ) -> CustomResult<CartPayment, errors::StorageError>;
}

#[async_trait]
impl CartPaymentInterface for Store {
    #[tracing::instrument(skip_all)]
    async fn insert_cart_payment_with_intents(
        &self,
        bundle: CartPaymentBundleNew,
    ) -> CustomResult<CartPaymentBundle, errors::StorageError> {
        let conn = connection::pg_connection_write(self).await?;
        conn.transaction_async(|conn| async move {
            let cart_payment: CartPayment =
                diesel::insert_into(schema::cart_payments::table)
                    .values(bundle.cart_payment)
                    .get_result_async(&conn)
                    .await?;

            let legacy_consumer_charge: LegacyConsumerCharge =
                diesel::insert_into(schema::legacy_consumer_charges::table)
                    .values(bundle.legacy_consumer_charge)
                    .get_result_async(&conn)
                    .await?;

            let mut payment_intent_new = bundle.payment_intent;
            payment_intent_new.legacy_consumer_charge_id = legacy_consumer_charge.id;
            let payment_intent: PaymentIntent =
                diesel::insert_into(schema::payment_intents::table)
                    .values(payment_intent_new)
                    .get_result_async(&conn)
                    .await?;

            let pgp_payment_intent: PgpPaymentIntent =
                diesel::insert_into(schema::pgp_payment_intents::table)
                    .values(bundle.pgp_payment_intent)
                    .get_result_async(&conn)
                    .await?;

            let mut stripe_charge_new = bundle.legacy_stripe_charge;
            stripe_charge_new.charge_id = legacy_consumer_charge.id;
            let legacy_stripe_charge: LegacyStripeCharge =
                diesel::insert_into(schema::legacy_stripe_charges::table)
                    .values(stripe_charge_new)
                    .get_result_async(&conn)
                    .await?;

            Ok::<_, diesel::result::Error>(CartPaymentBundle {
                cart_payment,
                payment_intent,
                pgp_payment_intent,
                legacy_consumer_charge,
                legacy_stripe_charge,
            })
        })
        .await
        .map_err(|error| {
            report!(errors::StorageError::from(report!(DatabaseError::from(
                error
            ))))
        })
    }

    #[tracing::instrument(skip_all)]
    async fn find_cart_payment_by_id(
        &self,
        cart_payment_id: Uuid,
    ) -> CustomResult<Option<CartPayment>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        CartPayment::find_optional_by_id(&conn, cart_payment_id)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn update_cart_payment(
        &self,
        this: CartPayment,
        cart_payment: CartPaymentUpdate,
    ) -> CustomResult<CartPayment, errors::StorageError> {
        let conn = connection::pg_connection_write(self).await?;
        this.update(&conn, cart_payment)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }
}
