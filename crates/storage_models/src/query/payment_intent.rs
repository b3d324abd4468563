use async_bb8_diesel::AsyncRunQueryDsl;
use diesel::{ExpressionMethods, QueryDsl};
use error_stack::report;
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::{
    enums::IntentStatus,
    errors::DatabaseError,
    payment_intent::{
        PaymentIntent, PaymentIntentNew, PaymentIntentUpdate, PaymentIntentUpdateInternal,
    },
    schema::payment_intents::dsl,
    PgPooledConn, StorageResult,
};

impl PaymentIntentNew {
    pub async fn insert(self, conn: &PgPooledConn) -> StorageResult<PaymentIntent> {
        diesel::insert_into(dsl::payment_intents)
            .values(self)
            .get_result_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }
}

impl PaymentIntent {
    pub async fn find_by_id(conn: &PgPooledConn, id: Uuid) -> StorageResult<Self> {
        dsl::payment_intents
            .filter(dsl::id.eq(id))
            .get_result_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }

    /// All intents under a cart payment, oldest first.
    pub async fn find_by_cart_payment_id(
        conn: &PgPooledConn,
        cart_payment_id: Uuid,
    ) -> StorageResult<Vec<Self>> {
        dsl::payment_intents
            .filter(dsl::cart_payment_id.eq(cart_payment_id))
            .order(dsl::created_at.asc())
            .get_results_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }

    pub async fn find_optional_by_idempotency_key(
        conn: &PgPooledConn,
        idempotency_key: &str,
    ) -> StorageResult<Option<Self>> {
        match dsl::payment_intents
            .filter(dsl::idempotency_key.eq(idempotency_key.to_owned()))
            .get_result_async(conn)
            .await
        {
            Ok(payment_intent) => Ok(Some(payment_intent)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(error) => Err(report!(DatabaseError::from(error))),
        }
    }

    /// Most recent intent created against the given legacy consumer charge.
    pub async fn find_optional_by_legacy_consumer_charge_id(
        conn: &PgPooledConn,
        legacy_consumer_charge_id: i32,
    ) -> StorageResult<Option<Self>> {
        match dsl::payment_intents
            .filter(dsl::legacy_consumer_charge_id.eq(legacy_consumer_charge_id))
            .order(dsl::created_at.desc())
            .limit(1)
            .get_results_async::<Self>(conn)
            .await
        {
            Ok(payment_intents) => Ok(payment_intents.into_iter().next()),
            Err(error) => Err(report!(DatabaseError::from(error))),
        }
    }

    /// One page of intents that are due for deferred capture. Keyset
    /// pagination on `id`; callers thread the last id of the previous page.
    pub async fn find_requiring_capture_before(
        conn: &PgPooledConn,
        cutoff: PrimitiveDateTime,
        after_id: Option<Uuid>,
        limit: i64,
    ) -> StorageResult<Vec<Self>> {
        let mut query = dsl::payment_intents
            .filter(dsl::status.eq(IntentStatus::RequiresCapture))
            .filter(dsl::capture_after.le(cutoff))
            .order(dsl::id.asc())
            .limit(limit)
            .into_boxed();
        if let Some(after_id) = after_id {
            query = query.filter(dsl::id.gt(after_id));
        }
        query
            .get_results_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }

    pub async fn update(
        self,
        conn: &PgPooledConn,
        payment_intent: PaymentIntentUpdate,
    ) -> StorageResult<Self> {
        match diesel::update(dsl::payment_intents.filter(dsl::id.eq(self.id)))
            .set(PaymentIntentUpdateInternal::from(payment_intent))
            .get_result_async(conn)
            .await
        {
            Err(diesel::result::Error::QueryBuilderError(_)) => Ok(self),
            Err(error) => Err(report!(DatabaseError::from(error))),
            Ok(payment_intent) => Ok(payment_intent),
        }
    }
}
