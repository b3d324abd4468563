use async_bb8_diesel::AsyncRunQueryDsl;
use diesel::{ExpressionMethods, QueryDsl};
use error_stack::report;
use uuid::Uuid;

use crate::{
    adjustment_history::{PaymentIntentAdjustmentHistory, PaymentIntentAdjustmentHistoryNew},
    errors::DatabaseError,
    schema::payment_intent_adjustment_history::dsl,
    PgPooledConn, StorageResult,
};

impl PaymentIntentAdjustmentHistoryNew {
    pub async fn insert(
        self,
        conn: &PgPooledConn,
    ) -> StorageResult<PaymentIntentAdjustmentHistory> {
        diesel::insert_into(dsl::payment_intent_adjustment_history)
            .values(self)
            .get_result_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }
}

impl PaymentIntentAdjustmentHistory {
    pub async fn find_optional_by_payment_intent_id_idempotency_key(
        conn: &PgPooledConn,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> StorageResult<Option<Self>> {
        match dsl::payment_intent_adjustment_history
            .filter(dsl::payment_intent_id.eq(payment_intent_id))
            .filter(dsl::idempotency_key.eq(idempotency_key.to_owned()))
            .get_result_async(conn)
            .await
        {
            Ok(history) => Ok(Some(history)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(error) => Err(report!(DatabaseError::from(error))),
        }
    }
}
