use async_bb8_diesel::AsyncRunQueryDsl;
use diesel::{ExpressionMethods, QueryDsl};
use error_stack::report;
use uuid::Uuid;

use crate::{
    errors::DatabaseError,
    pgp_payment_intent::{
        PgpPaymentIntent, PgpPaymentIntentNew, PgpPaymentIntentUpdate,
        PgpPaymentIntentUpdateInternal,
    },
    schema::pgp_payment_intents::dsl,
    PgPooledConn, StorageResult,
};

impl PgpPaymentIntentNew {
    pub async fn insert(self, conn: &PgPooledConn) -> StorageResult<PgpPaymentIntent> {
        diesel::insert_into(dsl::pgp_payment_intents)
            .values(self)
            .get_result_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }
}

impl PgpPaymentIntent {
    pub async fn find_by_payment_intent_id(
        conn: &PgPooledConn,
        payment_intent_id: Uuid,
    ) -> StorageResult<Vec<Self>> {
        dsl::pgp_payment_intents
            .filter(dsl::payment_intent_id.eq(payment_intent_id))
            .order(dsl::created_at.asc())
            .get_results_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }

    pub async fn update(
        self,
        conn: &PgPooledConn,
        pgp_payment_intent: PgpPaymentIntentUpdate,
    ) -> StorageResult<Self> {
        match diesel::update(dsl::pgp_payment_intents.filter(dsl::id.eq(self.id)))
            .set(PgpPaymentIntentUpdateInternal::from(pgp_payment_intent))
            .get_result_async(conn)
            .await
        {
            Err(diesel::result::Error::QueryBuilderError(_)) => Ok(self),
            Err(error) => Err(report!(DatabaseError::from(error))),
            Ok(pgp_payment_intent) => Ok(pgp_payment_intent),
        }
    }
}
