use async_bb8_diesel::AsyncRunQueryDsl;
use diesel::{ExpressionMethods, QueryDsl};
use error_stack::report;
use uuid::Uuid;

use crate::{
    errors::DatabaseError,
    refund::{
        PgpRefund, PgpRefundNew, PgpRefundUpdate, PgpRefundUpdateInternal, Refund, RefundNew,
        RefundUpdate, RefundUpdateInternal,
    },
    schema::{pgp_refunds, refunds},
    PgPooledConn, StorageResult,
};

impl RefundNew {
    pub async fn insert(self, conn: &PgPooledConn) -> StorageResult<Refund> {
        diesel::insert_into(refunds::dsl::refunds)
            .values(self)
            .get_result_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }
}

impl Refund {
    pub async fn find_optional_by_payment_intent_id_idempotency_key(
        conn: &PgPooledConn,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> StorageResult<Option<Self>> {
        match refunds::dsl::refunds
            .filter(refunds::dsl::payment_intent_id.eq(payment_intent_id))
            .filter(refunds::dsl::idempotency_key.eq(idempotency_key.to_owned()))
            .get_result_async(conn)
            .await
        {
            Ok(refund) => Ok(Some(refund)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(error) => Err(report!(DatabaseError::from(error))),
        }
    }

    pub async fn update(self, conn: &PgPooledConn, refund: RefundUpdate) -> StorageResult<Self> {
        match diesel::update(refunds::dsl::refunds.filter(refunds::dsl::id.eq(self.id)))
            .set(RefundUpdateInternal::from(refund))
            .get_result_async(conn)
            .await
        {
            Err(diesel::result::Error::QueryBuilderError(_)) => Ok(self),
            Err(error) => Err(report!(DatabaseError::from(error))),
            Ok(refund) => Ok(refund),
        }
    }
}

impl PgpRefundNew {
    pub async fn insert(self, conn: &PgPooledConn) -> StorageResult<PgpRefund> {
        diesel::insert_into(pgp_refunds::dsl::pgp_refunds)
            .values(self)
            .get_result_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }
}

impl PgpRefund {
    pub async fn find_optional_by_refund_id(
        conn: &PgPooledConn,
        refund_id: Uuid,
    ) -> StorageResult<Option<Self>> {
        match pgp_refunds::dsl::pgp_refunds
            .filter(pgp_refunds::dsl::refund_id.eq(refund_id))
            .get_result_async(conn)
            .await
        {
            Ok(pgp_refund) => Ok(Some(pgp_refund)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(error) => Err(report!(DatabaseError::from(error))),
        }
    }

    pub async fn update(
        self,
        conn: &PgPooledConn,
        pgp_refund: PgpRefundUpdate,
    ) -> StorageResult<Self> {
        match diesel::update(pgp_refunds::dsl::pgp_refunds.filter(pgp_refunds::dsl::id.eq(self.id)))
            .set(PgpRefundUpdateInternal::from(pgp_refund))
            .get_result_async(conn)
            .await
        {
            Err(diesel::result::Error::QueryBuilderError(_)) => Ok(self),
            Err(error) => Err(report!(DatabaseError::from(error))),
            Ok(pgp_refund) => Ok(pgp_refund),
        }
    }
}
