use async_bb8_diesel::{AsyncConnection, AsyncRunQueryDsl};
use async_trait::async_trait;
use diesel::{ExpressionMethods, QueryDsl};
use error_stack::report;
use storage_models::{
    errors::DatabaseError,
    refund::{PgpRefundUpdateInternal, RefundUpdateInternal},
    schema,
};
use uuid::Uuid;

use crate::{
    connection,
    core::errors::{self, CustomResult},
    services::Store,
    types::storage::{PgpRefund, PgpRefundNew, PgpRefundUpdate, Refund, RefundNew, RefundUpdate},
};

#[async_trait]
pub trait RefundInterface {
    /// Refund bookkeeping rows are created together, in `processing` state,
    /// before the provider is contacted.
    async fn insert_refund_with_mirror(
        &self,
        refund: RefundNew,
        pgp_refund: PgpRefundNew,
    ) -> CustomResult<(Refund, PgpRefund), errors::StorageError>;

    async fn find_refund_by_idempotency_key(
        &self,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> CustomResult<Option<Refund>, errors::StorageError>;

    async fn find_pgp_refund_by_refund_id(
        &self,
        refund_id: Uuid,
    ) -> CustomResult<Option<PgpRefund>, errors::StorageError>;

    async fn update_refund_with_mirror(
        &self,
        this: Refund,
        refund: RefundUpdate,
        pgp_this: PgpRefund,
        pgp_refund: PgpRefundUpdate,
    ) -> CustomResult<(Refund, PgpRefund), errors::StorageError>;
}

#[async_trait]
impl RefundInterface for Store {
    #[tracing::instrument(skip_all)]
    async fn insert_refund_with_mirror(
        &self,
        refund: RefundNew,
        pgp_refund: PgpRefundNew,
    ) -> CustomResult<(Refund, PgpRefund), errors::StorageError> {
        let conn = connection::pg_connection_write(self).await?;
        conn.transaction_async(|conn| async move {
            let refund: Refund = diesel::insert_into(schema::refunds::table)
                .values(refund)
                .get_result_async(&conn)
                .await?;
            let pgp_refund: PgpRefund = diesel::insert_into(schema::pgp_refunds::table)
                .values(pgp_refund)
                .get_result_async(&conn)
                .await?;
            Ok::<_, diesel::result::Error>((refund, pgp_refund))
        })
        .await
        .map_err(|error| {
            report!(errors::StorageError::from(report!(DatabaseError::from(
                error
            ))))
        })
    }

    #[tracing::instrument(skip_all)]
    async fn find_refund_by_idempotency_key(
        &self,
        payment_intent_id: Uuid,
        idempotency_key: &str,
    ) -> CustomResult<Option<Refund>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        Refund::find_optional_by_payment_intent_id_idempotency_key(
            &conn,
            payment_intent_id,
            idempotency_key,
        )
        .await
        .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn find_pgp_refund_by_refund_id(
        &self,
        refund_id: Uuid,
    ) -> CustomResult<Option<PgpRefund>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        PgpRefund::find_optional_by_refund_id(&conn, refund_id)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn update_refund_with_mirror(
        &self,
        this: Refund,
        refund: RefundUpdate,
        pgp_this: PgpRefund,
        pgp_refund: PgpRefundUpdate,
    ) -> CustomResult<(Refund, PgpRefund), errors::StorageError> {
        let conn = connection::pg_connection_write(self).await?;
        conn.transaction_async(|conn| async move {
            let refund: Refund =
                diesel::update(schema::refunds::table.filter(schema::refunds::dsl::id.eq(this.id)))
                    .set(RefundUpdateInternal::from(refund))
                    .get_result_async(&conn)
                    .await?;
            let pgp_refund: PgpRefund = diesel::update(
                schema::pgp_refunds::table.filter(schema::pgp_refunds::dsl::id.eq(pgp_this.id)),
            )
            .set(PgpRefundUpdateInternal::from(pgp_refund))
            .get_result_async(&conn)
            .await?;
            Ok::<_, diesel::result::Error>((refund, pgp_refund))
        })
        .await
        .map_err(|error| {
            report!(errors::StorageError::from(report!(DatabaseError::from(
                error
            ))))
        })
    }
}
