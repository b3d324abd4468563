use async_bb8_diesel::AsyncRunQueryDsl;
use diesel::{ExpressionMethods, QueryDsl};
use error_stack::report;
use uuid::Uuid;

use crate::{
    cart_payment::{CartPayment, CartPaymentNew, CartPaymentUpdate, CartPaymentUpdateInternal},
    errors::DatabaseError,
    schema::cart_payments::dsl,
    PgPooledConn, StorageResult,
};

impl CartPaymentNew {
    pub async fn insert(self, conn: &PgPooledConn) -> StorageResult<CartPayment> {
        diesel::insert_into(dsl::cart_payments)
            .values(self)
            .get_result_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }
}

impl CartPayment {
    pub async fn find_optional_by_id(
        conn: &PgPooledConn,
        id: Uuid,
    ) -> StorageResult<Option<Self>> {
        match dsl::cart_payments
            .filter(dsl::id.eq(id))
            .get_result_async(conn)
            .await
        {
            Ok(cart_payment) => Ok(Some(cart_payment)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(error) => Err(report!(DatabaseError::from(error))),
        }
    }

    pub async fn update(
        self,
        conn: &PgPooledConn,
        cart_payment: CartPaymentUpdate,
    ) -> StorageResult<Self> {
        match diesel::update(dsl::cart_payments.filter(dsl::id.eq(self.id)))
            .set(CartPaymentUpdateInternal::from(cart_payment))
            .get_result_async(conn)
            .await
        {
            // All fields were `None`: nothing to persist, hand back the row.
            Err(diesel::result::Error::QueryBuilderError(_)) => Ok(self),
            Err(error) => Err(report!(DatabaseError::from(error))),
            Ok(cart_payment) => Ok(cart_payment),
        }
    }
}
