use async_trait::async_trait;
use error_stack::report;
use uuid::Uuid;

use crate::{
    connection,
    core::errors::{self, CustomResult},
    services::Store,
    types::storage::{PgpPaymentIntent, PgpPaymentIntentUpdate},
};

#[async_trait]
pub trait PgpPaymentIntentInterface {
    async fn find_pgp_payment_intents(
        &self,
        payment_intent_id: Uuid,
    ) -> CustomResult<Vec<PgpPaymentIntent>, errors::StorageError>;

    async fn update_pgp_payment_intent(
        &self,
        this: PgpPaymentIntent,
        pgp_payment_intent: PgpPaymentIntentUpdate,
    ) -> CustomResult<PgpPaymentIntent, errors::StorageError>;
}

#[async_trait]
impl PgpPaymentIntentInterface for Store {
    #[tracing::instrument(skip_all)]
    async fn find_pgp_payment_intents(
        &self,
        payment_intent_id: Uuid,
    ) -> CustomResult<Vec<PgpPaymentIntent>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        PgpPaymentIntent::find_by_payment_intent_id(&conn, payment_intent_id)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn update_pgp_payment_intent(
        &self,
        this: PgpPaymentIntent,
        pgp_payment_intent: PgpPaymentIntentUpdate,
    ) -> CustomResult<PgpPaymentIntent, errors::StorageError> {
        let conn = connection::pg_connection_write(self).await?;
        this.update(&conn, pgp_payment_intent)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }
}
