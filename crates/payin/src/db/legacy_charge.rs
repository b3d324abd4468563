use async_trait::async_trait;
use error_stack::report;

use crate::{
    connection,
    core::errors::{self, CustomResult},
    services::Store,
    types::storage::{
        LegacyConsumerCharge, LegacyStripeCharge, LegacyStripeChargeUpdate,
    },
};

#[async_trait]
pub trait LegacyChargeInterface {
    async fn find_legacy_consumer_charge_by_id(
        &self,
        charge_id: i32,
    ) -> CustomResult<Option<LegacyConsumerCharge>, errors::StorageError>;

    /// Probe for a stripe charge written by a prior attempt with the same
    /// idempotency key; a hit means that step already ran.
    async fn find_legacy_stripe_charge(
        &self,
        charge_id: i32,
        idempotency_key: &str,
    ) -> CustomResult<Option<LegacyStripeCharge>, errors::StorageError>;

    async fn find_legacy_stripe_charges_for_charge(
        &self,
        charge_id: i32,
    ) -> CustomResult<Vec<LegacyStripeCharge>, errors::StorageError>;

    async fn update_legacy_stripe_charge(
        &self,
        this: LegacyStripeCharge,
        stripe_charge: LegacyStripeChargeUpdate,
    ) -> CustomResult<LegacyStripeCharge, errors::StorageError>;
}

#[async_trait]
impl LegacyChargeInterface for Store {
    #[tracing::instrument(skip_all)]
    async fn find_legacy_consumer_charge_by_id(
        &self,
        charge_id: i32,
    ) -> CustomResult<Option<LegacyConsumerCharge>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        LegacyConsumerCharge::find_optional_by_id(&conn, charge_id)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn find_legacy_stripe_charge(
        &self,
        charge_id: i32,
        idempotency_key: &str,
    ) -> CustomResult<Option<LegacyStripeCharge>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        LegacyStripeCharge::find_optional_by_charge_id_idempotency_key(
            &conn,
            charge_id,
            idempotency_key,
        )
        .await
        .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn find_legacy_stripe_charges_for_charge(
        &self,
        charge_id: i32,
    ) -> CustomResult<Vec<LegacyStripeCharge>, errors::StorageError> {
        let conn = connection::pg_connection_read(self).await?;
        LegacyStripeCharge::find_by_charge_id(&conn, charge_id)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }

    #[tracing::instrument(skip_all)]
    async fn update_legacy_stripe_charge(
        &self,
        this: LegacyStripeCharge,
        stripe_charge: LegacyStripeChargeUpdate,
    ) -> CustomResult<LegacyStripeCharge, errors::StorageError> {
        let conn = connection::pg_connection_write(self).await?;
        this.update(&conn, stripe_charge)
            .await
            .map_err(|error| report!(errors::StorageError::from(error)))
    }
}
