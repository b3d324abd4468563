use async_bb8_diesel::AsyncRunQueryDsl;
use diesel::{ExpressionMethods, QueryDsl};
use error_stack::report;

use crate::{
    errors::DatabaseError,
    legacy_charge::{
        LegacyConsumerCharge, LegacyConsumerChargeNew, LegacyStripeCharge, LegacyStripeChargeNew,
        LegacyStripeChargeUpdate, LegacyStripeChargeUpdateInternal,
    },
    schema::{legacy_consumer_charges, legacy_stripe_charges},
    PgPooledConn, StorageResult,
};

impl LegacyConsumerChargeNew {
    pub async fn insert(self, conn: &PgPooledConn) -> StorageResult<LegacyConsumerCharge> {
        diesel::insert_into(legacy_consumer_charges::dsl::legacy_consumer_charges)
            .values(self)
            .get_result_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }
}

impl LegacyConsumerCharge {
    pub async fn find_optional_by_id(
        conn: &PgPooledConn,
        id: i32,
    ) -> StorageResult<Option<Self>> {
        match legacy_consumer_charges::dsl::legacy_consumer_charges
            .filter(legacy_consumer_charges::dsl::id.eq(id))
            .get_result_async(conn)
            .await
        {
            Ok(charge) => Ok(Some(charge)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(error) => Err(report!(DatabaseError::from(error))),
        }
    }
}

impl LegacyStripeChargeNew {
    pub async fn insert(self, conn: &PgPooledConn) -> StorageResult<LegacyStripeCharge> {
        diesel::insert_into(legacy_stripe_charges::dsl::legacy_stripe_charges)
            .values(self)
            .get_result_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }
}

impl LegacyStripeCharge {
    pub async fn find_optional_by_charge_id_idempotency_key(
        conn: &PgPooledConn,
        charge_id: i32,
        idempotency_key: &str,
    ) -> StorageResult<Option<Self>> {
        match legacy_stripe_charges::dsl::legacy_stripe_charges
            .filter(legacy_stripe_charges::dsl::charge_id.eq(charge_id))
            .filter(legacy_stripe_charges::dsl::idempotency_key.eq(idempotency_key.to_owned()))
            .get_result_async(conn)
            .await
        {
            Ok(stripe_charge) => Ok(Some(stripe_charge)),
            Err(diesel::result::Error::NotFound) => Ok(None),
            Err(error) => Err(report!(DatabaseError::from(error))),
        }
    }

    pub async fn find_by_charge_id(
        conn: &PgPooledConn,
        charge_id: i32,
    ) -> StorageResult<Vec<Self>> {
        legacy_stripe_charges::dsl::legacy_stripe_charges
            .filter(legacy_stripe_charges::dsl::charge_id.eq(charge_id))
            .order(legacy_stripe_charges::dsl::created_at.asc())
            .get_results_async(conn)
            .await
            .map_err(|error| report!(DatabaseError::from(error)))
    }

    pub async fn update(
        self,
        conn: &PgPooledConn,
        stripe_charge: LegacyStripeChargeUpdate,
    ) -> StorageResult<Self> {
        match diesel::update(
            legacy_stripe_charges::dsl::legacy_stripe_charges
                .filter(legacy_stripe_charges::dsl::id.eq(self.id)),
        )
        .set(LegacyStripeChargeUpdateInternal::from(stripe_charge))
        .get_result_async(conn)
        .await
        {
            Err(diesel::result::Error::QueryBuilderError(_)) => Ok(self),
            Err(error) => Err(report!(DatabaseError::from(error))),
            Ok(stripe_charge) => Ok(stripe_charge),
        }
    }
}
