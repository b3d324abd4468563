use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    enums::{Currency, StripeChargeStatus},
    schema::{legacy_consumer_charges, legacy_stripe_charges},
    types::MinorUnit,
};

/// Charge projection consumed by pre-migration API clients. `original_total`
/// is fixed at creation; later adjustments never touch it.
#[derive(
    Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = legacy_consumer_charges, primary_key(id), check_for_backend(diesel::pg::Pg))]
pub struct LegacyConsumerCharge {
    pub id: i32,
    pub consumer_id: i64,
    pub country_id: i32,
    pub original_total: MinorUnit,
    pub currency: Currency,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Eq, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = legacy_consumer_charges)]
pub struct LegacyConsumerChargeNew {
    pub consumer_id: i64,
    pub country_id: i32,
    pub original_total: MinorUnit,
    pub currency: Currency,
    pub created_at: PrimitiveDateTime,
}

#[derive(
    Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = legacy_stripe_charges, primary_key(id), check_for_backend(diesel::pg::Pg))]
pub struct LegacyStripeCharge {
    pub id: i32,
    pub charge_id: i32,
    pub idempotency_key: String,
    pub amount: MinorUnit,
    pub amount_refunded: MinorUnit,
    pub currency: Currency,
    pub status: StripeChargeStatus,
    pub stripe_id: Option<String>,
    pub description: Option<String>,
    pub error_reason: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
    pub refunded_at: Option<PrimitiveDateTime>,
}

#[derive(Clone, Debug, Eq, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = legacy_stripe_charges)]
pub struct LegacyStripeChargeNew {
    pub charge_id: i32,
    pub idempotency_key: String,
    pub amount: MinorUnit,
    pub amount_refunded: MinorUnit,
    pub currency: Currency,
    pub status: StripeChargeStatus,
    pub stripe_id: Option<String>,
    pub description: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub enum LegacyStripeChargeUpdate {
    /// Stamp the provider charge resource and status once submission
    /// succeeds.
    SubmissionUpdate {
        stripe_id: Option<String>,
        status: StripeChargeStatus,
        updated_at: PrimitiveDateTime,
    },
    /// In-place amount change mirroring an uncaptured adjustment.
    AmountUpdate {
        amount: MinorUnit,
        updated_at: PrimitiveDateTime,
    },
    /// Accumulated refund bookkeeping; `amount_refunded` is the new absolute
    /// total, not a delta.
    RefundUpdate {
        amount_refunded: MinorUnit,
        refunded_at: PrimitiveDateTime,
        updated_at: PrimitiveDateTime,
    },
    StatusUpdate {
        status: StripeChargeStatus,
        updated_at: PrimitiveDateTime,
    },
    FailureUpdate {
        error_reason: String,
        updated_at: PrimitiveDateTime,
    },
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name = legacy_stripe_charges)]
pub struct LegacyStripeChargeUpdateInternal {
    pub amount: Option<MinorUnit>,
    pub amount_refunded: Option<MinorUnit>,
    pub status: Option<StripeChargeStatus>,
    pub stripe_id: Option<String>,
    pub error_reason: Option<String>,
    pub refunded_at: Option<PrimitiveDateTime>,
    pub updated_at: Option<PrimitiveDateTime>,
}

impl From<LegacyStripeChargeUpdate> for LegacyStripeChargeUpdateInternal {
    fn from(update: LegacyStripeChargeUpdate) -> Self {
        match update {
            LegacyStripeChargeUpdate::SubmissionUpdate {
                stripe_id,
                status,
                updated_at,
            } => Self {
                stripe_id,
                status: Some(status),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            LegacyStripeChargeUpdate::AmountUpdate { amount, updated_at } => Self {
                amount: Some(amount),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            LegacyStripeChargeUpdate::RefundUpdate {
                amount_refunded,
                refunded_at,
                updated_at,
            } => Self {
                amount_refunded: Some(amount_refunded),
                refunded_at: Some(refunded_at),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            LegacyStripeChargeUpdate::StatusUpdate { status, updated_at } => Self {
                status: Some(status),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            LegacyStripeChargeUpdate::FailureUpdate {
                error_reason,
                updated_at,
            } => Self {
                status: Some(StripeChargeStatus::Failed),
                error_reason: Some(error_reason),
                updated_at: Some(updated_at),
                ..Default::default()
            },
        }
    }
}
