use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::{
    enums::{Currency, PgpCode, RefundStatus},
    schema::{pgp_refunds, refunds},
    types::MinorUnit,
};

#[derive(
    Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = refunds, primary_key(id), check_for_backend(diesel::pg::Pg))]
pub struct Refund {
    pub id: Uuid,
    pub payment_intent_id: Uuid,
    pub idempotency_key: String,
    pub status: RefundStatus,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub reason: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Eq, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = refunds)]
pub struct RefundNew {
    pub id: Uuid,
    pub payment_intent_id: Uuid,
    pub idempotency_key: String,
    pub status: RefundStatus,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub reason: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub enum RefundUpdate {
    StatusUpdate {
        status: RefundStatus,
        updated_at: PrimitiveDateTime,
    },
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name = refunds)]
pub struct RefundUpdateInternal {
    pub status: Option<RefundStatus>,
    pub updated_at: Option<PrimitiveDateTime>,
}

impl From<RefundUpdate> for RefundUpdateInternal {
    fn from(update: RefundUpdate) -> Self {
        match update {
            RefundUpdate::StatusUpdate { status, updated_at } => Self {
                status: Some(status),
                updated_at: Some(updated_at),
            },
        }
    }
}

#[derive(
    Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = pgp_refunds, primary_key(id), check_for_backend(diesel::pg::Pg))]
pub struct PgpRefund {
    pub id: Uuid,
    pub refund_id: Uuid,
    pub idempotency_key: String,
    pub status: RefundStatus,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub pgp_code: PgpCode,
    pub resource_id: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Eq, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = pgp_refunds)]
pub struct PgpRefundNew {
    pub id: Uuid,
    pub refund_id: Uuid,
    pub idempotency_key: String,
    pub status: RefundStatus,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub pgp_code: PgpCode,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub enum PgpRefundUpdate {
    /// Outcome of the provider refund call.
    ProviderOutcomeUpdate {
        status: RefundStatus,
        resource_id: Option<String>,
        updated_at: PrimitiveDateTime,
    },
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name = pgp_refunds)]
pub struct PgpRefundUpdateInternal {
    pub status: Option<RefundStatus>,
    pub resource_id: Option<String>,
    pub updated_at: Option<PrimitiveDateTime>,
}

impl From<PgpRefundUpdate> for PgpRefundUpdateInternal {
    fn from(update: PgpRefundUpdate) -> Self {
        match update {
            PgpRefundUpdate::ProviderOutcomeUpdate {
                status,
                resource_id,
                updated_at,
            } => Self {
                status: Some(status),
                resource_id,
                updated_at: Some(updated_at),
            },
        }
    }
}
