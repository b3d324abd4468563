use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::{enums::Currency, schema::payment_intent_adjustment_history, types::MinorUnit};

/// Append-only audit row for every amount change applied to a payment
/// intent in place. Never updated or deleted.
#[derive(
    Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(
    table_name = payment_intent_adjustment_history,
    primary_key(id),
    check_for_backend(diesel::pg::Pg)
)]
pub struct PaymentIntentAdjustmentHistory {
    pub id: Uuid,
    pub payment_intent_id: Uuid,
    pub idempotency_key: String,
    pub amount_original: MinorUnit,
    pub amount_delta: MinorUnit,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Eq, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = payment_intent_adjustment_history)]
pub struct PaymentIntentAdjustmentHistoryNew {
    pub id: Uuid,
    pub payment_intent_id: Uuid,
    pub idempotency_key: String,
    pub amount_original: MinorUnit,
    pub amount_delta: MinorUnit,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub created_at: PrimitiveDateTime,
}
