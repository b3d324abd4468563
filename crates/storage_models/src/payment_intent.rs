use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::{
    enums::{CaptureMethod, CountryCode, Currency, IntentStatus},
    schema::payment_intents,
    types::MinorUnit,
};

/// Domain-level record of a single authorize-capture cycle against the
/// provider. A cart payment accrues further intents whenever an adjustment
/// cannot be expressed on the live one.
#[derive(
    Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = payment_intents, primary_key(id), check_for_backend(diesel::pg::Pg))]
pub struct PaymentIntent {
    pub id: Uuid,
    pub cart_payment_id: Uuid,
    pub idempotency_key: String,
    pub amount: MinorUnit,
    pub amount_capturable: MinorUnit,
    pub amount_received: MinorUnit,
    pub application_fee_amount: Option<MinorUnit>,
    pub currency: Currency,
    pub country: CountryCode,
    pub capture_method: CaptureMethod,
    pub status: IntentStatus,
    pub statement_descriptor: Option<String>,
    pub legacy_consumer_charge_id: i32,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
    pub captured_at: Option<PrimitiveDateTime>,
    pub cancelled_at: Option<PrimitiveDateTime>,
    pub capture_after: Option<PrimitiveDateTime>,
}

#[derive(Clone, Debug, Eq, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = payment_intents)]
pub struct PaymentIntentNew {
    pub id: Uuid,
    pub cart_payment_id: Uuid,
    pub idempotency_key: String,
    pub amount: MinorUnit,
    pub amount_capturable: MinorUnit,
    pub amount_received: MinorUnit,
    pub application_fee_amount: Option<MinorUnit>,
    pub currency: Currency,
    pub country: CountryCode,
    pub capture_method: CaptureMethod,
    pub status: IntentStatus,
    pub statement_descriptor: Option<String>,
    pub legacy_consumer_charge_id: i32,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
    pub capture_after: Option<PrimitiveDateTime>,
}

#[derive(Clone, Debug)]
pub enum PaymentIntentUpdate {
    /// Outcome of the provider create call.
    SubmissionUpdate {
        status: IntentStatus,
        amount_capturable: MinorUnit,
        amount_received: MinorUnit,
        captured_at: Option<PrimitiveDateTime>,
        updated_at: PrimitiveDateTime,
    },
    /// In-place amount change while the intent is still capturable.
    AmountUpdate {
        amount: MinorUnit,
        amount_capturable: MinorUnit,
        updated_at: PrimitiveDateTime,
    },
    /// Domain remaining amount after a refund settles; the received amount
    /// keeps its historical value.
    AmountAfterRefundUpdate {
        amount: MinorUnit,
        updated_at: PrimitiveDateTime,
    },
    CaptureUpdate {
        amount_received: MinorUnit,
        captured_at: PrimitiveDateTime,
        updated_at: PrimitiveDateTime,
    },
    CancelUpdate {
        cancelled_at: PrimitiveDateTime,
        updated_at: PrimitiveDateTime,
    },
    FailedUpdate {
        updated_at: PrimitiveDateTime,
    },
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name = payment_intents)]
pub struct PaymentIntentUpdateInternal {
    pub amount: Option<MinorUnit>,
    pub amount_capturable: Option<MinorUnit>,
    pub amount_received: Option<MinorUnit>,
    pub status: Option<IntentStatus>,
    pub captured_at: Option<PrimitiveDateTime>,
    pub cancelled_at: Option<PrimitiveDateTime>,
    pub updated_at: Option<PrimitiveDateTime>,
}

impl From<PaymentIntentUpdate> for PaymentIntentUpdateInternal {
    fn from(update: PaymentIntentUpdate) -> Self {
        match update {
            PaymentIntentUpdate::SubmissionUpdate {
                status,
                amount_capturable,
                amount_received,
                captured_at,
                updated_at,
            } => Self {
                status: Some(status),
                amount_capturable: Some(amount_capturable),
                amount_received: Some(amount_received),
                captured_at,
                updated_at: Some(updated_at),
                ..Default::default()
            },
            PaymentIntentUpdate::AmountUpdate {
                amount,
                amount_capturable,
                updated_at,
            } => Self {
                amount: Some(amount),
                amount_capturable: Some(amount_capturable),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            PaymentIntentUpdate::AmountAfterRefundUpdate { amount, updated_at } => Self {
                amount: Some(amount),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            PaymentIntentUpdate::CaptureUpdate {
                amount_received,
                captured_at,
                updated_at,
            } => Self {
                status: Some(IntentStatus::Succeeded),
                amount_capturable: Some(MinorUnit::zero()),
                amount_received: Some(amount_received),
                captured_at: Some(captured_at),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            PaymentIntentUpdate::CancelUpdate {
                cancelled_at,
                updated_at,
            } => Self {
                status: Some(IntentStatus::Cancelled),
                amount_capturable: Some(MinorUnit::zero()),
                cancelled_at: Some(cancelled_at),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            PaymentIntentUpdate::FailedUpdate { updated_at } => Self {
                status: Some(IntentStatus::Failed),
                updated_at: Some(updated_at),
                ..Default::default()
            },
        }
    }
}
