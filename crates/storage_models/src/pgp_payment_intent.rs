use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::{
    enums::{CaptureMethod, Currency, IntentStatus, PgpCode},
    schema::pgp_payment_intents,
    types::MinorUnit,
};

/// Provider-side mirror of a payment intent. `resource_id` stays null until
/// the provider create call succeeds; its absence is how a half-submitted
/// intent is recognized on replay.
#[derive(
    Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = pgp_payment_intents, primary_key(id), check_for_backend(diesel::pg::Pg))]
pub struct PgpPaymentIntent {
    pub id: Uuid,
    pub payment_intent_id: Uuid,
    pub idempotency_key: String,
    pub pgp_code: PgpCode,
    pub resource_id: Option<String>,
    pub charge_resource_id: Option<String>,
    pub payment_method_resource_id: String,
    pub customer_resource_id: Option<String>,
    pub amount: MinorUnit,
    pub amount_capturable: MinorUnit,
    pub amount_received: MinorUnit,
    pub application_fee_amount: Option<MinorUnit>,
    pub currency: Currency,
    pub capture_method: CaptureMethod,
    pub status: IntentStatus,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
    pub captured_at: Option<PrimitiveDateTime>,
    pub cancelled_at: Option<PrimitiveDateTime>,
}

#[derive(Clone, Debug, Eq, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = pgp_payment_intents)]
pub struct PgpPaymentIntentNew {
    pub id: Uuid,
    pub payment_intent_id: Uuid,
    pub idempotency_key: String,
    pub pgp_code: PgpCode,
    pub payment_method_resource_id: String,
    pub customer_resource_id: Option<String>,
    pub amount: MinorUnit,
    pub amount_capturable: MinorUnit,
    pub amount_received: MinorUnit,
    pub application_fee_amount: Option<MinorUnit>,
    pub currency: Currency,
    pub capture_method: CaptureMethod,
    pub status: IntentStatus,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub enum PgpPaymentIntentUpdate {
    /// Outcome of the provider create call: stamp resource ids and mirror
    /// the post-submission amounts.
    SubmissionUpdate {
        status: IntentStatus,
        resource_id: Option<String>,
        charge_resource_id: Option<String>,
        amount_capturable: MinorUnit,
        amount_received: MinorUnit,
        captured_at: Option<PrimitiveDateTime>,
        updated_at: PrimitiveDateTime,
    },
    /// In-place adjustment of an uncaptured intent. `amount` stays at the
    /// value the provider authorized; only the amount to be captured moves.
    CapturableAmountUpdate {
        amount_capturable: MinorUnit,
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
        error_code: Option<String>,
        error_message: Option<String>,
        updated_at: PrimitiveDateTime,
    },
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name = pgp_payment_intents)]
pub struct PgpPaymentIntentUpdateInternal {
    pub resource_id: Option<String>,
    pub charge_resource_id: Option<String>,
    pub amount: Option<MinorUnit>,
    pub amount_capturable: Option<MinorUnit>,
    pub amount_received: Option<MinorUnit>,
    pub status: Option<IntentStatus>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub captured_at: Option<PrimitiveDateTime>,
    pub cancelled_at: Option<PrimitiveDateTime>,
    pub updated_at: Option<PrimitiveDateTime>,
}

impl From<PgpPaymentIntentUpdate> for PgpPaymentIntentUpdateInternal {
    fn from(update: PgpPaymentIntentUpdate) -> Self {
        match update {
            PgpPaymentIntentUpdate::SubmissionUpdate {
                status,
                resource_id,
                charge_resource_id,
                amount_capturable,
                amount_received,
                captured_at,
                updated_at,
            } => Self {
                status: Some(status),
                resource_id,
                charge_resource_id,
                amount_capturable: Some(amount_capturable),
                amount_received: Some(amount_received),
                captured_at,
                updated_at: Some(updated_at),
                ..Default::default()
            },
            PgpPaymentIntentUpdate::CapturableAmountUpdate {
                amount_capturable,
                updated_at,
            } => Self {
                amount_capturable: Some(amount_capturable),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            PgpPaymentIntentUpdate::CaptureUpdate {
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
            PgpPaymentIntentUpdate::CancelUpdate {
                cancelled_at,
                updated_at,
            } => Self {
                status: Some(IntentStatus::Cancelled),
                amount_capturable: Some(MinorUnit::zero()),
                cancelled_at: Some(cancelled_at),
                updated_at: Some(updated_at),
                ..Default::default()
            },
            PgpPaymentIntentUpdate::FailedUpdate {
                error_code,
                error_message,
                updated_at,
            } => Self {
                status: Some(IntentStatus::Failed),
                error_code,
                error_message,
                updated_at: Some(updated_at),
                ..Default::default()
            },
        }
    }
}
