use diesel::{AsChangeset, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::{
    enums::{CountryCode, Currency},
    schema::cart_payments,
    types::MinorUnit,
};

#[derive(
    Clone, Debug, Eq, PartialEq, Identifiable, Queryable, Selectable, Serialize, Deserialize,
)]
#[diesel(table_name = cart_payments, primary_key(id), check_for_backend(diesel::pg::Pg))]
pub struct CartPayment {
    pub id: Uuid,
    pub payer_id: Option<Uuid>,
    pub payment_method_id: Uuid,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub country: CountryCode,
    pub delay_capture: bool,
    pub client_description: Option<String>,
    pub payer_statement_description: Option<String>,
    pub reference_id: String,
    pub reference_type: String,
    pub payout_account_id: Option<String>,
    pub application_fee_amount: Option<MinorUnit>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Clone, Debug, Eq, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = cart_payments)]
pub struct CartPaymentNew {
    pub id: Uuid,
    pub payer_id: Option<Uuid>,
    pub payment_method_id: Uuid,
    pub amount: MinorUnit,
    pub currency: Currency,
    pub country: CountryCode,
    pub delay_capture: bool,
    pub client_description: Option<String>,
    pub payer_statement_description: Option<String>,
    pub reference_id: String,
    pub reference_type: String,
    pub payout_account_id: Option<String>,
    pub application_fee_amount: Option<MinorUnit>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

#[derive(Clone, Debug)]
pub enum CartPaymentUpdate {
    /// Applied whenever an adjustment or cancellation changes the amount the
    /// client is on the hook for.
    AmountUpdate {
        amount: MinorUnit,
        client_description: Option<String>,
        updated_at: PrimitiveDateTime,
    },
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name = cart_payments)]
pub struct CartPaymentUpdateInternal {
    pub amount: Option<MinorUnit>,
    pub client_description: Option<String>,
    pub updated_at: Option<PrimitiveDateTime>,
}

impl From<CartPaymentUpdate> for CartPaymentUpdateInternal {
    fn from(update: CartPaymentUpdate) -> Self {
        match update {
            CartPaymentUpdate::AmountUpdate {
                amount,
                client_description,
                updated_at,
            } => Self {
                amount: Some(amount),
                client_description,
                updated_at: Some(updated_at),
            },
        }
    }
}
