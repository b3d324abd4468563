use masking::Secret;
use serde::{Deserialize, Serialize};
use storage_models::{enums::CountryCode, types::MinorUnit};
use uuid::Uuid;

/// Identifiers tying a cart payment back to the client-side entity being
/// paid for.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CorrelationIds {
    pub reference_id: String,
    pub reference_type: String,
}

/// Optional split of a charge towards a connected payout account.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SplitPayment {
    pub payout_account_id: String,
    pub application_fee_amount: MinorUnit,
}

/// Inbound request to charge a payment method for a cart of goods.
///
/// `payer_id` is absent only on the legacy surface, where clients carry
/// their own provider handles instead.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CartPaymentRequest {
    pub payer_id: Option<Uuid>,
    pub payment_method_id: Uuid,
    pub amount: MinorUnit,
    /// Authorize now and capture later when set; falls back to the
    /// configured default when absent.
    pub delay_capture: Option<bool>,
    pub client_description: Option<String>,
    pub payer_statement_description: Option<String>,
    pub correlation_ids: CorrelationIds,
    pub split_payment: Option<SplitPayment>,
    pub metadata: Option<serde_json::Value>,
}

/// Provider-side handles carried by pre-migration clients that manage their
/// own payer records.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LegacyPayment {
    pub dd_consumer_id: i64,
    pub dd_country_id: i32,
    pub stripe_customer_id: Secret<String>,
    pub stripe_card_id: Secret<String>,
    pub dd_additional_payment_info: Option<serde_json::Value>,
}

/// Tokenized provider handle for a payer, as resolved by the payer service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPayer {
    pub payer_id: Uuid,
    pub country: CountryCode,
    pub pgp_customer_resource_id: Secret<String>,
    /// Consumer row the legacy charge projection is keyed on.
    pub legacy_consumer_id: i64,
}

/// Tokenized provider handle for a stored payment method.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPaymentMethod {
    pub payment_method_id: Uuid,
    pub payer_id: Uuid,
    pub pgp_resource_id: Secret<String>,
}

