use diesel::{
    deserialize::FromSqlRow,
    expression::AsExpression,
    pg::{Pg, PgValue},
    sql_types,
};

/// Implements the diesel `Text` round trip for an enum that already has
/// `strum::Display` and `strum::EnumString` derives.
macro_rules! impl_db_text_enum {
    ($type_name:ty) => {
        impl diesel::serialize::ToSql<sql_types::Text, Pg> for $type_name {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, Pg>,
            ) -> diesel::serialize::Result {
                use std::io::Write;

                out.write_all(self.to_string().as_bytes())?;
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<sql_types::Text, Pg> for $type_name {
            fn from_sql(value: PgValue<'_>) -> diesel::deserialize::Result<Self> {
                use std::str::FromStr;

                let string = std::str::from_utf8(value.as_bytes())?;
                Self::from_str(string)
                    .map_err(|_| format!("Unrecognized enum variant: '{string}'").into())
            }
        }
    };
}

/// Lifecycle status shared by a payment intent and its provider mirror.
///
/// `Init` is never observable after the originating request returns; the
/// remaining variants are reachable per the transition table of the
/// processor. `Succeeded`, `Cancelled` and `Failed` are terminal.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    AsExpression,
    FromSqlRow,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[diesel(sql_type = sql_types::Text)]
pub enum IntentStatus {
    Init,
    RequiresCapture,
    Succeeded,
    Cancelled,
    Failed,
}

impl_db_text_enum!(IntentStatus);

impl IntentStatus {
    /// Whether no further provider-driven transition can occur.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Cancelled | Self::Failed)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    AsExpression,
    FromSqlRow,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[diesel(sql_type = sql_types::Text)]
pub enum CaptureMethod {
    /// The provider captures at authorization time.
    #[default]
    Automatic,
    /// Authorize now, capture within the provider's hold window.
    Manual,
}

impl_db_text_enum!(CaptureMethod);

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    AsExpression,
    FromSqlRow,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[diesel(sql_type = sql_types::Text)]
pub enum RefundStatus {
    Processing,
    Succeeded,
    Failed,
}

impl_db_text_enum!(RefundStatus);

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    AsExpression,
    FromSqlRow,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[diesel(sql_type = sql_types::Text)]
pub enum StripeChargeStatus {
    /// Written with the INIT rows, before the provider call settles.
    Pending,
    Succeeded,
    Failed,
    Cancelled,
}

impl_db_text_enum!(StripeChargeStatus);

/// Payment gateway provider code.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    AsExpression,
    FromSqlRow,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[diesel(sql_type = sql_types::Text)]
pub enum PgpCode {
    #[default]
    Stripe,
}

impl_db_text_enum!(PgpCode);

/// ISO 4217 alphabetic currency code, restricted to the markets the service
/// operates in.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = sql_types::Text)]
pub enum Currency {
    #[default]
    USD,
    CAD,
    AUD,
}

impl_db_text_enum!(Currency);

/// ISO 3166-1 alpha-2 country code, restricted to supported markets.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = sql_types::Text)]
pub enum CountryCode {
    #[default]
    US,
    CA,
    AU,
}

impl_db_text_enum!(CountryCode);

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn intent_status_round_trips_through_text() {
        assert_eq!(IntentStatus::RequiresCapture.to_string(), "requires_capture");
        assert_eq!(
            IntentStatus::from_str("requires_capture").unwrap(),
            IntentStatus::RequiresCapture
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(IntentStatus::Succeeded.is_terminal());
        assert!(IntentStatus::Cancelled.is_terminal());
        assert!(IntentStatus::Failed.is_terminal());
        assert!(!IntentStatus::Init.is_terminal());
        assert!(!IntentStatus::RequiresCapture.is_terminal());
    }
}
