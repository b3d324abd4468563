pub mod adjustment_history;
pub mod cart_payment;
pub mod enums;
pub mod errors;
pub mod legacy_charge;
pub mod payment_intent;
pub mod pgp_payment_intent;
pub mod query;
pub mod refund;
pub mod schema;
pub mod types;

use diesel::PgConnection;

pub use self::{
    adjustment_history::*, cart_payment::*, errors::StorageResult, legacy_charge::*,
    payment_intent::*, pgp_payment_intent::*, refund::*, types::MinorUnit,
};

/// Connection handed to every query in this crate. Obtained from the bb8
/// pool; queries only ever borrow it.
pub type PgPooledConn = async_bb8_diesel::Connection<PgConnection>;

pub mod date_time {
    use time::{OffsetDateTime, PrimitiveDateTime};

    /// Current UTC wall clock, truncated to the naive timestamp the tables
    /// store.
    pub fn now() -> PrimitiveDateTime {
        let utc = OffsetDateTime::now_utc();
        PrimitiveDateTime::new(utc.date(), utc.time())
    }
}
