pub mod cart_payment;
pub mod legacy_charge;
pub mod mock_db;
pub mod payment_intent;
pub mod pgp_payment_intent;
pub mod refund;

pub use mock_db::MockDb;

/// Every storage capability the processor needs, rolled up for dynamic
/// dispatch. Implemented by the database-backed [`crate::services::Store`]
/// and by the in-memory [`MockDb`].
pub trait StorageInterface:
    cart_payment::CartPaymentInterface
    + payment_intent::PaymentIntentInterface
    + pgp_payment_intent::PgpPaymentIntentInterface
    + refund::RefundInterface
    + legacy_charge::LegacyChargeInterface
    + Send
    + Sync
    + 'static
{
}

impl StorageInterface for crate::services::Store {}
impl StorageInterface for MockDb {}
