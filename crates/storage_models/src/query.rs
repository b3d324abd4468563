pub mod adjustment_history;
pub mod cart_payment;
pub mod legacy_charge;
pub mod payment_intent;
pub mod pgp_payment_intent;
pub mod refund;
