pub mod cart_payments;
pub mod errors;
pub mod payment_methods;
