pub mod api;

/// Storage rows, re-exported the way core code consumes them.
pub mod storage {
    pub use storage_models::{
        cart_payment::{CartPayment, CartPaymentNew, CartPaymentUpdate},
        enums,
        legacy_charge::{
            LegacyConsumerCharge, LegacyConsumerChargeNew, LegacyStripeCharge,
            LegacyStripeChargeNew, LegacyStripeChargeUpdate,
        },
        payment_intent::{PaymentIntent, PaymentIntentNew, PaymentIntentUpdate},
        pgp_payment_intent::{PgpPaymentIntent, PgpPaymentIntentNew, PgpPaymentIntentUpdate},
        adjustment_history::{PaymentIntentAdjustmentHistory, PaymentIntentAdjustmentHistoryNew},
        refund::{PgpRefund, PgpRefundNew, PgpRefundUpdate, Refund, RefundNew, RefundUpdate},
        types::MinorUnit,
    };
}
