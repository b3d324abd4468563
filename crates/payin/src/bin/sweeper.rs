//! Deferred-capture sweeper entry point: loads settings, connects the store
//! and the provider gateway, then sweeps due intents until shutdown.

use std::sync::Arc;

use async_trait::async_trait;
use error_stack::{report, ResultExt};
use payin::{
    config::Settings,
    core::{
        cart_payments::{
            interface::CartPaymentInterface, legacy::LegacyPaymentInterface, CartPaymentProcessor,
        },
        errors::{ApiErrorResponse, PayinResult},
        payment_methods::{PayerClient, PaymentMethodClient},
    },
    logger,
    services::{
        gateway::{PspGateway, StripeGateway},
        Store,
    },
    sweeper::CaptureSweeper,
    types::api::{RawPayer, RawPaymentMethod},
};
use uuid::Uuid;

/// The sweeper only captures; payment creation never runs here, so payer
/// and payment-method lookups are not wired to anything.
struct LookupUnavailable;

#[async_trait]
impl PayerClient for LookupUnavailable {
    async fn get_raw_payer(&self, _payer_id: Uuid) -> PayinResult<RawPayer> {
        Err(report!(ApiErrorResponse::InternalServerError)
            .attach_printable("payer lookup is not available in the sweeper"))
    }
}

#[async_trait]
impl PaymentMethodClient for LookupUnavailable {
    async fn get_raw_payment_method(
        &self,
        _payer_id: Uuid,
        _payment_method_id: Uuid,
    ) -> PayinResult<RawPaymentMethod> {
        Err(report!(ApiErrorResponse::InternalServerError)
            .attach_printable("payment method lookup is not available in the sweeper"))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::new()?;
    logger::setup(&settings.log.level, settings.log.json);

    let store = Arc::new(
        Store::new(&settings.database)
            .await
            .attach_printable("could not reach the database")
            .map_err(|error| error.to_string())?,
    );
    let gateway: Arc<dyn PspGateway> = Arc::new(
        StripeGateway::new(&settings.gateway).map_err(|error| error.to_string())?,
    );

    let processor = Arc::new(CartPaymentProcessor {
        cart_payment_interface: CartPaymentInterface {
            payment_repo: store.clone(),
            gateway: gateway.clone(),
            payer_client: Arc::new(LookupUnavailable),
            payment_method_client: Arc::new(LookupUnavailable),
            payments_settings: settings.payments.clone(),
        },
        legacy_payment_interface: LegacyPaymentInterface {
            payment_repo: store.clone(),
        },
    });

    let sweeper = CaptureSweeper {
        payment_repo: store,
        processor,
        settings: settings.sweeper.clone(),
        payments_settings: settings.payments.clone(),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    logger::info!("deferred capture sweeper starting");
    sweeper.run(shutdown_rx).await;
    Ok(())
}
