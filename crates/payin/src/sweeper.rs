//! Background job that drives authorized-but-uncaptured payment intents to
//! capture once their capture window is due.

use std::sync::Arc;

use futures::StreamExt;
use storage_models::date_time;
use time::Duration;
use tracing::instrument;

use crate::{
    config,
    core::cart_payments::CartPaymentProcessor,
    db::StorageInterface,
    logger,
    types::storage::PaymentIntent,
};

#[derive(Debug, Default, Eq, PartialEq)]
pub struct SweepSummary {
    pub captured: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct CaptureSweeper {
    pub payment_repo: Arc<dyn StorageInterface>,
    pub processor: Arc<CartPaymentProcessor>,
    pub settings: config::Sweeper,
    pub payments_settings: config::Payments,
}

impl CaptureSweeper {
    /// Loop forever, sweeping on the configured cadence. Returns only on
    /// shutdown signal.
    pub async fn run(&self, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(
            self.settings.interval_seconds,
        ));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let summary = self.sweep_once().await;
                    logger::info!(
                        captured = summary.captured,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        "deferred capture sweep finished"
                    );
                }
                _ = &mut shutdown => {
                    logger::info!("capture sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// One pass over every intent whose capture is due. Failures on one
    /// intent never abort the sweep.
    #[instrument(skip_all)]
    pub async fn sweep_once(&self) -> SweepSummary {
        let now = date_time::now();
        let mut summary = SweepSummary::default();
        let mut due_intents = self
            .payment_repo
            .find_payment_intents_that_require_capture_before_cutoff(
                now,
                self.settings.batch_size,
            );

        while let Some(next) = due_intents.next().await {
            let payment_intent = match next {
                Ok(payment_intent) => payment_intent,
                Err(error) => {
                    logger::error!(?error, "failed to advance the capture cursor");
                    summary.failed += 1;
                    break;
                }
            };

            match self.is_well_formed(&payment_intent).await {
                Ok(true) => {}
                Ok(false) => {
                    summary.skipped += 1;
                    continue;
                }
                Err(error) => {
                    logger::error!(?error, payment_intent_id = %payment_intent.id, "well-formed check failed");
                    summary.failed += 1;
                    continue;
                }
            }

            match self.processor.capture_payment(payment_intent.clone()).await {
                Ok(_) => summary.captured += 1,
                Err(error) => {
                    logger::error!(
                        ?error,
                        payment_intent_id = %payment_intent.id,
                        "capture failed, intent left for the next sweep"
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Guard against intents the sweeper must not touch: too old for the
    /// provider's hold window, never fully submitted, or with a mirror that
    /// disagrees with the domain status. Such intents are skipped, not
    /// repaired.
    pub async fn is_well_formed(
        &self,
        payment_intent: &PaymentIntent,
    ) -> Result<bool, error_stack::Report<crate::core::errors::ApiErrorResponse>> {
        let cutoff = date_time::now()
            - Duration::seconds(self.payments_settings.capture_sweep_cutoff_seconds as i64);
        if payment_intent.created_at < cutoff {
            logger::warn!(
                payment_intent_id = %payment_intent.id,
                "skipping intent past the capture cutoff"
            );
            return Ok(false);
        }

        let pgp_payment_intents = self
            .processor
            .cart_payment_interface
            .payment_repo
            .find_pgp_payment_intents(payment_intent.id)
            .await
            .map_err(|error| {
                error.change_context(crate::core::errors::ApiErrorResponse::InternalServerError)
            })?;
        if pgp_payment_intents.is_empty() {
            return Ok(false);
        }
        for pgp_payment_intent in &pgp_payment_intents {
            if pgp_payment_intent.status != payment_intent.status {
                logger::warn!(
                    payment_intent_id = %payment_intent.id,
                    "skipping intent whose provider mirror diverges"
                );
                return Ok(false);
            }
            if pgp_payment_intent.resource_id.is_none() {
                logger::warn!(
                    payment_intent_id = %payment_intent.id,
                    "skipping intent with no provider resource"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}
