//! Thin wrapper over the payment service provider's REST surface.
//!
//! The rest of the service talks to the provider exclusively through
//! [`PspGateway`]; production uses [`StripeGateway`], tests substitute their
//! own implementations.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use error_stack::report;
use masking::{PeekInterface, StrongSecret};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use storage_models::{
    enums::{CaptureMethod, Currency, IntentStatus, RefundStatus},
    types::MinorUnit,
};

use crate::{
    config,
    core::errors::{CustomResult, GatewayError},
    logger,
};

/// Provider view of a payment intent, as returned by create / capture /
/// cancel calls.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderPaymentIntent {
    /// Absent only for submissions fabricated in commando mode.
    pub id: Option<String>,
    pub status: ProviderIntentStatus,
    pub amount: MinorUnit,
    #[serde(default)]
    pub amount_capturable: MinorUnit,
    #[serde(default)]
    pub amount_received: MinorUnit,
    #[serde(default)]
    pub latest_charge: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Succeeded,
    Canceled,
}

impl ProviderIntentStatus {
    /// Fold the provider vocabulary onto the domain lifecycle. Anything the
    /// provider reports that our confirm-at-create flow cannot reach is a
    /// failed submission.
    pub fn to_intent_status(self) -> IntentStatus {
        match self {
            Self::Succeeded => IntentStatus::Succeeded,
            Self::RequiresCapture => IntentStatus::RequiresCapture,
            Self::Canceled => IntentStatus::Cancelled,
            Self::RequiresPaymentMethod
            | Self::RequiresConfirmation
            | Self::RequiresAction
            | Self::Processing => IntentStatus::Failed,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderRefund {
    pub id: String,
    pub status: ProviderRefundStatus,
    pub amount: MinorUnit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderRefundStatus {
    Pending,
    Succeeded,
    Failed,
    Canceled,
}

impl ProviderRefundStatus {
    pub fn to_refund_status(self) -> RefundStatus {
        match self {
            Self::Pending => RefundStatus::Processing,
            Self::Succeeded => RefundStatus::Succeeded,
            Self::Failed | Self::Canceled => RefundStatus::Failed,
        }
    }
}

/// Everything the provider needs to authorize (and possibly capture) a new
/// payment intent.
#[derive(Clone, Debug)]
pub struct CreatePaymentIntentRequest {
    pub amount: MinorUnit,
    pub currency: Currency,
    pub customer: Option<masking::Secret<String>>,
    pub payment_method: masking::Secret<String>,
    pub capture_method: CaptureMethod,
    pub description: Option<String>,
    pub statement_descriptor: Option<String>,
    pub application_fee_amount: Option<MinorUnit>,
    pub transfer_destination: Option<String>,
    pub idempotency_key: String,
}

#[async_trait]
pub trait PspGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> CustomResult<ProviderPaymentIntent, GatewayError>;

    async fn capture_payment_intent(
        &self,
        resource_id: &str,
        amount_to_capture: MinorUnit,
        idempotency_key: &str,
    ) -> CustomResult<ProviderPaymentIntent, GatewayError>;

    async fn cancel_payment_intent(
        &self,
        resource_id: &str,
        idempotency_key: &str,
    ) -> CustomResult<ProviderPaymentIntent, GatewayError>;

    async fn refund_charge(
        &self,
        charge_resource_id: &str,
        amount: MinorUnit,
        idempotency_key: &str,
    ) -> CustomResult<ProviderRefund, GatewayError>;

    /// Degraded mode: outbound submissions are skipped and recorded as
    /// provisionally accepted.
    fn is_commando_mode(&self) -> bool;

    fn set_commando_mode(&self, enabled: bool);
}

pub struct StripeGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: StrongSecret<String>,
    commando_mode: AtomicBool,
}

impl StripeGateway {
    pub fn new(settings: &config::Gateway) -> CustomResult<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .into_report_gateway()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            secret_key: StrongSecret::new(settings.secret_key.peek().clone()),
            commando_mode: AtomicBool::new(settings.commando_mode),
        })
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        idempotency_key: &str,
        params: &[(&str, String)],
    ) -> CustomResult<T, GatewayError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.peek())
            .header("Idempotency-Key", idempotency_key)
            .form(params)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|error| {
                    report!(GatewayError::ResponseDeserializationFailed)
                        .attach_printable(error.to_string())
                })
        } else {
            let envelope = response
                .json::<StripeErrorEnvelope>()
                .await
                .map_err(|error| {
                    report!(GatewayError::ResponseDeserializationFailed)
                        .attach_printable(error.to_string())
                })?;
            let error = envelope.error;
            logger::warn!(
                provider_error_type = error.error_type.as_deref().unwrap_or("unknown"),
                provider_error_code = error.code.as_deref().unwrap_or("unknown"),
                http_status = status.as_u16(),
                "provider rejected the request"
            );
            Err(report!(GatewayError::ProviderError {
                code: error
                    .code
                    .or(error.decline_code)
                    .unwrap_or_else(|| "unknown".to_string()),
                message: error
                    .message
                    .unwrap_or_else(|| "provider returned an error".to_string()),
                retryable: status.is_server_error()
                    || matches!(
                        error.error_type.as_deref(),
                        Some("api_error") | Some("rate_limit_error")
                    ),
            }))
        }
    }
}

#[async_trait]
impl PspGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> CustomResult<ProviderPaymentIntent, GatewayError> {
        let mut params: Vec<(&str, String)> = vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.to_string().to_lowercase()),
            ("payment_method", request.payment_method.peek().clone()),
            ("confirm", "true".to_string()),
            (
                "capture_method",
                match request.capture_method {
                    CaptureMethod::Automatic => "automatic".to_string(),
                    CaptureMethod::Manual => "manual".to_string(),
                },
            ),
            ("expand[]", "latest_charge".to_string()),
        ];
        if let Some(customer) = &request.customer {
            params.push(("customer", customer.peek().clone()));
        }
        if let Some(description) = &request.description {
            params.push(("description", description.clone()));
        }
        if let Some(descriptor) = &request.statement_descriptor {
            params.push(("statement_descriptor", descriptor.clone()));
        }
        if let Some(fee) = request.application_fee_amount {
            params.push(("application_fee_amount", fee.to_string()));
        }
        if let Some(destination) = &request.transfer_destination {
            params.push(("transfer_data[destination]", destination.clone()));
        }

        self.post_form("/v1/payment_intents", &request.idempotency_key, &params)
            .await
    }

    async fn capture_payment_intent(
        &self,
        resource_id: &str,
        amount_to_capture: MinorUnit,
        idempotency_key: &str,
    ) -> CustomResult<ProviderPaymentIntent, GatewayError> {
        let path = format!("/v1/payment_intents/{resource_id}/capture");
        let params = [("amount_to_capture", amount_to_capture.to_string())];
        self.post_form(&path, idempotency_key, &params).await
    }

    async fn cancel_payment_intent(
        &self,
        resource_id: &str,
        idempotency_key: &str,
    ) -> CustomResult<ProviderPaymentIntent, GatewayError> {
        let path = format!("/v1/payment_intents/{resource_id}/cancel");
        self.post_form(&path, idempotency_key, &[]).await
    }

    async fn refund_charge(
        &self,
        charge_resource_id: &str,
        amount: MinorUnit,
        idempotency_key: &str,
    ) -> CustomResult<ProviderRefund, GatewayError> {
        let params = [
            ("charge", charge_resource_id.to_string()),
            ("amount", amount.to_string()),
        ];
        self.post_form("/v1/refunds", idempotency_key, &params).await
    }

    fn is_commando_mode(&self) -> bool {
        self.commando_mode.load(Ordering::Relaxed)
    }

    fn set_commando_mode(&self, enabled: bool) {
        self.commando_mode.store(enabled, Ordering::Relaxed);
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeApiError,
}

#[derive(Debug, Deserialize)]
struct StripeApiError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
    decline_code: Option<String>,
    message: Option<String>,
}

fn classify_transport_error(error: reqwest::Error) -> error_stack::Report<GatewayError> {
    if error.is_timeout() {
        report!(GatewayError::Timeout).attach_printable(error.to_string())
    } else {
        report!(GatewayError::ConnectionError).attach_printable(error.to_string())
    }
}

/// Local shim: reqwest build errors carry no gateway context of their own.
trait IntoReportGateway<T> {
    fn into_report_gateway(self) -> CustomResult<T, GatewayError>;
}

impl<T> IntoReportGateway<T> for Result<T, reqwest::Error> {
    fn into_report_gateway(self) -> CustomResult<T, GatewayError> {
        self.map_err(|error| {
            report!(GatewayError::RequestEncodingFailed).attach_printable(error.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn gateway_for(server: &MockServer) -> StripeGateway {
        StripeGateway::new(&config::Gateway {
            base_url: server.uri(),
            secret_key: masking::Secret::new("sk_test_key".to_string()),
            request_timeout_seconds: 5,
            commando_mode: false,
        })
        .expect("gateway construction")
    }

    fn create_request(amount: i64) -> CreatePaymentIntentRequest {
        CreatePaymentIntentRequest {
            amount: MinorUnit::new(amount),
            currency: Currency::USD,
            customer: Some(masking::Secret::new("cus_123".to_string())),
            payment_method: masking::Secret::new("pm_456".to_string()),
            capture_method: CaptureMethod::Automatic,
            description: None,
            statement_descriptor: None,
            application_fee_amount: None,
            transfer_destination: None,
            idempotency_key: "idk-1".to_string(),
        }
    }

    #[tokio::test]
    async fn create_payment_intent_parses_provider_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("Idempotency-Key", "idk-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_1",
                "status": "succeeded",
                "amount": 1000,
                "amount_capturable": 0,
                "amount_received": 1000,
                "latest_charge": "ch_1"
            })))
            .mount(&server)
            .await;

        let provider_intent = gateway_for(&server)
            .create_payment_intent(create_request(1000))
            .await
            .expect("provider call");

        assert_eq!(provider_intent.id.as_deref(), Some("pi_1"));
        assert_eq!(provider_intent.status, ProviderIntentStatus::Succeeded);
        assert_eq!(provider_intent.amount_received, MinorUnit::new(1000));
        assert_eq!(provider_intent.latest_charge.as_deref(), Some("ch_1"));
    }

    #[tokio::test]
    async fn card_error_maps_to_non_retryable_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {
                    "type": "card_error",
                    "code": "card_declined",
                    "message": "Your card was declined."
                }
            })))
            .mount(&server)
            .await;

        let error = gateway_for(&server)
            .create_payment_intent(create_request(1000))
            .await
            .expect_err("must fail");

        match error.current_context() {
            GatewayError::ProviderError {
                code, retryable, ..
            } => {
                assert_eq!(code, "card_declined");
                assert!(!retryable);
            }
            other => panic!("unexpected gateway error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/refunds"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"type": "api_error", "message": "something went wrong"}
            })))
            .mount(&server)
            .await;

        let error = gateway_for(&server)
            .refund_charge("ch_1", MinorUnit::new(100), "idk-2")
            .await
            .expect_err("must fail");

        match error.current_context() {
            GatewayError::ProviderError { retryable, .. } => assert!(retryable),
            other => panic!("unexpected gateway error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn commando_flag_round_trips_through_setter() {
        let server = MockServer::start().await;
        let gateway = gateway_for(&server);
        assert!(!gateway.is_commando_mode());
        gateway.set_commando_mode(true);
        assert!(gateway.is_commando_mode());
    }
}
