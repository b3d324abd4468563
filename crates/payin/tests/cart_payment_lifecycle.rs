//! End-to-end lifecycle tests for the cart payment processor, driven
//! against the in-memory repository and a scripted provider gateway.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use error_stack::report;
use masking::Secret;
use payin::{
    config,
    core::{
        cart_payments::{
            interface::CartPaymentInterface, legacy::LegacyPaymentInterface, CartPaymentProcessor,
        },
        errors::{ApiErrorResponse, CustomResult, GatewayError, PayinResult},
        payment_methods::{PayerClient, PaymentMethodClient},
    },
    db::{
        legacy_charge::LegacyChargeInterface, payment_intent::PaymentIntentInterface,
        pgp_payment_intent::PgpPaymentIntentInterface, MockDb,
    },
    services::gateway::{
        CreatePaymentIntentRequest, ProviderIntentStatus, ProviderPaymentIntent, ProviderRefund,
        ProviderRefundStatus, PspGateway,
    },
    sweeper::CaptureSweeper,
    types::{
        api::{CartPaymentRequest, CorrelationIds, LegacyPayment},
        storage::{
            enums::{CaptureMethod, CountryCode, Currency, IntentStatus, StripeChargeStatus},
            MinorUnit,
        },
    },
};
use uuid::Uuid;

struct TestGateway {
    commando: AtomicBool,
    fail_create: AtomicBool,
    create_calls: AtomicUsize,
    refund_calls: AtomicUsize,
    capture_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    sequence: AtomicUsize,
}

impl TestGateway {
    fn new() -> Self {
        Self {
            commando: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            create_calls: AtomicUsize::new(0),
            refund_calls: AtomicUsize::new(0),
            capture_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            sequence: AtomicUsize::new(0),
        }
    }

    fn next_seq(&self) -> usize {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl PspGateway for TestGateway {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> CustomResult<ProviderPaymentIntent, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(report!(GatewayError::ProviderError {
                code: "card_declined".to_string(),
                message: "Your card was declined.".to_string(),
                retryable: false,
            }));
        }
        let seq = self.next_seq();
        let provider_intent = match request.capture_method {
            CaptureMethod::Automatic => ProviderPaymentIntent {
                id: Some(format!("pi_{seq}")),
                status: ProviderIntentStatus::Succeeded,
                amount: request.amount,
                amount_capturable: MinorUnit::zero(),
                amount_received: request.amount,
                latest_charge: Some(format!("ch_{seq}")),
            },
            CaptureMethod::Manual => ProviderPaymentIntent {
                id: Some(format!("pi_{seq}")),
                status: ProviderIntentStatus::RequiresCapture,
                amount: request.amount,
                amount_capturable: request.amount,
                amount_received: MinorUnit::zero(),
                latest_charge: Some(format!("ch_{seq}")),
            },
        };
        Ok(provider_intent)
    }

    async fn capture_payment_intent(
        &self,
        resource_id: &str,
        amount_to_capture: MinorUnit,
        _idempotency_key: &str,
    ) -> CustomResult<ProviderPaymentIntent, GatewayError> {
        self.capture_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderPaymentIntent {
            id: Some(resource_id.to_string()),
            status: ProviderIntentStatus::Succeeded,
            amount: amount_to_capture,
            amount_capturable: MinorUnit::zero(),
            amount_received: amount_to_capture,
            latest_charge: None,
        })
    }

    async fn cancel_payment_intent(
        &self,
        resource_id: &str,
        _idempotency_key: &str,
    ) -> CustomResult<ProviderPaymentIntent, GatewayError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderPaymentIntent {
            id: Some(resource_id.to_string()),
            status: ProviderIntentStatus::Canceled,
            amount: MinorUnit::zero(),
            amount_capturable: MinorUnit::zero(),
            amount_received: MinorUnit::zero(),
            latest_charge: None,
        })
    }

    async fn refund_charge(
        &self,
        _charge_resource_id: &str,
        amount: MinorUnit,
        _idempotency_key: &str,
    ) -> CustomResult<ProviderRefund, GatewayError> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        let seq = self.next_seq();
        Ok(ProviderRefund {
            id: format!("re_{seq}"),
            status: ProviderRefundStatus::Succeeded,
            amount,
        })
    }

    fn is_commando_mode(&self) -> bool {
        self.commando.load(Ordering::SeqCst)
    }

    fn set_commando_mode(&self, enabled: bool) {
        self.commando.store(enabled, Ordering::SeqCst);
    }
}

struct TestPayerClient;

#[async_trait]
impl PayerClient for TestPayerClient {
    async fn get_raw_payer(
        &self,
        payer_id: Uuid,
    ) -> PayinResult<payin::types::api::RawPayer> {
        Ok(payin::types::api::RawPayer {
            payer_id,
            country: CountryCode::US,
            pgp_customer_resource_id: Secret::new("cus_test".to_string()),
            legacy_consumer_id: 1,
        })
    }
}

struct TestPaymentMethodClient {
    fail_with: Option<ApiErrorResponse>,
}

#[async_trait]
impl PaymentMethodClient for TestPaymentMethodClient {
    async fn get_raw_payment_method(
        &self,
        payer_id: Uuid,
        payment_method_id: Uuid,
    ) -> PayinResult<payin::types::api::RawPaymentMethod> {
        match &self.fail_with {
            Some(error) => Err(report!(error.clone())),
            None => Ok(payin::types::api::RawPaymentMethod {
                payment_method_id,
                payer_id,
                pgp_resource_id: Secret::new("pm_test".to_string()),
            }),
        }
    }
}

struct TestApp {
    processor: Arc<CartPaymentProcessor>,
    repo: Arc<MockDb>,
    gateway: Arc<TestGateway>,
    payments_settings: config::Payments,
}

fn payments_settings_with_immediate_window() -> config::Payments {
    config::Payments {
        default_capture_after_seconds: 0,
        ..config::Payments::default()
    }
}

fn build_app_with(
    payments_settings: config::Payments,
    method_failure: Option<ApiErrorResponse>,
) -> TestApp {
    let repo = Arc::new(MockDb::new());
    let gateway = Arc::new(TestGateway::new());
    let processor = Arc::new(CartPaymentProcessor {
        cart_payment_interface: CartPaymentInterface {
            payment_repo: repo.clone(),
            gateway: gateway.clone(),
            payer_client: Arc::new(TestPayerClient),
            payment_method_client: Arc::new(TestPaymentMethodClient {
                fail_with: method_failure,
            }),
            payments_settings: payments_settings.clone(),
        },
        legacy_payment_interface: LegacyPaymentInterface {
            payment_repo: repo.clone(),
        },
    });
    TestApp {
        processor,
        repo,
        gateway,
        payments_settings,
    }
}

fn build_app() -> TestApp {
    build_app_with(config::Payments::default(), None)
}

fn cart_payment_request(amount: i64, delay_capture: bool) -> CartPaymentRequest {
    CartPaymentRequest {
        payer_id: Some(Uuid::new_v4()),
        payment_method_id: Uuid::new_v4(),
        amount: MinorUnit::new(amount),
        delay_capture: Some(delay_capture),
        client_description: Some("client_description".to_string()),
        payer_statement_description: Some("description".to_string()),
        correlation_ids: CorrelationIds {
            reference_id: "123".to_string(),
            reference_type: "3".to_string(),
        },
        split_payment: None,
        metadata: None,
    }
}

fn key() -> String {
    Uuid::new_v4().to_string()
}

/// Expected observable state of one intent with its provider mirror and
/// legacy stripe charge, in creation order.
struct ExpectedIntent {
    amount: i64,
    status: IntentStatus,
    pgp_amount: i64,
    pgp_amount_capturable: i64,
    pgp_amount_received: i64,
    stripe_amount: i64,
    stripe_amount_refunded: i64,
    stripe_status: StripeChargeStatus,
}

async fn assert_cart_state(
    app: &TestApp,
    cart_payment_id: Uuid,
    expected_cart_amount: i64,
    original_total: i64,
    expected_intents: &[ExpectedIntent],
) {
    use payin::db::cart_payment::CartPaymentInterface as _;

    let cart_payment = app
        .repo
        .find_cart_payment_by_id(cart_payment_id)
        .await
        .expect("repo")
        .expect("cart payment exists");
    assert_eq!(cart_payment.amount, MinorUnit::new(expected_cart_amount));

    let payment_intents = app
        .repo
        .find_payment_intents_for_cart_payment(cart_payment_id)
        .await
        .expect("repo");
    assert_eq!(payment_intents.len(), expected_intents.len());

    for (payment_intent, expected) in payment_intents.iter().zip(expected_intents) {
        assert_eq!(payment_intent.amount, MinorUnit::new(expected.amount));
        assert_eq!(payment_intent.status, expected.status);

        let pgp_payment_intents = app
            .repo
            .find_pgp_payment_intents(payment_intent.id)
            .await
            .expect("repo");
        assert_eq!(pgp_payment_intents.len(), 1);
        let pgp = &pgp_payment_intents[0];
        assert_eq!(pgp.amount, MinorUnit::new(expected.pgp_amount));
        assert_eq!(
            pgp.amount_capturable,
            MinorUnit::new(expected.pgp_amount_capturable)
        );
        assert_eq!(
            pgp.amount_received,
            MinorUnit::new(expected.pgp_amount_received)
        );
        assert_eq!(pgp.status, payment_intent.status);

        let consumer_charge = app
            .repo
            .find_legacy_consumer_charge_by_id(payment_intent.legacy_consumer_charge_id)
            .await
            .expect("repo")
            .expect("consumer charge exists");
        assert_eq!(consumer_charge.original_total, MinorUnit::new(original_total));

        let stripe_charge = app
            .repo
            .find_legacy_stripe_charge(
                payment_intent.legacy_consumer_charge_id,
                &payment_intent.idempotency_key,
            )
            .await
            .expect("repo")
            .expect("stripe charge exists");
        assert_eq!(stripe_charge.amount, MinorUnit::new(expected.stripe_amount));
        assert_eq!(
            stripe_charge.amount_refunded,
            MinorUnit::new(expected.stripe_amount_refunded)
        );
        assert_eq!(stripe_charge.status, expected.stripe_status);
    }
}

fn captured_intent(amount: i64, pgp_amount: i64, stripe_refunded: i64) -> ExpectedIntent {
    ExpectedIntent {
        amount,
        status: IntentStatus::Succeeded,
        pgp_amount,
        pgp_amount_capturable: 0,
        pgp_amount_received: pgp_amount,
        stripe_amount: pgp_amount,
        stripe_amount_refunded: stripe_refunded,
        stripe_status: StripeChargeStatus::Succeeded,
    }
}

#[tokio::test]
async fn create_without_adjustment_settles_all_three_records() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    assert_eq!(cart_payment.amount, MinorUnit::new(1000));
    assert_cart_state(&app, cart_payment.id, 1000, 1000, &[captured_intent(1000, 1000, 0)]).await;
}

#[tokio::test]
async fn partial_refund_reduces_domain_amount_only() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    let updated = app
        .processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(500),
            None,
            None,
        )
        .await
        .expect("adjust down");

    assert_eq!(updated.amount, MinorUnit::new(500));
    // Provider view keeps the historical charge; only the books move.
    assert_cart_state(&app, cart_payment.id, 500, 1000, &[captured_intent(500, 1000, 500)]).await;
    assert_eq!(app.gateway.refund_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn full_refund_zeroes_the_cart_payment() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    app.processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::zero(),
            None,
            None,
        )
        .await
        .expect("full refund");

    assert_cart_state(&app, cart_payment.id, 0, 1000, &[captured_intent(0, 1000, 1000)]).await;
}

#[tokio::test]
async fn sequential_partial_refunds_accumulate() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    app.processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(800),
            None,
            None,
        )
        .await
        .expect("first partial refund");
    app.processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(600),
            None,
            None,
        )
        .await
        .expect("second partial refund");

    assert_cart_state(&app, cart_payment.id, 600, 1000, &[captured_intent(600, 1000, 400)]).await;
    assert_eq!(app.gateway.refund_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn adjust_up_after_partial_refund_charges_a_replacement_intent() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    app.processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(800),
            None,
            None,
        )
        .await
        .expect("partial refund");
    let updated = app
        .processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(850),
            None,
            None,
        )
        .await
        .expect("adjust up");

    assert_eq!(updated.amount, MinorUnit::new(850));
    assert_cart_state(
        &app,
        cart_payment.id,
        850,
        1000,
        &[
            captured_intent(0, 1000, 1000),
            captured_intent(850, 850, 0),
        ],
    )
    .await;
}

#[tokio::test]
async fn adjust_up_beyond_original_refunds_prior_and_charges_new_total() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    let updated = app
        .processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(1300),
            None,
            None,
        )
        .await
        .expect("adjust up");

    assert_eq!(updated.amount, MinorUnit::new(1300));
    assert_cart_state(
        &app,
        cart_payment.id,
        1300,
        1000,
        &[
            captured_intent(0, 1000, 1000),
            captured_intent(1300, 1300, 0),
        ],
    )
    .await;
    assert_eq!(app.gateway.create_calls.load(Ordering::SeqCst), 2);
    assert_eq!(app.gateway.refund_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn partial_refund_after_adjust_up_targets_the_replacement_intent() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    app.processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(1300),
            None,
            None,
        )
        .await
        .expect("adjust up");
    app.processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(1000),
            None,
            None,
        )
        .await
        .expect("partial refund");

    assert_cart_state(
        &app,
        cart_payment.id,
        1000,
        1000,
        &[
            captured_intent(0, 1000, 1000),
            captured_intent(1000, 1300, 300),
        ],
    )
    .await;
}

#[tokio::test]
async fn cancel_after_capture_is_a_full_refund() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    let cancelled = app
        .processor
        .cancel_payment(cart_payment.id)
        .await
        .expect("cancel");

    assert_eq!(cancelled.amount, MinorUnit::zero());
    assert_cart_state(&app, cart_payment.id, 0, 1000, &[captured_intent(0, 1000, 1000)]).await;
    assert_eq!(app.gateway.refund_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn zero_delta_update_is_a_no_op() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    let updated = app
        .processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(1000),
            None,
            None,
        )
        .await
        .expect("no-op update");

    assert_eq!(updated, cart_payment);
    assert_eq!(app.gateway.refund_calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.gateway.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn update_of_unknown_cart_payment_is_not_found() {
    let app = build_app();
    let error = app
        .processor
        .update_payment(
            Uuid::new_v4(),
            &key(),
            None,
            MinorUnit::new(500),
            None,
            None,
        )
        .await
        .expect_err("must fail");
    assert_eq!(
        error.current_context(),
        &ApiErrorResponse::CartPaymentNotFound
    );
    assert!(!error.current_context().retryable());
}

#[tokio::test]
async fn negative_amount_is_rejected() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    let error = app
        .processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(-100),
            None,
            None,
        )
        .await
        .expect_err("must fail");
    assert_eq!(
        error.current_context(),
        &ApiErrorResponse::CartPaymentAmountInvalid
    );
}

#[tokio::test]
async fn create_replay_with_same_key_returns_the_first_outcome() {
    let app = build_app();
    let request = cart_payment_request(1000, false);
    let idempotency_key = key();

    let first = app
        .processor
        .create_payment(&request, &idempotency_key, CountryCode::US, Currency::USD)
        .await
        .expect("create");
    let second = app
        .processor
        .create_payment(&request, &idempotency_key, CountryCode::US, Currency::USD)
        .await
        .expect("replay");

    assert_eq!(first, second);
    assert_eq!(app.gateway.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_creates_with_same_key_converge_to_one_cart_payment() {
    let app = build_app();
    let request = cart_payment_request(1000, false);
    let idempotency_key = key();

    let (first, second) = tokio::join!(
        app.processor
            .create_payment(&request, &idempotency_key, CountryCode::US, Currency::USD),
        app.processor
            .create_payment(&request, &idempotency_key, CountryCode::US, Currency::USD),
    );
    let first = first.expect("first create");
    let second = second.expect("second create");

    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn provider_failure_on_create_marks_everything_failed() {
    let app = build_app();
    app.gateway.fail_create.store(true, Ordering::SeqCst);

    let error = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect_err("must fail");
    match error.current_context() {
        ApiErrorResponse::ProviderError { code, retryable, .. } => {
            assert_eq!(code, "card_declined");
            assert!(!retryable);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // No record may stay in INIT after the request returns.
    let intent = app
        .repo
        .find_payment_intent_for_legacy_charge(1)
        .await
        .expect("repo")
        .expect("intent exists");
    assert_eq!(intent.status, IntentStatus::Failed);

    let stripe_charge = app
        .repo
        .find_legacy_stripe_charge(intent.legacy_consumer_charge_id, &intent.idempotency_key)
        .await
        .expect("repo")
        .expect("stripe charge exists");
    assert_eq!(stripe_charge.status, StripeChargeStatus::Failed);
    assert!(stripe_charge.error_reason.is_some());

    let pgp = app
        .repo
        .find_pgp_payment_intents(intent.id)
        .await
        .expect("repo");
    assert_eq!(pgp[0].status, IntentStatus::Failed);
}

#[tokio::test]
async fn payment_method_mismatch_fails_before_any_write() {
    let app = build_app_with(
        config::Payments::default(),
        Some(ApiErrorResponse::PaymentMethodPayerMismatch),
    );
    let error = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect_err("must fail");
    assert_eq!(
        error.current_context(),
        &ApiErrorResponse::PaymentMethodPayerMismatch
    );
    assert_eq!(app.gateway.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn commando_mode_accepts_without_calling_the_provider() {
    let app = build_app();
    app.gateway.set_commando_mode(true);

    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("commando create");

    assert_eq!(cart_payment.amount, MinorUnit::new(1000));
    assert_eq!(app.gateway.create_calls.load(Ordering::SeqCst), 0);

    let intent = app
        .repo
        .find_payment_intent_for_legacy_charge(1)
        .await
        .expect("repo")
        .expect("intent exists");
    assert_eq!(intent.status, IntentStatus::Succeeded);
    let pgp = app
        .repo
        .find_pgp_payment_intents(intent.id)
        .await
        .expect("repo");
    // Provisional acceptance: no provider resource yet, reconciliation
    // attaches it later.
    assert!(pgp[0].resource_id.is_none());
}

#[tokio::test]
async fn delayed_capture_adjusts_in_place_and_captures_via_sweeper() {
    let app = build_app_with(payments_settings_with_immediate_window(), None);
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, true),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    let intent = app
        .repo
        .find_payment_intent_for_legacy_charge(1)
        .await
        .expect("repo")
        .expect("intent exists");
    assert_eq!(intent.status, IntentStatus::RequiresCapture);
    assert_eq!(intent.amount_capturable, MinorUnit::new(1000));

    // Lower before capture: local adjustment, audit row, no provider call.
    let adjustment_key = key();
    app.processor
        .update_payment(
            cart_payment.id,
            &adjustment_key,
            cart_payment.payer_id,
            MinorUnit::new(900),
            None,
            None,
        )
        .await
        .expect("adjust down before capture");

    let intent = app
        .repo
        .find_payment_intent_for_legacy_charge(1)
        .await
        .expect("repo")
        .expect("intent exists");
    assert_eq!(intent.amount, MinorUnit::new(900));
    assert_eq!(intent.amount_capturable, MinorUnit::new(900));
    assert_eq!(intent.status, IntentStatus::RequiresCapture);
    assert_eq!(app.gateway.refund_calls.load(Ordering::SeqCst), 0);

    let history = app
        .repo
        .find_payment_intent_adjustment_history(intent.id, &adjustment_key)
        .await
        .expect("repo")
        .expect("audit row exists");
    assert_eq!(history.amount_original, MinorUnit::new(1000));
    assert_eq!(history.amount_delta, MinorUnit::new(-100));
    assert_eq!(history.amount, MinorUnit::new(900));

    // The mirror keeps the authorized amount; only the capturable part
    // follows the adjustment.
    let pgp = app
        .repo
        .find_pgp_payment_intents(intent.id)
        .await
        .expect("repo");
    assert_eq!(pgp[0].amount, MinorUnit::new(1000));
    assert_eq!(pgp[0].amount_capturable, MinorUnit::new(900));

    // Sweep: the capture window is immediately due in this configuration.
    let sweeper = CaptureSweeper {
        payment_repo: app.repo.clone(),
        processor: app.processor.clone(),
        settings: config::Sweeper::default(),
        payments_settings: app.payments_settings.clone(),
    };
    let summary = sweeper.sweep_once().await;
    assert_eq!(summary.captured, 1);
    assert_eq!(summary.failed, 0);

    let intent = app
        .repo
        .find_payment_intent_for_legacy_charge(1)
        .await
        .expect("repo")
        .expect("intent exists");
    assert_eq!(intent.status, IntentStatus::Succeeded);
    assert_eq!(intent.amount_received, MinorUnit::new(900));
    assert_eq!(intent.amount_capturable, MinorUnit::zero());
    assert_eq!(app.gateway.capture_calls.load(Ordering::SeqCst), 1);

    // A second sweep finds nothing left to do.
    let summary = sweeper.sweep_once().await;
    assert_eq!(summary.captured, 0);
}

#[tokio::test]
async fn adjust_up_within_authorized_ceiling_raises_in_place() {
    let app = build_app_with(payments_settings_with_immediate_window(), None);
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, true),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");

    app.processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(900),
            None,
            None,
        )
        .await
        .expect("lower");
    app.processor
        .update_payment(
            cart_payment.id,
            &key(),
            cart_payment.payer_id,
            MinorUnit::new(950),
            None,
            None,
        )
        .await
        .expect("raise back within ceiling");

    let intents = app
        .repo
        .find_payment_intents_for_cart_payment(cart_payment.id)
        .await
        .expect("repo");
    // Still a single intent: the raise fit under what the provider
    // authorized.
    assert_eq!(intents.len(), 1);
    assert_eq!(intents[0].amount, MinorUnit::new(950));
    assert_eq!(intents[0].status, IntentStatus::RequiresCapture);
    assert_eq!(app.gateway.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sweeper_skips_malformed_intents() {
    use storage_models::date_time;
    use time::Duration;

    let app = build_app_with(payments_settings_with_immediate_window(), None);

    // A healthy delayed-capture payment, then surgically damage the mirror.
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(1000, true),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");
    let intent = app
        .repo
        .find_payment_intent_for_legacy_charge(1)
        .await
        .expect("repo")
        .expect("intent exists");

    let sweeper = CaptureSweeper {
        payment_repo: app.repo.clone(),
        processor: app.processor.clone(),
        settings: config::Sweeper::default(),
        payments_settings: app.payments_settings.clone(),
    };

    // Healthy intent is well-formed.
    assert!(sweeper.is_well_formed(&intent).await.expect("check"));

    // Too old for the provider's hold window.
    let mut stale = intent.clone();
    stale.created_at = date_time::now() - Duration::days(8);
    assert!(!sweeper.is_well_formed(&stale).await.expect("check"));

    // Mirror status diverging from the domain status.
    let pgp = app
        .repo
        .find_pgp_payment_intents(intent.id)
        .await
        .expect("repo")
        .remove(0);
    let (_, pgp) = app
        .repo
        .update_payment_intent_with_mirror(
            intent.clone(),
            payin::types::storage::PaymentIntentUpdate::AmountUpdate {
                amount: intent.amount,
                amount_capturable: intent.amount_capturable,
                updated_at: date_time::now(),
            },
            pgp,
            payin::types::storage::PgpPaymentIntentUpdate::FailedUpdate {
                error_code: None,
                error_message: None,
                updated_at: date_time::now(),
            },
        )
        .await
        .expect("repo");
    assert_eq!(pgp.status, IntentStatus::Failed);
    assert!(!sweeper.is_well_formed(&intent).await.expect("check"));

    // Commando-accepted intents have no provider resource to capture
    // against until reconciliation attaches one.
    app.gateway.set_commando_mode(true);
    app.processor
        .create_payment(
            &cart_payment_request(500, true),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("commando create");
    app.gateway.set_commando_mode(false);

    let summary = sweeper.sweep_once().await;
    assert_eq!(summary.captured, 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(app.gateway.capture_calls.load(Ordering::SeqCst), 0);
    drop(cart_payment);
}

#[tokio::test]
async fn legacy_surface_resolves_through_the_consumer_charge() {
    let app = build_app();
    let mut request = cart_payment_request(1000, false);
    request.payer_id = None;

    let (cart_payment, _legacy) = app
        .processor
        .legacy_create_payment(
            &request,
            &key(),
            LegacyPayment {
                dd_consumer_id: 7,
                dd_country_id: 1,
                stripe_customer_id: Secret::new("cus_legacy".to_string()),
                stripe_card_id: Secret::new("card_legacy".to_string()),
                dd_additional_payment_info: None,
            },
            Currency::USD,
            CountryCode::US,
            CountryCode::US,
        )
        .await
        .expect("legacy create");

    let intent = app
        .repo
        .find_payment_intent_for_legacy_charge(1)
        .await
        .expect("repo")
        .expect("intent exists");
    assert_eq!(intent.cart_payment_id, cart_payment.id);

    // Legacy adjustments arrive as deltas against the resolved cart.
    let updated = app
        .processor
        .update_payment_for_legacy_charge(
            &key(),
            intent.legacy_consumer_charge_id,
            MinorUnit::new(150),
            Some("updated description".to_string()),
            None,
            None,
        )
        .await
        .expect("legacy adjust up");
    assert_eq!(updated.amount, MinorUnit::new(1150));

    let cancelled = app
        .processor
        .cancel_payment_for_legacy_charge(intent.legacy_consumer_charge_id)
        .await
        .expect("legacy cancel");
    assert_eq!(cancelled.amount, MinorUnit::zero());
}

#[tokio::test]
async fn legacy_charge_not_found_maps_to_cart_payment_not_found() {
    let app = build_app();
    let error = app
        .processor
        .update_payment_for_legacy_charge(&key(), 404, MinorUnit::new(100), None, None, None)
        .await
        .expect_err("must fail");
    assert_eq!(
        error.current_context(),
        &ApiErrorResponse::CartPaymentNotFound
    );
}

#[tokio::test]
async fn legacy_delta_below_zero_is_invalid() {
    let app = build_app();
    let cart_payment = app
        .processor
        .create_payment(
            &cart_payment_request(700, false),
            &key(),
            CountryCode::US,
            Currency::USD,
        )
        .await
        .expect("create");
    drop(cart_payment);

    let error = app
        .processor
        .update_payment_for_legacy_charge(&key(), 1, MinorUnit::new(-1500), None, None, None)
        .await
        .expect_err("must fail");
    assert_eq!(
        error.current_context(),
        &ApiErrorResponse::CartPaymentAmountInvalid
    );
}

#[tokio::test]
async fn client_description_is_truncated_for_legacy_tables() {
    let app = build_app();
    let short = "short description";
    assert_eq!(
        app.processor.get_legacy_client_description(Some(short)),
        Some(short.to_string())
    );

    let long = "x".repeat(1400);
    let truncated = app
        .processor
        .get_legacy_client_description(Some(&long))
        .expect("present");
    assert_eq!(truncated.chars().count(), 1000);

    assert_eq!(app.processor.get_legacy_client_description(None), None);
}
