mod common;

use axum::http::{Method, StatusCode};
use common::{cart_sync_payload, json_body, TestApp, TEST_RAZORPAY_SECRET};
use peakform_api::{
    entities::{Payment, PurchasedProgram, UserRole},
    errors::ServiceError,
    services::checkout::{VerificationOutcome, VerifyPaymentInput},
    services::razorpay::compute_signature,
};
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use uuid::Uuid;

async fn payment_count(app: &TestApp) -> usize {
    Payment::find().all(&*app.state.db).await.unwrap().len()
}

async fn grant_count(app: &TestApp) -> usize {
    PurchasedProgram::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .len()
}

fn verify_input(order_id: &str, payment_id: &str) -> VerifyPaymentInput {
    VerifyPaymentInput {
        order_id: order_id.to_string(),
        payment_id: payment_id.to_string(),
        signature: compute_signature(TEST_RAZORPAY_SECRET, order_id, payment_id),
    }
}

#[tokio::test]
async fn bad_signature_creates_no_records() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("buyer@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;

    let payload = cart_sync_payload(&[(&a, 1)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    json_body(response, StatusCode::OK).await;

    let input = VerifyPaymentInput {
        order_id: "order_abc".to_string(),
        payment_id: "pay_def".to_string(),
        signature: "deadbeef".to_string(),
    };
    let result = app
        .state
        .services
        .checkout
        .verify_payment(user.id, input)
        .await;

    assert!(matches!(result, Err(ServiceError::PaymentFailed(_))));
    assert_eq!(payment_count(&app).await, 0);
    assert_eq!(grant_count(&app).await, 0);
}

#[tokio::test]
async fn valid_signature_with_empty_cart_is_rejected() {
    let app = TestApp::new().await;
    let (user, _) = app.seed_user("buyer@example.com", UserRole::Standard).await;

    let result = app
        .state
        .services
        .checkout
        .verify_payment(user.id, verify_input("order_abc", "pay_def"))
        .await;

    assert!(matches!(result, Err(ServiceError::PaymentFailed(_))));
    assert_eq!(payment_count(&app).await, 0);
    assert_eq!(grant_count(&app).await, 0);
}

#[tokio::test]
async fn verified_payment_grants_programs_and_clears_cart() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("buyer@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;
    let b = app.seed_program("Mobility Reset", dec!(249)).await;

    let payload = cart_sync_payload(&[(&a, 1), (&b, 1)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    json_body(response, StatusCode::OK).await;

    let outcome = app
        .state
        .services
        .checkout
        .verify_payment(user.id, verify_input("order_abc", "pay_def"))
        .await
        .expect("verification should succeed");

    assert!(matches!(
        outcome,
        VerificationOutcome::Verified { granted: 2, .. }
    ));
    assert_eq!(payment_count(&app).await, 1);
    assert_eq!(grant_count(&app).await, 2);

    let payment = Payment::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .remove(0);
    assert_eq!(payment.user_id, user.id);
    assert_eq!(payment.order_id, "order_abc");
    assert_eq!(payment.amount, dec!(548));

    // Cart reset to the empty shape
    let response = app
        .request(Method::GET, "/api/v1/cart", None, Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["items"], serde_json::json!([]));
    assert_eq!(body["totalItems"], 0);
    assert_eq!(body["appliedPromo"], serde_json::Value::Null);
}

#[tokio::test]
async fn charged_amount_reflects_applied_promo() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("buyer@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(1000)).await;

    let payload = cart_sync_payload(&[(&a, 1)], Some("FITNESS10"));
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    json_body(response, StatusCode::OK).await;

    app.state
        .services
        .checkout
        .verify_payment(user.id, verify_input("order_promo", "pay_promo"))
        .await
        .expect("verification should succeed");

    let payment = Payment::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .remove(0);
    assert_eq!(payment.amount, dec!(900));
}

#[tokio::test]
async fn replayed_callback_is_a_noop_success() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("buyer@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;

    let payload = cart_sync_payload(&[(&a, 1)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    json_body(response, StatusCode::OK).await;

    let first = app
        .state
        .services
        .checkout
        .verify_payment(user.id, verify_input("order_once", "pay_once"))
        .await
        .expect("first verification should succeed");
    assert!(matches!(first, VerificationOutcome::Verified { .. }));

    // Re-fill the cart to prove the replay is stopped by the payment pair,
    // not by the cart being empty.
    let payload = cart_sync_payload(&[(&a, 1)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    json_body(response, StatusCode::OK).await;

    let second = app
        .state
        .services
        .checkout
        .verify_payment(user.id, verify_input("order_once", "pay_once"))
        .await
        .expect("replay should be a no-op success");

    assert_eq!(second, VerificationOutcome::AlreadyProcessed);
    assert_eq!(payment_count(&app).await, 1);
    assert_eq!(grant_count(&app).await, 1);
}

#[tokio::test]
async fn order_creation_rejects_an_empty_cart() {
    let app = TestApp::new().await;
    let (user, _) = app.seed_user("buyer@example.com", UserRole::Standard).await;

    let result = app
        .state
        .services
        .checkout
        .create_payment_order(user.id)
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
}

#[tokio::test]
async fn verify_endpoint_returns_success_shape() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("buyer@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;

    let payload = cart_sync_payload(&[(&a, 1)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    json_body(response, StatusCode::OK).await;

    let body = serde_json::json!({
        "razorpay_order_id": "order_http",
        "razorpay_payment_id": "pay_http",
        "razorpay_signature": compute_signature(TEST_RAZORPAY_SECRET, "order_http", "pay_http"),
        "userId": user.id,
    });
    let response = app
        .request(Method::POST, "/api/v1/checkout/verify", Some(body), Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn verify_endpoint_reports_failure_shape_on_bad_signature() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("buyer@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;

    let payload = cart_sync_payload(&[(&a, 1)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    json_body(response, StatusCode::OK).await;

    let body = serde_json::json!({
        "razorpay_order_id": "order_http",
        "razorpay_payment_id": "pay_http",
        "razorpay_signature": "not-the-signature",
        "userId": user.id,
    });
    let response = app
        .request(Method::POST, "/api/v1/checkout/verify", Some(body), Some(&token))
        .await;
    let body = json_body(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
    assert_eq!(payment_count(&app).await, 0);
}

#[tokio::test]
async fn purchase_history_lists_granted_programs() {
    let app = TestApp::new().await;
    let (user, token) = app.seed_user("buyer@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;
    let b = app.seed_program("Mobility Reset", dec!(249)).await;

    let payload = cart_sync_payload(&[(&a, 1), (&b, 1)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    json_body(response, StatusCode::OK).await;

    app.state
        .services
        .checkout
        .verify_payment(user.id, verify_input("order_hist", "pay_hist"))
        .await
        .expect("verification should succeed");

    let response = app
        .request(Method::GET, "/api/v1/users/me/purchases", None, Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;

    let purchases = body.as_array().unwrap();
    assert_eq!(purchases.len(), 2);
    let titles: Vec<&str> = purchases
        .iter()
        .map(|p| p["program"]["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"Strength Foundations"));
    assert!(titles.contains(&"Mobility Reset"));
}

#[tokio::test]
async fn verify_endpoint_rejects_foreign_user_id() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("buyer@example.com", UserRole::Standard).await;

    let body = serde_json::json!({
        "razorpay_order_id": "order_http",
        "razorpay_payment_id": "pay_http",
        "razorpay_signature": compute_signature(TEST_RAZORPAY_SECRET, "order_http", "pay_http"),
        "userId": Uuid::new_v4(),
    });
    let response = app
        .request(Method::POST, "/api/v1/checkout/verify", Some(body), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
