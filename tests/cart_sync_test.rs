mod common;

use axum::http::{Method, StatusCode};
use common::{cart_sync_payload, json_body, TestApp};
use peakform_api::entities::UserRole;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::str::FromStr;

fn dec_of(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected decimal value, got {other:?}"),
    }
}

#[tokio::test]
async fn get_cart_returns_empty_shape_before_first_sync() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;

    let response = app
        .request(Method::GET, "/api/v1/cart", None, Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;

    assert_eq!(body["items"], serde_json::json!([]));
    assert_eq!(body["totalItems"], 0);
    assert_eq!(dec_of(&body["totalAmount"]), Decimal::ZERO);
    assert_eq!(body["appliedPromo"], Value::Null);
    assert_eq!(dec_of(&body["discountAmount"]), Decimal::ZERO);
}

#[tokio::test]
async fn cart_requires_authentication() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/cart", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::PUT,
            "/api/v1/cart",
            Some(serde_json::json!({"items": [], "totalItems": 0, "totalAmount": 0})),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn replace_cart_persists_and_recomputes_totals() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;
    let b = app.seed_program("Mobility Reset", dec!(249)).await;

    let payload = cart_sync_payload(&[(&a, 1), (&b, 1)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;

    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["totalItems"], 2);
    assert_eq!(dec_of(&body["totalAmount"]), dec!(548));
    assert_eq!(dec_of(&body["discountAmount"]), Decimal::ZERO);

    // Echo survives a subsequent read
    let response = app
        .request(Method::GET, "/api/v1/cart", None, Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["totalItems"], 2);
    assert_eq!(dec_of(&body["totalAmount"]), dec!(548));
}

#[tokio::test]
async fn replace_cart_applies_known_promo() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;
    let b = app.seed_program("Mobility Reset", dec!(249)).await;

    let payload = cart_sync_payload(&[(&a, 1), (&b, 1)], Some("save10"));
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;

    assert_eq!(body["appliedPromo"], "SAVE10");
    assert_eq!(dec_of(&body["discountAmount"]), dec!(54.8));
}

#[tokio::test]
async fn replace_cart_silently_ignores_unknown_promo() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;

    let payload = cart_sync_payload(&[(&a, 1)], Some("BOGUS"));
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;

    assert_eq!(body["appliedPromo"], Value::Null);
    assert_eq!(dec_of(&body["discountAmount"]), Decimal::ZERO);
}

#[tokio::test]
async fn replace_cart_is_wholesale_not_a_merge() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;
    let b = app.seed_program("Mobility Reset", dec!(249)).await;

    let first = cart_sync_payload(&[(&a, 2), (&b, 1)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(first), Some(&token))
        .await;
    json_body(response, StatusCode::OK).await;

    // Second sync drops program A entirely; the server set must follow.
    let second = cart_sync_payload(&[(&b, 3)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(second), Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], b.id.to_string());
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(dec_of(&body["totalAmount"]), dec!(747));
}

#[tokio::test]
async fn price_mismatch_rejects_whole_request_and_persists_nothing() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;
    let b = app.seed_program("Mobility Reset", dec!(249)).await;

    let mut payload = cart_sync_payload(&[(&a, 1), (&b, 1)], None);
    // Tamper with program A's declared price
    payload["items"][0]["price"] = serde_json::json!("199");

    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    let body = json_body(response, StatusCode::UNPROCESSABLE_ENTITY).await;

    let invalid = body["details"]["invalid_items"].as_array().unwrap();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0]["program_id"], a.id.to_string());
    assert_eq!(dec_of(&invalid[0]["submitted"]), dec!(199));
    assert_eq!(dec_of(&invalid[0]["expected"]), dec!(299));

    // Nothing was persisted, including the valid line
    let response = app
        .request(Method::GET, "/api/v1/cart", None, Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;
    assert_eq!(body["items"], serde_json::json!([]));
    assert_eq!(body["totalItems"], 0);
}

#[tokio::test]
async fn unknown_program_id_rejects_the_request() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;

    let payload = serde_json::json!({
        "items": [{
            "id": uuid::Uuid::new_v4(),
            "title": "Ghost Program",
            "price": "100",
            "duration": "4 weeks",
            "instructor": "Nobody",
            "category": "mystery",
            "quantity": 1,
        }],
        "totalItems": 1,
        "totalAmount": "100",
        "appliedPromo": null,
        "discountAmount": "0",
    });

    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    let body = json_body(response, StatusCode::UNPROCESSABLE_ENTITY).await;

    let invalid = body["details"]["invalid_items"].as_array().unwrap();
    assert_eq!(invalid.len(), 1);
    assert!(invalid[0].get("expected").is_none());
}

#[tokio::test]
async fn non_positive_quantity_fails_schema_validation() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;

    let mut payload = cart_sync_payload(&[(&a, 1)], None);
    payload["items"][0]["quantity"] = serde_json::json!(0);

    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_declared_total_fails_schema_validation() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(299)).await;

    let mut payload = cart_sync_payload(&[(&a, 1)], None);
    payload["totalAmount"] = serde_json::json!("-1");

    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_lines_for_one_program_are_merged() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("shopper@example.com", UserRole::Standard).await;
    let a = app.seed_program("Strength Foundations", dec!(100)).await;

    let payload = cart_sync_payload(&[(&a, 1), (&a, 2)], None);
    let response = app
        .request(Method::PUT, "/api/v1/cart", Some(payload), Some(&token))
        .await;
    let body = json_body(response, StatusCode::OK).await;

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(dec_of(&body["totalAmount"]), dec!(300));
}
