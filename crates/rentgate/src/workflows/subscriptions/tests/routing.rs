use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::build_service;
use crate::workflows::accounts::Role;
use crate::workflows::subscriptions::{subscription_router, IntentStatus};
use crate::workflows::test_support::{bearer, read_json_body, token_issuer, user, MemoryUsers};

fn post_json(uri: &str, headers: &HeaderMap, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn pricing_is_public() {
    let (service, _, _) = build_service(Arc::new(MemoryUsers::default()), token_issuer());
    let router = subscription_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::get("/api/subscriptions/pricing")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["first_time"]["student"], 1.0);
    assert_eq!(payload["first_time"]["landlord"], 3.0);
    assert_eq!(payload["monthly_renewal"], 1.0);
}

#[tokio::test]
async fn create_intent_requires_authentication() {
    let (service, _, processor) =
        build_service(Arc::new(MemoryUsers::default()), token_issuer());
    let router = subscription_router(Arc::new(service));

    let response = router
        .oneshot(post_json(
            "/api/subscriptions/create-payment-intent",
            &HeaderMap::new(),
            json!({ "subscriptionType": "first_time" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(processor.requests().is_empty());
}

#[tokio::test]
async fn intent_then_unfinished_confirmation_is_rejected() {
    let issuer = token_issuer();
    let renter = user("rosa", Role::Family);
    let users = Arc::new(MemoryUsers::with(&[renter.clone()]));
    let (service, ledger, _) = build_service(users, issuer.clone());
    let router = subscription_router(Arc::new(service));
    let headers = bearer(&issuer, &renter);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/subscriptions/create-payment-intent",
            &headers,
            json!({ "subscriptionType": "first_time" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["amount"], 2.0);
    assert_eq!(payload["clientSecret"], "pi_test_1_secret_abc");

    let response = router
        .oneshot(post_json(
            "/api/subscriptions/confirm-payment",
            &headers,
            json!({ "paymentIntentId": "pi_test_1", "subscriptionType": "first_time" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], "payment_not_completed");
    assert!(ledger.entries().is_empty());
}

#[tokio::test]
async fn payment_history_lists_confirmed_payments() {
    let issuer = token_issuer();
    let renter = user("hal", Role::Student);
    let users = Arc::new(MemoryUsers::with(&[renter.clone()]));
    let (service, _, processor) = build_service(users, issuer.clone());
    let service = Arc::new(service);
    let router = subscription_router(service.clone());
    let headers = bearer(&issuer, &renter);

    service
        .create_payment_intent(&renter, Some("first_time"))
        .await
        .expect("intent created");
    processor.set_status("pi_test_1", IntentStatus::Succeeded);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/subscriptions/confirm-payment",
            &headers,
            json!({ "paymentIntentId": "pi_test_1", "subscriptionType": "first_time" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], "Payment confirmed and subscription activated");
    assert!(payload["subscriptionExpiryDate"].is_string());

    let mut request = Request::get("/api/subscriptions/payment-history");
    for (name, value) in &headers {
        request = request.header(name, value);
    }
    let response = router
        .oneshot(request.body(Body::empty()).expect("request builds"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let history = payload.as_array().expect("array");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["paymentIntentId"], "pi_test_1");
    assert_eq!(history[0]["amount"], 1.0);
}
