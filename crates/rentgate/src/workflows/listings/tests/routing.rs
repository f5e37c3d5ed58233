use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::{build_service, listing_json};
use crate::workflows::accounts::{Role, User};
use crate::workflows::listings::listing_router;
use crate::workflows::test_support::{
    bearer, read_json_body, subscribed, token_issuer, user, MemoryUsers,
};

fn request(method: &str, uri: &str, headers: &HeaderMap, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    let built = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    built.expect("request builds")
}

struct Harness {
    router: Router,
    headers: Vec<HeaderMap>,
}

fn harness(users: &[User]) -> Harness {
    let issuer = token_issuer();
    let repository = Arc::new(MemoryUsers::with(users));
    let (service, _) = build_service(repository, issuer.clone());
    Harness {
        router: listing_router(Arc::new(service)),
        headers: users.iter().map(|user| bearer(&issuer, user)).collect(),
    }
}

#[tokio::test]
async fn browse_requires_an_active_subscription() {
    let lapsed = user("lapsed", Role::Student);
    let Harness { router, headers } = harness(&[lapsed]);

    let response = router
        .oneshot(request("GET", "/api/properties", &headers[0], None))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], "subscription_required");
}

#[tokio::test]
async fn renters_cannot_create_listings() {
    let renter = subscribed("ren", Role::Family, Utc::now());
    let Harness { router, headers } = harness(&[renter]);

    let response = router
        .oneshot(request(
            "POST",
            "/api/properties",
            &headers[0],
            Some(listing_json("Flat", 900.0, 0.0, 0.0)),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let payload = read_json_body(response).await;
    assert_eq!(payload["code"], "forbidden");
}

#[tokio::test]
async fn landlord_creates_and_subscriber_reads_listing() {
    let now = Utc::now();
    let landlord = subscribed("land", Role::Landlord, now);
    let renter = subscribed("ren", Role::Student, now);
    let Harness { router, headers } = harness(&[landlord, renter]);

    let response = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/properties",
            &headers[0],
            Some(listing_json("Garden flat", 900.0, -0.2, 5.6)),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["message"], "Property created successfully");
    let id = payload["property"]["id"]
        .as_str()
        .expect("id present")
        .to_string();

    let response = router
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/properties/{id}"),
            &headers[1],
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["title"], "Garden flat");
    assert_eq!(payload["owner"]["email"], "land@example.com");
    assert!(payload["owner"].get("passwordHash").is_none());

    let response = router
        .oneshot(request(
            "GET",
            "/api/properties?propertyType=apartment&maxPrice=1000",
            &headers[1],
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn invalid_listing_reports_field_errors() {
    let landlord = subscribed("land", Role::Landlord, Utc::now());
    let Harness { router, headers } = harness(&[landlord]);

    let response = router
        .oneshot(request(
            "POST",
            "/api/properties",
            &headers[0],
            Some(json!({ "title": "Nameless" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    let errors = payload["errors"].as_array().expect("errors array");
    assert!(errors
        .iter()
        .any(|error| error["field"] == "location.coordinates"));
}

#[tokio::test]
async fn foreign_update_looks_like_missing_listing() {
    let now = Utc::now();
    let owner = subscribed("own", Role::Landlord, now);
    let other = subscribed("other", Role::Landlord, now);
    let Harness { router, headers } = harness(&[owner, other]);

    let response = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/properties",
            &headers[0],
            Some(listing_json("Mine", 500.0, 0.0, 0.0)),
        ))
        .await
        .expect("route executes");
    let id = read_json_body(response).await["property"]["id"]
        .as_str()
        .expect("id present")
        .to_string();

    let edit = json!({ "rentPrice": 1 });
    let foreign = router
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/properties/{id}"),
            &headers[1],
            Some(edit.clone()),
        ))
        .await
        .expect("route executes");
    let missing = router
        .oneshot(request(
            "PUT",
            "/api/properties/unknown-id",
            &headers[1],
            Some(edit),
        ))
        .await
        .expect("route executes");

    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    assert_eq!(foreign.status(), missing.status());
    assert_eq!(read_json_body(foreign).await, read_json_body(missing).await);
}

#[tokio::test]
async fn landlords_cannot_express_interest() {
    let landlord = subscribed("land", Role::Landlord, Utc::now());
    let Harness { router, headers } = harness(&[landlord]);

    let response = router
        .oneshot(request(
            "POST",
            "/api/properties/any-id/interest",
            &headers[0],
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_browse_filters_report_field_errors() {
    let renter = subscribed("ren", Role::Student, Utc::now());
    let Harness { router, headers } = harness(&[renter]);

    let response = router
        .oneshot(request(
            "GET",
            "/api/properties?propertyType=castle&minPrice=abc&bedrooms=two",
            &headers[0],
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    let fields: Vec<&str> = payload["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|error| error["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["propertyType", "minPrice", "bedrooms"]);
}

#[tokio::test]
async fn numeric_house_number_is_accepted() {
    let landlord = subscribed("land", Role::Landlord, Utc::now());
    let Harness { router, headers } = harness(&[landlord]);

    let mut body = listing_json("Corner house", 1100.0, 0.0, 0.0);
    body["houseNumber"] = json!(14);
    let response = router
        .oneshot(request("POST", "/api/properties", &headers[0], Some(body)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["property"]["houseNumber"], "14");
}

#[tokio::test]
async fn mistyped_listing_lists_every_violation() {
    let landlord = subscribed("land", Role::Landlord, Utc::now());
    let Harness { router, headers } = harness(&[landlord]);

    let response = router
        .oneshot(request(
            "POST",
            "/api/properties",
            &headers[0],
            Some(json!({ "photos": "not-a-list" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    let fields: Vec<&str> = payload["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|error| error["field"].as_str())
        .collect();
    assert_eq!(
        fields,
        vec![
            "title",
            "description",
            "houseNumber",
            "address.street",
            "address.city",
            "address.region",
            "rentPrice",
            "propertyType",
            "bedrooms",
            "bathrooms",
            "location.coordinates",
            "photos",
        ]
    );
}
