use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::workflows::access::AccessPolicy;
use crate::workflows::accounts::UserRepository;

use super::domain::{ListingView, OwnedListingView, PropertyId};
use super::filter::BrowseParams;
use super::repository::ListingRepository;
use super::service::{ListingError, ListingService};
use super::validation::PropertySubmission;

/// Router builder exposing listing CRUD, browse, interest, and the
/// landlord's own listings.
pub fn listing_router<U, L>(service: Arc<ListingService<U, L>>) -> Router
where
    U: UserRepository + 'static,
    L: ListingRepository + 'static,
{
    Router::new()
        .route(
            "/api/properties",
            get(browse_handler::<U, L>).post(create_handler::<U, L>),
        )
        .route(
            "/api/properties/my/properties",
            get(owned_handler::<U, L>),
        )
        .route(
            "/api/properties/:property_id",
            get(detail_handler::<U, L>)
                .put(update_handler::<U, L>)
                .delete(delete_handler::<U, L>),
        )
        .route(
            "/api/properties/:property_id/interest",
            post(interest_handler::<U, L>),
        )
        .with_state(service)
}

pub(crate) async fn browse_handler<U, L>(
    State(service): State<Arc<ListingService<U, L>>>,
    headers: HeaderMap,
    Query(params): Query<BrowseParams>,
) -> Result<Json<Vec<ListingView>>, ListingError>
where
    U: UserRepository + 'static,
    L: ListingRepository + 'static,
{
    service
        .gate()
        .admit(&headers, AccessPolicy::SUBSCRIBED, Utc::now())?;
    Ok(Json(service.browse(params)?))
}

pub(crate) async fn detail_handler<U, L>(
    State(service): State<Arc<ListingService<U, L>>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Json<ListingView>, ListingError>
where
    U: UserRepository + 'static,
    L: ListingRepository + 'static,
{
    service
        .gate()
        .admit(&headers, AccessPolicy::SUBSCRIBED, Utc::now())?;
    Ok(Json(service.get(&PropertyId(property_id))?))
}

pub(crate) async fn create_handler<U, L>(
    State(service): State<Arc<ListingService<U, L>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ListingError>
where
    U: UserRepository + 'static,
    L: ListingRepository + 'static,
{
    let now = Utc::now();
    let owner = service
        .gate()
        .admit(&headers, AccessPolicy::SUBSCRIBED_LANDLORD, now)?;
    let submission = PropertySubmission::from_json(body).map_err(ListingError::Invalid)?;
    let property = service.create(&owner, submission, now)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Property created successfully",
            "property": property,
        })),
    ))
}

pub(crate) async fn update_handler<U, L>(
    State(service): State<Arc<ListingService<U, L>>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ListingError>
where
    U: UserRepository + 'static,
    L: ListingRepository + 'static,
{
    let now = Utc::now();
    let owner = service
        .gate()
        .admit(&headers, AccessPolicy::SUBSCRIBED_LANDLORD, now)?;
    let submission = PropertySubmission::from_json(body).map_err(ListingError::Invalid)?;
    let property = service.update(&owner, &PropertyId(property_id), submission, now)?;
    Ok(Json(json!({
        "message": "Property updated successfully",
        "property": property,
    })))
}

pub(crate) async fn delete_handler<U, L>(
    State(service): State<Arc<ListingService<U, L>>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Json<Value>, ListingError>
where
    U: UserRepository + 'static,
    L: ListingRepository + 'static,
{
    let owner = service
        .gate()
        .admit(&headers, AccessPolicy::SUBSCRIBED_LANDLORD, Utc::now())?;
    service.delete(&owner, &PropertyId(property_id))?;
    Ok(Json(json!({ "message": "Property deleted successfully" })))
}

pub(crate) async fn owned_handler<U, L>(
    State(service): State<Arc<ListingService<U, L>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OwnedListingView>>, ListingError>
where
    U: UserRepository + 'static,
    L: ListingRepository + 'static,
{
    let owner = service
        .gate()
        .admit(&headers, AccessPolicy::SUBSCRIBED_LANDLORD, Utc::now())?;
    Ok(Json(service.owned_listings(&owner)?))
}

pub(crate) async fn interest_handler<U, L>(
    State(service): State<Arc<ListingService<U, L>>>,
    headers: HeaderMap,
    Path(property_id): Path<String>,
) -> Result<Json<Value>, ListingError>
where
    U: UserRepository + 'static,
    L: ListingRepository + 'static,
{
    let now = Utc::now();
    let renter = service
        .gate()
        .admit(&headers, AccessPolicy::SUBSCRIBED_RENTER, now)?;
    service.express_interest(&renter, &PropertyId(property_id), now)?;
    Ok(Json(json!({ "message": "Interest expressed successfully" })))
}
