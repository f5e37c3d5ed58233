use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use crate::workflows::access::AccessPolicy;
use crate::workflows::accounts::UserRepository;

use super::domain::{DocumentUploaded, MediaUploaded, ProfileImageUploaded, UploadCategory};
use super::intake::read_files;
use super::service::{UploadError, UploadService};

/// Router builder exposing the three multipart upload endpoints.
pub fn upload_router<U>(service: Arc<UploadService<U>>) -> Router
where
    U: UserRepository + 'static,
{
    let limit = |category: UploadCategory| DefaultBodyLimit::max(service.body_limit(category));
    Router::new()
        .route(
            "/api/upload/property-media",
            post(property_media_handler::<U>).layer(limit(UploadCategory::PropertyMedia)),
        )
        .route(
            "/api/upload/id-proof",
            post(id_proof_handler::<U>).layer(limit(UploadCategory::IdDocument)),
        )
        .route(
            "/api/upload/profile-image",
            post(profile_image_handler::<U>).layer(limit(UploadCategory::ProfileImage)),
        )
        .with_state(service)
}

pub(crate) async fn property_media_handler<U>(
    State(service): State<Arc<UploadService<U>>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<MediaUploaded>, UploadError>
where
    U: UserRepository + 'static,
{
    let user = service
        .gate()
        .admit(&headers, AccessPolicy::AUTHENTICATED, Utc::now())?;
    let files = read_files(
        multipart,
        service.store(),
        UploadCategory::PropertyMedia,
        service.max_file_bytes(),
    )
    .await?;
    Ok(Json(service.upload_property_media(&user, files).await?))
}

pub(crate) async fn id_proof_handler<U>(
    State(service): State<Arc<UploadService<U>>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<DocumentUploaded>, UploadError>
where
    U: UserRepository + 'static,
{
    let user = service
        .gate()
        .admit(&headers, AccessPolicy::AUTHENTICATED, Utc::now())?;
    let files = read_files(
        multipart,
        service.store(),
        UploadCategory::IdDocument,
        service.max_file_bytes(),
    )
    .await?;
    Ok(Json(service.upload_id_document(&user, files).await?))
}

pub(crate) async fn profile_image_handler<U>(
    State(service): State<Arc<UploadService<U>>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<ProfileImageUploaded>, UploadError>
where
    U: UserRepository + 'static,
{
    let user = service
        .gate()
        .admit(&headers, AccessPolicy::AUTHENTICATED, Utc::now())?;
    let files = read_files(
        multipart,
        service.store(),
        UploadCategory::ProfileImage,
        service.max_file_bytes(),
    )
    .await?;
    Ok(Json(service.upload_profile_image(&user, files).await?))
}
