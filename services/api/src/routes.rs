use std::io::ErrorKind;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use rentgate::workflows::accounts::account_router;
use rentgate::workflows::listings::listing_router;
use rentgate::workflows::subscriptions::subscription_router;
use rentgate::workflows::uploads::{upload_router, DiskStore};
use serde_json::json;
use tracing::warn;

use crate::infra::{AppState, Marketplace};

/// Every API router plus operational endpoints and static upload serving.
pub(crate) fn marketplace_routes(marketplace: &Marketplace) -> Router {
    let uploads = Router::new()
        .route("/uploads/*path", get(serve_upload))
        .with_state(Arc::new(marketplace.uploads.store().clone()));

    account_router(marketplace.accounts.clone())
        .merge(subscription_router(marketplace.subscriptions.clone()))
        .merge(listing_router(marketplace.listings.clone()))
        .merge(upload_router(marketplace.uploads.clone()))
        .merge(uploads)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn serve_upload(
    State(store): State<Arc<DiskStore>>,
    Path(path): Path<String>,
) -> Response {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "File not found", "code": "not_found" })),
        )
            .into_response()
    };

    let Some(location) = store.locate(&path) else {
        return not_found();
    };

    match tokio::fs::read(&location).await {
        Ok(bytes) => {
            let content_type = mime_guess::from_path(&location).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type.essence_str().to_string())],
                bytes,
            )
                .into_response()
        }
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
            not_found()
        }
        Err(err) => {
            warn!(path = %location.display(), error = %err, "upload read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Could not read file", "code": "internal" })),
            )
                .into_response()
        }
    }
}
