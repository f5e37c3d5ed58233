use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use crate::workflows::access::AccessPolicy;

use super::domain::{LoginRequest, RegistrationRequest, Session, UserView};
use super::repository::UserRepository;
use super::service::{AccountError, AccountService};

/// Router builder exposing registration, login, and the current-user view.
pub fn account_router<U>(service: Arc<AccountService<U>>) -> Router
where
    U: UserRepository + 'static,
{
    Router::new()
        .route("/api/auth/register", post(register_handler::<U>))
        .route("/api/auth/login", post(login_handler::<U>))
        .route("/api/auth/me", get(me_handler::<U>))
        .with_state(service)
}

pub(crate) async fn register_handler<U>(
    State(service): State<Arc<AccountService<U>>>,
    Json(request): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<Session>), AccountError>
where
    U: UserRepository + 'static,
{
    let session = service.register(request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub(crate) async fn login_handler<U>(
    State(service): State<Arc<AccountService<U>>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>, AccountError>
where
    U: UserRepository + 'static,
{
    Ok(Json(service.login(request, Utc::now())?))
}

pub(crate) async fn me_handler<U>(
    State(service): State<Arc<AccountService<U>>>,
    headers: HeaderMap,
) -> Result<Json<UserView>, AccountError>
where
    U: UserRepository + 'static,
{
    let now = Utc::now();
    let user = service
        .gate()
        .admit(&headers, AccessPolicy::AUTHENTICATED, now)?;
    Ok(Json(user.view(now)))
}
