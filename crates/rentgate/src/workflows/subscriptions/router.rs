use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use crate::workflows::access::AccessPolicy;
use crate::workflows::accounts::UserRepository;

use super::domain::{
    Activation, ConfirmPaymentRequest, CreateIntentRequest, IntentCreated, PaymentView,
};
use super::ledger::PaymentLedger;
use super::pricing::PricingTable;
use super::processor::PaymentProcessor;
use super::service::{SubscriptionError, SubscriptionService};

/// Router builder exposing pricing, payment intents, confirmation, and history.
pub fn subscription_router<U, L, P>(service: Arc<SubscriptionService<U, L, P>>) -> Router
where
    U: UserRepository + 'static,
    L: PaymentLedger + 'static,
    P: PaymentProcessor + 'static,
{
    Router::new()
        .route(
            "/api/subscriptions/pricing",
            get(pricing_handler::<U, L, P>),
        )
        .route(
            "/api/subscriptions/create-payment-intent",
            post(create_intent_handler::<U, L, P>),
        )
        .route(
            "/api/subscriptions/confirm-payment",
            post(confirm_payment_handler::<U, L, P>),
        )
        .route(
            "/api/subscriptions/payment-history",
            get(payment_history_handler::<U, L, P>),
        )
        .with_state(service)
}

pub(crate) async fn pricing_handler<U, L, P>(
    State(service): State<Arc<SubscriptionService<U, L, P>>>,
) -> Json<PricingTable>
where
    U: UserRepository + 'static,
    L: PaymentLedger + 'static,
    P: PaymentProcessor + 'static,
{
    Json(service.pricing())
}

pub(crate) async fn create_intent_handler<U, L, P>(
    State(service): State<Arc<SubscriptionService<U, L, P>>>,
    headers: HeaderMap,
    Json(request): Json<CreateIntentRequest>,
) -> Result<Json<IntentCreated>, SubscriptionError>
where
    U: UserRepository + 'static,
    L: PaymentLedger + 'static,
    P: PaymentProcessor + 'static,
{
    let user = service
        .gate()
        .admit(&headers, AccessPolicy::AUTHENTICATED, Utc::now())?;
    let created = service
        .create_payment_intent(&user, request.subscription_type.as_deref())
        .await?;
    Ok(Json(created))
}

pub(crate) async fn confirm_payment_handler<U, L, P>(
    State(service): State<Arc<SubscriptionService<U, L, P>>>,
    headers: HeaderMap,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<Activation>, SubscriptionError>
where
    U: UserRepository + 'static,
    L: PaymentLedger + 'static,
    P: PaymentProcessor + 'static,
{
    let now = Utc::now();
    let user = service
        .gate()
        .admit(&headers, AccessPolicy::AUTHENTICATED, now)?;
    let activation = service.confirm_payment(&user, request, now).await?;
    Ok(Json(activation))
}

pub(crate) async fn payment_history_handler<U, L, P>(
    State(service): State<Arc<SubscriptionService<U, L, P>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PaymentView>>, SubscriptionError>
where
    U: UserRepository + 'static,
    L: PaymentLedger + 'static,
    P: PaymentProcessor + 'static,
{
    let user = service
        .gate()
        .admit(&headers, AccessPolicy::AUTHENTICATED, Utc::now())?;
    Ok(Json(service.payment_history(&user)?))
}
