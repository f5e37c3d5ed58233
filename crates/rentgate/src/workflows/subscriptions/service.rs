use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::workflows::access::{AccessError, AccessGate};
use crate::workflows::accounts::{SubscriptionStatus, User, UserRepository};
use crate::workflows::http::error_response;
use crate::workflows::store::RepositoryError;

use super::domain::{
    Activation, ConfirmPaymentRequest, IntentCreated, Payment, PaymentId, PaymentStatus,
    PaymentView, SubscriptionPeriod,
};
use super::ledger::PaymentLedger;
use super::pricing::{fee_minor, to_major_units, PricingTable, SubscriptionType};
use super::processor::{
    validate_intent_id, IntentRequest, IntentStatus, PaymentProcessor, ProcessorError,
    METADATA_SUBSCRIPTION_TYPE, METADATA_USER_ID, METADATA_USER_ROLE,
};

pub const PAYMENT_HISTORY_LIMIT: usize = 10;

/// Service composing the pricing table, card processor, ledger, and
/// credential store into the subscribe-and-activate flow.
pub struct SubscriptionService<U, L, P> {
    users: Arc<U>,
    ledger: Arc<L>,
    processor: Arc<P>,
    gate: AccessGate<U>,
    currency: String,
}

impl<U, L, P> SubscriptionService<U, L, P>
where
    U: UserRepository + 'static,
    L: PaymentLedger + 'static,
    P: PaymentProcessor + 'static,
{
    pub fn new(
        users: Arc<U>,
        ledger: Arc<L>,
        processor: Arc<P>,
        gate: AccessGate<U>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            users,
            ledger,
            processor,
            gate,
            currency: currency.into().to_ascii_lowercase(),
        }
    }

    pub fn gate(&self) -> &AccessGate<U> {
        &self.gate
    }

    pub fn pricing(&self) -> PricingTable {
        PricingTable::current()
    }

    /// Ask the processor for an intent priced for the caller's role. Nothing
    /// is written locally.
    pub async fn create_payment_intent(
        &self,
        user: &User,
        subscription_type: Option<&str>,
    ) -> Result<IntentCreated, SubscriptionError> {
        let subscription_type = parse_subscription_type(subscription_type)?;
        let amount_minor = fee_minor(subscription_type, user.role);

        let mut metadata = BTreeMap::new();
        metadata.insert(METADATA_USER_ID.to_string(), user.id.0.clone());
        metadata.insert(
            METADATA_SUBSCRIPTION_TYPE.to_string(),
            subscription_type.label().to_string(),
        );
        metadata.insert(METADATA_USER_ROLE.to_string(), user.role.label().to_string());

        let intent = self
            .processor
            .create_intent(IntentRequest {
                amount_minor,
                currency: self.currency.clone(),
                metadata,
            })
            .await?;
        let client_secret = intent
            .client_secret
            .ok_or(ProcessorError::MissingClientSecret)?;

        info!(
            user_id = %user.id,
            intent_id = %intent.id,
            %subscription_type,
            amount_minor,
            "payment intent created"
        );

        Ok(IntentCreated {
            client_secret,
            amount: to_major_units(amount_minor),
        })
    }

    /// Verify a processor intent and, when it succeeded, record the payment
    /// and open a one-month subscription window starting at `now`.
    ///
    /// The ledger append and the user update are separate writes. If the
    /// second fails the payment stays recorded and
    /// `SubscriptionError::NotActivated` reports the gap.
    pub async fn confirm_payment(
        &self,
        user: &User,
        request: ConfirmPaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<Activation, SubscriptionError> {
        let intent_id = validate_intent_id(&request.payment_intent_id)
            .map_err(|err| SubscriptionError::Invalid(err.to_string()))?
            .to_string();

        if self.ledger.find_by_intent(&intent_id)?.is_some() {
            return Err(SubscriptionError::AlreadyConfirmed(intent_id));
        }

        let intent = self.processor.retrieve_intent(&intent_id).await?;

        if let Some(owner) = intent.metadata.get(METADATA_USER_ID) {
            if owner != &user.id.0 {
                warn!(user_id = %user.id, %intent_id, "intent belongs to another account");
                return Err(SubscriptionError::IntentOwnerMismatch);
            }
        }

        if !intent.succeeded() {
            return Err(SubscriptionError::PaymentNotCompleted(intent.status));
        }

        let subscription_type = resolve_subscription_type(
            request.subscription_type.as_deref(),
            intent
                .metadata
                .get(METADATA_SUBSCRIPTION_TYPE)
                .map(String::as_str),
        )?;

        let period =
            SubscriptionPeriod::one_month_from(now).ok_or(SubscriptionError::WindowOutOfRange)?;

        let payment = Payment {
            id: PaymentId::generate(),
            user: user.id.clone(),
            amount_minor: intent.amount,
            currency: intent.currency.to_ascii_uppercase(),
            subscription_type,
            payment_intent_id: intent_id.clone(),
            status: PaymentStatus::Completed,
            subscription_period: period,
            created_at: now,
        };
        let payment = self.ledger.append(payment).map_err(|err| match err {
            RepositoryError::Conflict => SubscriptionError::AlreadyConfirmed(intent_id.clone()),
            other => SubscriptionError::Repository(other),
        })?;

        if let Err(source) = self.activate(user, subscription_type, period) {
            error!(
                user_id = %user.id,
                payment_id = %payment.id.0,
                %intent_id,
                error = %source,
                "payment recorded but subscription not activated"
            );
            return Err(SubscriptionError::NotActivated {
                payment_id: payment.id,
                source,
            });
        }

        info!(
            user_id = %user.id,
            payment_id = %payment.id.0,
            %subscription_type,
            expires = %period.end_date,
            "subscription activated"
        );

        Ok(Activation {
            message: "Payment confirmed and subscription activated",
            subscription_expiry_date: period.end_date,
            payment: payment.view(),
        })
    }

    fn activate(
        &self,
        user: &User,
        subscription_type: SubscriptionType,
        period: SubscriptionPeriod,
    ) -> Result<(), RepositoryError> {
        let mut current = self
            .users
            .fetch(&user.id)?
            .ok_or(RepositoryError::NotFound)?;

        current.subscription_status = SubscriptionStatus::Active;
        current.subscription_expiry_date = Some(period.end_date);
        if subscription_type == SubscriptionType::FirstTime {
            current.first_time_payment = false;
        }

        self.users.update(current)
    }

    pub fn payment_history(&self, user: &User) -> Result<Vec<PaymentView>, SubscriptionError> {
        Ok(self
            .ledger
            .history(&user.id, PAYMENT_HISTORY_LIMIT)?
            .iter()
            .map(Payment::view)
            .collect())
    }
}

fn parse_subscription_type(raw: Option<&str>) -> Result<SubscriptionType, SubscriptionError> {
    raw.and_then(|value| value.parse().ok())
        .ok_or_else(|| SubscriptionError::Invalid("Invalid subscription type".to_string()))
}

/// The request may omit the type when the intent carries it; when both are
/// present they must agree.
fn resolve_subscription_type(
    requested: Option<&str>,
    tagged: Option<&str>,
) -> Result<SubscriptionType, SubscriptionError> {
    match (requested, tagged) {
        (Some(requested), Some(tagged)) => {
            let requested = parse_subscription_type(Some(requested))?;
            if parse_subscription_type(Some(tagged))? != requested {
                return Err(SubscriptionError::Invalid(
                    "Subscription type does not match the payment intent".to_string(),
                ));
            }
            Ok(requested)
        }
        (Some(value), None) | (None, Some(value)) => parse_subscription_type(Some(value)),
        (None, None) => parse_subscription_type(None),
    }
}

/// Error raised by the subscription service.
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("{0}")]
    Invalid(String),
    #[error("Payment not successful (processor status {0:?})")]
    PaymentNotCompleted(IntentStatus),
    #[error("payment intent {0} has already been confirmed")]
    AlreadyConfirmed(String),
    #[error("payment intent belongs to another account")]
    IntentOwnerMismatch,
    #[error("subscription window cannot be computed for this date")]
    WindowOutOfRange,
    #[error("payment {} recorded but subscription not activated: {source}", payment_id.0)]
    NotActivated {
        payment_id: PaymentId,
        source: RepositoryError,
    },
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SubscriptionError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            SubscriptionError::Access(err) => (err.status(), err.code()),
            SubscriptionError::Invalid(_)
            | SubscriptionError::Processor(ProcessorError::MalformedIntentId(_)) => {
                (StatusCode::BAD_REQUEST, "validation")
            }
            SubscriptionError::PaymentNotCompleted(_) => {
                (StatusCode::BAD_REQUEST, "payment_not_completed")
            }
            SubscriptionError::AlreadyConfirmed(_) => (StatusCode::BAD_REQUEST, "duplicate"),
            SubscriptionError::IntentOwnerMismatch => (StatusCode::FORBIDDEN, "forbidden"),
            SubscriptionError::Processor(_) => {
                (StatusCode::BAD_GATEWAY, "payment_processor_unavailable")
            }
            SubscriptionError::NotActivated { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "subscription_not_activated")
            }
            SubscriptionError::WindowOutOfRange | SubscriptionError::Repository(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl IntoResponse for SubscriptionError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        error_response(status, code, self.to_string())
    }
}
