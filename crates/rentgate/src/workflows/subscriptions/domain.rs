use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflows::accounts::UserId;

use super::pricing::{to_major_units, SubscriptionType};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// Access interval `[start_date, end_date)` bought by one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPeriod {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl SubscriptionPeriod {
    /// One calendar month; a start on the 31st ends on the last day of a
    /// shorter following month.
    pub fn one_month_from(start: DateTime<Utc>) -> Option<Self> {
        let end_date = start.checked_add_months(Months::new(1))?;
        Some(Self {
            start_date: start,
            end_date,
        })
    }
}

/// Ledger entry for one confirmed payment attempt. Amounts are kept in minor
/// units to avoid float drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: PaymentId,
    pub user: UserId,
    pub amount_minor: u64,
    pub currency: String,
    pub subscription_type: SubscriptionType,
    pub payment_intent_id: String,
    pub status: PaymentStatus,
    pub subscription_period: SubscriptionPeriod,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn view(&self) -> PaymentView {
        PaymentView {
            id: self.id.clone(),
            amount: to_major_units(self.amount_minor),
            currency: self.currency.clone(),
            subscription_type: self.subscription_type,
            payment_intent_id: self.payment_intent_id.clone(),
            status: self.status,
            subscription_period: self.subscription_period,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub id: PaymentId,
    pub amount: f64,
    pub currency: String,
    pub subscription_type: SubscriptionType,
    pub payment_intent_id: String,
    pub status: PaymentStatus,
    pub subscription_period: SubscriptionPeriod,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    #[serde(default)]
    pub subscription_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentCreated {
    pub client_secret: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    pub payment_intent_id: String,
    #[serde(default)]
    pub subscription_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub message: &'static str,
    pub subscription_expiry_date: DateTime<Utc>,
    pub payment: PaymentView,
}
