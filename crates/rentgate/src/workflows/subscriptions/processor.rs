use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata keys attached to every intent so the processor dashboard can be
/// traced back to an account.
pub const METADATA_USER_ID: &str = "userId";
pub const METADATA_SUBSCRIPTION_TYPE: &str = "subscriptionType";
pub const METADATA_USER_ROLE: &str = "userRole";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    pub amount_minor: u64,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
}

/// Lifecycle states reported by the card processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub amount: u64,
    pub currency: String,
    pub status: IntentStatus,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PaymentIntent {
    pub fn succeeded(&self) -> bool {
        self.status == IntentStatus::Succeeded
    }
}

/// Outbound seam to the card processor. Calls are not retried.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, ProcessorError>;
    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("payment processor unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("payment processor rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("payment intent id '{0}' is malformed")]
    MalformedIntentId(String),
    #[error("payment processor returned an intent without a client secret")]
    MissingClientSecret,
}

/// Intent ids are opaque tokens made of ASCII letters, digits, and underscores.
pub fn validate_intent_id(intent_id: &str) -> Result<&str, ProcessorError> {
    let trimmed = intent_id.trim();
    let well_formed = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if well_formed {
        Ok(trimmed)
    } else {
        Err(ProcessorError::MalformedIntentId(intent_id.to_string()))
    }
}

/// Client secrets take the form `<intent id>_secret_<nonce>`.
pub fn intent_id_from_client_secret(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(intent_id, _)| intent_id)
        .filter(|intent_id| validate_intent_id(intent_id).is_ok())
}
