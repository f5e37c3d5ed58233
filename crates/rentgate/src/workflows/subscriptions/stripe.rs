use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::processor::{
    validate_intent_id, IntentRequest, PaymentIntent, PaymentProcessor, ProcessorError,
};

/// Stripe payment-intents client speaking the form-encoded v1 API.
#[derive(Clone)]
pub struct StripeProcessor {
    client: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl StripeProcessor {
    pub fn new(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, ProcessorError> {
        let client = Client::builder()
            .user_agent(concat!("rentgate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_base, path)
    }

    async fn decode(response: Response) -> Result<PaymentIntent, ProcessorError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<PaymentIntent>().await?);
        }

        let body = response.text().await?;
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|envelope| envelope.error.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        Err(ProcessorError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PaymentProcessor for StripeProcessor {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, ProcessorError> {
        let mut form = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            ("currency".to_string(), request.currency.clone()),
        ];
        form.extend(
            request
                .metadata
                .iter()
                .map(|(key, value)| (format!("metadata[{key}]"), value.clone())),
        );

        debug!(
            amount = request.amount_minor,
            currency = %request.currency,
            "creating payment intent"
        );
        let response = self
            .client
            .post(self.url("payment_intents"))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorError> {
        let intent_id = validate_intent_id(intent_id)?;
        let response = self
            .client
            .get(self.url(&format!("payment_intents/{intent_id}")))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        Self::decode(response).await
    }
}
