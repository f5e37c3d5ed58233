//! Subscription purchase: role-based pricing, processor payment intents, and
//! confirmation that appends to the ledger and opens a one-month window.

pub mod domain;
pub mod ledger;
pub mod pricing;
pub mod processor;
pub mod router;
pub mod service;
pub mod stripe;

#[cfg(test)]
mod tests;

pub use domain::{
    Activation, ConfirmPaymentRequest, CreateIntentRequest, IntentCreated, Payment, PaymentId,
    PaymentStatus, PaymentView, SubscriptionPeriod,
};
pub use ledger::PaymentLedger;
pub use pricing::{fee_minor, first_time_fee_minor, PricingTable, SubscriptionType};
pub use processor::{
    intent_id_from_client_secret, IntentRequest, IntentStatus, PaymentIntent, PaymentProcessor,
    ProcessorError,
};
pub use router::subscription_router;
pub use service::{SubscriptionError, SubscriptionService, PAYMENT_HISTORY_LIMIT};
pub use stripe::StripeProcessor;
