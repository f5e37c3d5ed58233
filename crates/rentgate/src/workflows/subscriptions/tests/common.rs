use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::workflows::access::AccessGate;
use crate::workflows::accounts::{TokenIssuer, UserId, UserRepository};
use crate::workflows::store::RepositoryError;
use crate::workflows::subscriptions::{
    IntentRequest, IntentStatus, Payment, PaymentIntent, PaymentLedger, PaymentProcessor,
    ProcessorError, SubscriptionService,
};

#[derive(Default, Clone)]
pub(super) struct MemoryLedger {
    entries: Arc<Mutex<Vec<Payment>>>,
}

impl MemoryLedger {
    pub(super) fn entries(&self) -> Vec<Payment> {
        self.entries.lock().expect("ledger mutex poisoned").clone()
    }
}

impl PaymentLedger for MemoryLedger {
    fn append(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let mut guard = self.entries.lock().expect("ledger mutex poisoned");
        if guard
            .iter()
            .any(|entry| entry.payment_intent_id == payment.payment_intent_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(payment.clone());
        Ok(payment)
    }

    fn find_by_intent(&self, intent_id: &str) -> Result<Option<Payment>, RepositoryError> {
        Ok(self
            .entries
            .lock()
            .expect("ledger mutex poisoned")
            .iter()
            .find(|entry| entry.payment_intent_id == intent_id)
            .cloned())
    }

    fn history(&self, user: &UserId, limit: usize) -> Result<Vec<Payment>, RepositoryError> {
        let guard = self.entries.lock().expect("ledger mutex poisoned");
        let mut entries: Vec<Payment> = guard
            .iter()
            .filter(|entry| &entry.user == user)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);
        Ok(entries)
    }
}

/// Processor double that records requests and lets tests move intents
/// between states.
#[derive(Default)]
pub(super) struct ScriptedProcessor {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    requests: Mutex<Vec<IntentRequest>>,
    sequence: AtomicU64,
    offline: AtomicBool,
}

impl ScriptedProcessor {
    pub(super) fn requests(&self) -> Vec<IntentRequest> {
        self.requests.lock().expect("requests mutex poisoned").clone()
    }

    pub(super) fn set_status(&self, intent_id: &str, status: IntentStatus) {
        let mut guard = self.intents.lock().expect("intents mutex poisoned");
        guard.get_mut(intent_id).expect("intent exists").status = status;
    }

    pub(super) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), ProcessorError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ProcessorError::Rejected {
                status: 503,
                message: "processor offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProcessor for ScriptedProcessor {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, ProcessorError> {
        self.check_online()?;
        let id = format!("pi_test_{}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1);
        let intent = PaymentIntent {
            id: id.clone(),
            client_secret: Some(format!("{id}_secret_abc")),
            amount: request.amount_minor,
            currency: request.currency.clone(),
            status: IntentStatus::RequiresPaymentMethod,
            metadata: request.metadata.clone(),
        };
        self.requests
            .lock()
            .expect("requests mutex poisoned")
            .push(request);
        self.intents
            .lock()
            .expect("intents mutex poisoned")
            .insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorError> {
        self.check_online()?;
        self.intents
            .lock()
            .expect("intents mutex poisoned")
            .get(intent_id)
            .cloned()
            .ok_or_else(|| ProcessorError::Rejected {
                status: 404,
                message: format!("No such payment_intent: '{intent_id}'"),
            })
    }
}

pub(super) fn build_service<U>(
    users: Arc<U>,
    issuer: Arc<TokenIssuer>,
) -> (
    SubscriptionService<U, MemoryLedger, ScriptedProcessor>,
    MemoryLedger,
    Arc<ScriptedProcessor>,
)
where
    U: UserRepository + 'static,
{
    let ledger = MemoryLedger::default();
    let processor = Arc::new(ScriptedProcessor::default());
    let gate = AccessGate::new(users.clone(), issuer);
    let service = SubscriptionService::new(
        users,
        Arc::new(ledger.clone()),
        processor.clone(),
        gate,
        "usd",
    );
    (service, ledger, processor)
}
