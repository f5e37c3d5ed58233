use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use rentgate::config::{AppConfig, PaymentsConfig};
use rentgate::workflows::access::AccessGate;
use rentgate::workflows::accounts::{AccountService, TokenIssuer, User, UserId, UserRepository};
use rentgate::workflows::listings::{
    InterestEntry, ListingQuery, ListingRepository, ListingService, Property, PropertyId,
};
use rentgate::workflows::store::RepositoryError;
use rentgate::workflows::subscriptions::{
    IntentRequest, IntentStatus, Payment, PaymentIntent, PaymentLedger, PaymentProcessor,
    ProcessorError, StripeProcessor, SubscriptionService,
};
use rentgate::workflows::uploads::{DiskStore, UploadService};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryUsers {
    records: Arc<Mutex<HashMap<UserId, User>>>,
}

impl UserRepository for InMemoryUsers {
    fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.records.lock().expect("user mutex poisoned");
        if guard.contains_key(&user.id) || guard.values().any(|other| other.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let guard = self.records.lock().expect("user mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let guard = self.records.lock().expect("user mutex poisoned");
        Ok(guard.values().find(|user| user.email == email).cloned())
    }

    fn update(&self, user: User) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("user mutex poisoned");
        if guard.contains_key(&user.id) {
            guard.insert(user.id.clone(), user);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}

#[derive(Default)]
struct ListingTables {
    properties: HashMap<PropertyId, Property>,
    interests: HashMap<PropertyId, Vec<InterestEntry>>,
}

/// Listing store guarded by one lock so interest check-and-insert is atomic.
#[derive(Default, Clone)]
pub(crate) struct InMemoryListings {
    tables: Arc<Mutex<ListingTables>>,
}

impl ListingRepository for InMemoryListings {
    fn insert(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = self.tables.lock().expect("listing mutex poisoned");
        if guard.properties.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .properties
            .insert(property.id.clone(), property.clone());
        Ok(property)
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let guard = self.tables.lock().expect("listing mutex poisoned");
        Ok(guard.properties.get(id).cloned())
    }

    fn fetch_owned(
        &self,
        id: &PropertyId,
        owner: &UserId,
    ) -> Result<Option<Property>, RepositoryError> {
        let guard = self.tables.lock().expect("listing mutex poisoned");
        Ok(guard
            .properties
            .get(id)
            .filter(|property| property.is_owned_by(owner))
            .cloned())
    }

    fn update(&self, property: Property) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("listing mutex poisoned");
        match guard.properties.get_mut(&property.id) {
            Some(existing) => {
                *existing = property;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_owned(&self, id: &PropertyId, owner: &UserId) -> Result<bool, RepositoryError> {
        let mut guard = self.tables.lock().expect("listing mutex poisoned");
        let owned = guard
            .properties
            .get(id)
            .is_some_and(|property| property.is_owned_by(owner));
        if owned {
            guard.properties.remove(id);
            guard.interests.remove(id);
        }
        Ok(owned)
    }

    fn search(&self, query: &ListingQuery, limit: usize) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.tables.lock().expect("listing mutex poisoned");
        Ok(query.select(guard.properties.values().cloned(), limit))
    }

    fn owned_by(&self, owner: &UserId) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.tables.lock().expect("listing mutex poisoned");
        let mut owned: Vec<Property> = guard
            .properties
            .values()
            .filter(|property| property.is_owned_by(owner))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    fn record_interest(
        &self,
        id: &PropertyId,
        entry: InterestEntry,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("listing mutex poisoned");
        if !guard.properties.contains_key(id) {
            return Err(RepositoryError::NotFound);
        }
        let entries = guard.interests.entry(id.clone()).or_default();
        if entries.iter().any(|existing| existing.user == entry.user) {
            return Err(RepositoryError::Conflict);
        }
        entries.push(entry);
        Ok(())
    }

    fn interests(&self, id: &PropertyId) -> Result<Vec<InterestEntry>, RepositoryError> {
        let guard = self.tables.lock().expect("listing mutex poisoned");
        Ok(guard.interests.get(id).cloned().unwrap_or_default())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLedger {
    payments: Arc<Mutex<Vec<Payment>>>,
}

impl PaymentLedger for InMemoryLedger {
    fn append(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let mut guard = self.payments.lock().expect("ledger mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.payment_intent_id == payment.payment_intent_id)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(payment.clone());
        Ok(payment)
    }

    fn find_by_intent(&self, intent_id: &str) -> Result<Option<Payment>, RepositoryError> {
        let guard = self.payments.lock().expect("ledger mutex poisoned");
        Ok(guard
            .iter()
            .find(|payment| payment.payment_intent_id == intent_id)
            .cloned())
    }

    fn history(&self, user: &UserId, limit: usize) -> Result<Vec<Payment>, RepositoryError> {
        let guard = self.payments.lock().expect("ledger mutex poisoned");
        let mut payments: Vec<Payment> = guard
            .iter()
            .filter(|payment| &payment.user == user)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        payments.truncate(limit);
        Ok(payments)
    }
}

/// Development stand-in for the card processor: every intent is reported
/// as already paid.
#[derive(Default)]
pub(crate) struct SimulatedProcessor {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    sequence: AtomicU64,
}

#[async_trait]
impl PaymentProcessor for SimulatedProcessor {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, ProcessorError> {
        let id = format!("pi_sim_{}", self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let intent = PaymentIntent {
            client_secret: Some(format!("{id}_secret_sim")),
            id: id.clone(),
            amount: request.amount_minor,
            currency: request.currency,
            status: IntentStatus::Succeeded,
            metadata: request.metadata,
        };
        self.intents
            .lock()
            .expect("intent mutex poisoned")
            .insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorError> {
        self.intents
            .lock()
            .expect("intent mutex poisoned")
            .get(intent_id)
            .cloned()
            .ok_or_else(|| ProcessorError::Rejected {
                status: 404,
                message: format!("No such payment_intent: '{intent_id}'"),
            })
    }
}

/// Processor chosen from configuration at startup.
pub(crate) enum ConfiguredProcessor {
    Stripe(StripeProcessor),
    Simulated(SimulatedProcessor),
}

impl ConfiguredProcessor {
    pub(crate) fn from_config(config: &PaymentsConfig) -> Result<Self, ProcessorError> {
        match &config.stripe_secret_key {
            Some(secret_key) => Ok(Self::Stripe(StripeProcessor::new(
                config.api_base.clone(),
                secret_key.clone(),
            )?)),
            None => {
                warn!("STRIPE_SECRET_KEY not set; payments use the simulated processor");
                Ok(Self::Simulated(SimulatedProcessor::default()))
            }
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Stripe(_) => "stripe",
            Self::Simulated(_) => "simulated",
        }
    }
}

#[async_trait]
impl PaymentProcessor for ConfiguredProcessor {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, ProcessorError> {
        match self {
            Self::Stripe(processor) => processor.create_intent(request).await,
            Self::Simulated(processor) => processor.create_intent(request).await,
        }
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, ProcessorError> {
        match self {
            Self::Stripe(processor) => processor.retrieve_intent(intent_id).await,
            Self::Simulated(processor) => processor.retrieve_intent(intent_id).await,
        }
    }
}

/// Every workflow service, wired to the same stores and access gate.
pub(crate) struct Marketplace {
    pub(crate) users: Arc<InMemoryUsers>,
    pub(crate) accounts: Arc<AccountService<InMemoryUsers>>,
    pub(crate) subscriptions:
        Arc<SubscriptionService<InMemoryUsers, InMemoryLedger, ConfiguredProcessor>>,
    pub(crate) listings: Arc<ListingService<InMemoryUsers, InMemoryListings>>,
    pub(crate) uploads: Arc<UploadService<InMemoryUsers>>,
}

impl Marketplace {
    pub(crate) fn in_memory(config: &AppConfig, processor: ConfiguredProcessor) -> Self {
        let users = Arc::new(InMemoryUsers::default());
        let tokens = Arc::new(TokenIssuer::new(
            &config.auth.token_secret,
            config.auth.token_ttl_hours,
        ));
        let gate = AccessGate::new(users.clone(), tokens.clone());

        Self {
            users: users.clone(),
            accounts: Arc::new(AccountService::new(users.clone(), tokens)),
            subscriptions: Arc::new(SubscriptionService::new(
                users.clone(),
                Arc::new(InMemoryLedger::default()),
                Arc::new(processor),
                gate.clone(),
                config.payments.currency.clone(),
            )),
            listings: Arc::new(ListingService::new(
                users.clone(),
                Arc::new(InMemoryListings::default()),
                gate.clone(),
            )),
            uploads: Arc::new(UploadService::new(
                users,
                DiskStore::new(&config.uploads.root_dir),
                gate,
                config.uploads.max_file_bytes,
            )),
        }
    }
}
