use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::workflows::accounts::{
    Role, SubscriptionStatus, TokenIssuer, User, UserId, UserRepository,
};
use crate::workflows::store::RepositoryError;

pub(crate) const TEST_SECRET: &str = "test-signing-secret";

#[derive(Default, Clone)]
pub(crate) struct MemoryUsers {
    records: Arc<Mutex<HashMap<UserId, User>>>,
}

impl MemoryUsers {
    pub(crate) fn with(users: &[User]) -> Self {
        let repository = Self::default();
        for user in users {
            repository.insert(user.clone()).expect("seed user");
        }
        repository
    }

    pub(crate) fn get(&self, id: &UserId) -> User {
        self.records
            .lock()
            .expect("users mutex poisoned")
            .get(id)
            .cloned()
            .expect("user present")
    }
}

impl UserRepository for MemoryUsers {
    fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.records.lock().expect("users mutex poisoned");
        if guard.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("users mutex poisoned")
            .get(id)
            .cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("users mutex poisoned")
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn update(&self, user: User) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("users mutex poisoned");
        match guard.get_mut(&user.id) {
            Some(existing) => {
                *existing = user;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

/// Repository whose reads succeed but whose writes always fail.
pub(crate) struct ReadOnlyUsers(pub(crate) MemoryUsers);

impl UserRepository for ReadOnlyUsers {
    fn insert(&self, _user: User) -> Result<User, RepositoryError> {
        Err(RepositoryError::Unavailable("read-only replica".to_string()))
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.0.fetch(id)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.0.find_by_email(email)
    }

    fn update(&self, _user: User) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read-only replica".to_string()))
    }
}

pub(crate) fn user(slug: &str, role: Role) -> User {
    User {
        id: UserId(format!("user-{slug}")),
        name: format!("User {slug}"),
        email: format!("{slug}@example.com"),
        phone: "555-0100".to_string(),
        role,
        password_hash: String::new(),
        subscription_status: SubscriptionStatus::Inactive,
        subscription_expiry_date: None,
        first_time_payment: true,
        id_proof_document: None,
        profile_image: None,
        created_at: Utc::now() - Duration::days(30),
    }
}

pub(crate) fn subscribed(slug: &str, role: Role, now: DateTime<Utc>) -> User {
    User {
        subscription_status: SubscriptionStatus::Active,
        subscription_expiry_date: Some(now + Duration::days(20)),
        first_time_payment: false,
        ..user(slug, role)
    }
}

pub(crate) fn token_issuer() -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(TEST_SECRET, 1))
}

pub(crate) fn bearer(issuer: &TokenIssuer, user: &User) -> HeaderMap {
    let issued = issuer.issue(user, Utc::now()).expect("token issues");
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", issued.token)).expect("header value"),
    );
    headers
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is json")
}
