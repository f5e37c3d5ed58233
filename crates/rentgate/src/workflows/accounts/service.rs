use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::workflows::access::{AccessError, AccessGate};
use crate::workflows::http::{error_response, field_errors_response, summarize, FieldError};
use crate::workflows::store::RepositoryError;

use super::credentials::{hash_password, verify_password, CredentialError, TokenIssuer};
use super::domain::{
    LoginRequest, RegistrationRequest, Role, Session, SubscriptionStatus, User, UserId,
};
use super::repository::UserRepository;

const MIN_PASSWORD_LEN: usize = 6;

/// Registration and login on top of the credential store.
pub struct AccountService<U> {
    users: Arc<U>,
    gate: AccessGate<U>,
}

impl<U> AccountService<U>
where
    U: UserRepository + 'static,
{
    pub fn new(users: Arc<U>, tokens: Arc<TokenIssuer>) -> Self {
        let gate = AccessGate::new(users.clone(), tokens);
        Self { users, gate }
    }

    pub fn gate(&self) -> &AccessGate<U> {
        &self.gate
    }

    /// Create an account with no subscription and hand back a session.
    pub fn register(
        &self,
        request: RegistrationRequest,
        now: DateTime<Utc>,
    ) -> Result<Session, AccountError> {
        let candidate = validate_registration(request)?;

        if self.users.find_by_email(&candidate.email)?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let user = User {
            id: UserId::generate(),
            name: candidate.name,
            email: candidate.email,
            phone: candidate.phone,
            role: candidate.role,
            password_hash: hash_password(&candidate.password)?,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_expiry_date: None,
            first_time_payment: true,
            id_proof_document: None,
            profile_image: None,
            created_at: now,
        };

        let stored = self.users.insert(user).map_err(|err| match err {
            RepositoryError::Conflict => AccountError::EmailTaken,
            other => AccountError::Repository(other),
        })?;
        info!(user_id = %stored.id, role = %stored.role, "account registered");

        self.session_for(&stored, now)
    }

    /// Unknown e-mail and wrong password fail identically.
    pub fn login(
        &self,
        request: LoginRequest,
        now: DateTime<Utc>,
    ) -> Result<Session, AccountError> {
        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_by_email(&email)?
            .filter(|user| verify_password(&request.password, &user.password_hash))
            .ok_or(AccountError::InvalidCredentials)?;

        self.session_for(&user, now)
    }

    fn session_for(&self, user: &User, now: DateTime<Utc>) -> Result<Session, AccountError> {
        let issued = self.gate.tokens().issue(user, now)?;
        Ok(Session {
            token: issued.token,
            expires_at: issued.expires_at,
            user: user.view(now),
        })
    }
}

struct RegistrationCandidate {
    name: String,
    email: String,
    password: String,
    role: Role,
    phone: String,
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn validate_registration(
    request: RegistrationRequest,
) -> Result<RegistrationCandidate, AccountError> {
    let mut errors = Vec::new();

    let name = present(request.name);
    if name.is_none() {
        errors.push(FieldError::new("name", "Name is required"));
    }

    let email = present(request.email)
        .map(|email| normalize_email(&email))
        .filter(|email| looks_like_email(email));
    if email.is_none() {
        errors.push(FieldError::new("email", "Valid email is required"));
    }

    let password = request
        .password
        .filter(|password| password.chars().count() >= MIN_PASSWORD_LEN);
    if password.is_none() {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters",
        ));
    }

    let role = request.role.and_then(|role| role.parse::<Role>().ok());
    if role.is_none() {
        errors.push(FieldError::new("role", "Valid role is required"));
    }

    let phone = present(request.phone);
    if phone.is_none() {
        errors.push(FieldError::new("phone", "Phone number is required"));
    }

    match (name, email, password, role, phone) {
        (Some(name), Some(email), Some(password), Some(role), Some(phone)) => {
            Ok(RegistrationCandidate {
                name,
                email,
                password,
                role,
                phone,
            })
        }
        _ => Err(AccountError::Invalid(errors)),
    }
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid registration: {}", summarize(.0))]
    Invalid(Vec<FieldError>),
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        match self {
            AccountError::Invalid(errors) => field_errors_response(errors),
            AccountError::EmailTaken => {
                error_response(StatusCode::CONFLICT, "email_taken", self.to_string())
            }
            AccountError::InvalidCredentials => {
                error_response(StatusCode::UNAUTHORIZED, "unauthenticated", self.to_string())
            }
            AccountError::Access(err) => err.into_response(),
            AccountError::Credential(_) | AccountError::Repository(_) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                self.to_string(),
            ),
        }
    }
}
