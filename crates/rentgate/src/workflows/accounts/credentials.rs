use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::domain::{Role, User, UserId};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token rejected: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| CredentialError::Hash(err.to_string()))
}

/// Malformed stored hashes verify as false rather than erroring.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    iat: u64,
    exp: u64,
}

/// Signed bearer token plus the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 issuer/verifier for bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, CredentialError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id.0.clone(),
            role: user.role,
            iat: unix_seconds(now),
            exp: unix_seconds(expires_at),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature and expiry, returning the subject.
    pub fn verify(&self, token: &str) -> Result<UserId, CredentialError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(UserId(data.claims.sub))
    }
}

fn unix_seconds(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::accounts::domain::SubscriptionStatus;

    fn landlord() -> User {
        User {
            id: UserId("landlord-7".to_string()),
            name: "Lee".to_string(),
            email: "lee@example.com".to_string(),
            phone: "555-0107".to_string(),
            role: Role::Landlord,
            password_hash: String::new(),
            subscription_status: SubscriptionStatus::Inactive,
            subscription_expiry_date: None,
            first_time_payment: true,
            id_proof_document: None,
            profile_image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_verifies_only_the_original_password() {
        let hash = hash_password("hunter22").expect("hashes");
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("hunter22"));
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[test]
    fn issued_token_round_trips_subject() {
        let issuer = TokenIssuer::new("secret", 1);
        let issued = issuer.issue(&landlord(), Utc::now()).expect("token issues");
        assert_eq!(
            issuer.verify(&issued.token).expect("token verifies"),
            UserId("landlord-7".to_string())
        );
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new("secret", 1);
        let issued = issuer
            .issue(&landlord(), Utc::now() - Duration::days(2))
            .expect("token issues");
        assert!(issuer.verify(&issued.token).is_err());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let issued = TokenIssuer::new("secret-a", 1)
            .issue(&landlord(), Utc::now())
            .expect("token issues");
        assert!(TokenIssuer::new("secret-b", 1).verify(&issued.token).is_err());
    }
}
