use std::sync::Arc;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::workflows::accounts::{TokenIssuer, User, UserRepository};

use super::guards::{AccessError, AccessPolicy};

/// Resolves bearer credentials to users and runs the policy chain on them.
pub struct AccessGate<U> {
    users: Arc<U>,
    tokens: Arc<TokenIssuer>,
}

impl<U> Clone for AccessGate<U> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl<U> AccessGate<U>
where
    U: UserRepository + 'static,
{
    pub fn new(users: Arc<U>, tokens: Arc<TokenIssuer>) -> Self {
        Self { users, tokens }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<User, AccessError> {
        let token = bearer_token(headers)?;
        let user_id = self.tokens.verify(token).map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            AccessError::InvalidCredential
        })?;

        self.users
            .fetch(&user_id)?
            .ok_or(AccessError::InvalidCredential)
    }

    /// Authentication followed by the policy checks; stops at the first failure.
    pub fn admit(
        &self,
        headers: &HeaderMap,
        policy: AccessPolicy,
        now: DateTime<Utc>,
    ) -> Result<User, AccessError> {
        let user = self.authenticate(headers)?;
        policy.evaluate(&user, now)?;
        Ok(user)
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AccessError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AccessError::MissingCredential)?
        .to_str()
        .map_err(|_| AccessError::InvalidCredential)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AccessError::InvalidCredential)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AccessError::InvalidCredential);
    }
    Ok(token.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers).expect("token"), "abc.def.ghi");
    }

    #[test]
    fn missing_and_malformed_headers_are_distinguished() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers),
            Err(AccessError::MissingCredential)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert!(matches!(
            bearer_token(&headers),
            Err(AccessError::InvalidCredential)
        ));
    }
}
