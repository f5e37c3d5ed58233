use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};

use crate::workflows::accounts::{Role, SubscriptionStatus, User};
use crate::workflows::http::error_response;
use crate::workflows::store::RepositoryError;

/// Reasons the gate turns a request away. Authentication, subscription, and
/// role failures stay distinct so clients can react differently.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("authentication required")]
    MissingCredential,
    #[error("invalid or expired credential")]
    InvalidCredential,
    #[error("an active subscription is required")]
    SubscriptionInactive,
    #[error("subscription expired on {0}")]
    SubscriptionExpired(DateTime<Utc>),
    #[error("role {0} is not permitted to perform this action")]
    RoleNotPermitted(Role),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AccessError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccessError::MissingCredential | AccessError::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            AccessError::SubscriptionInactive
            | AccessError::SubscriptionExpired(_)
            | AccessError::RoleNotPermitted(_) => StatusCode::FORBIDDEN,
            AccessError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AccessError::MissingCredential | AccessError::InvalidCredential => "unauthenticated",
            AccessError::SubscriptionInactive | AccessError::SubscriptionExpired(_) => {
                "subscription_required"
            }
            AccessError::RoleNotPermitted(_) => "forbidden",
            AccessError::Repository(_) => "storage_unavailable",
        }
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.code(), self.to_string())
    }
}

/// Passes only when the flag reads active and the window is still open.
pub fn require_active_subscription(user: &User, now: DateTime<Utc>) -> Result<(), AccessError> {
    if user.subscription_status != SubscriptionStatus::Active {
        return Err(AccessError::SubscriptionInactive);
    }
    match user.subscription_expiry_date {
        Some(expiry) if expiry > now => Ok(()),
        Some(expiry) => Err(AccessError::SubscriptionExpired(expiry)),
        None => Err(AccessError::SubscriptionInactive),
    }
}

pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), AccessError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AccessError::RoleNotPermitted(user.role))
    }
}

/// Checks applied after authentication, in order: subscription, then role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    pub subscription: bool,
    pub roles: Option<&'static [Role]>,
}

impl AccessPolicy {
    pub const AUTHENTICATED: AccessPolicy = AccessPolicy {
        subscription: false,
        roles: None,
    };

    pub const SUBSCRIBED: AccessPolicy = AccessPolicy {
        subscription: true,
        roles: None,
    };

    pub const SUBSCRIBED_LANDLORD: AccessPolicy = AccessPolicy {
        subscription: true,
        roles: Some(Role::LANDLORDS),
    };

    pub const SUBSCRIBED_RENTER: AccessPolicy = AccessPolicy {
        subscription: true,
        roles: Some(Role::RENTERS),
    };

    pub fn evaluate(&self, user: &User, now: DateTime<Utc>) -> Result<(), AccessError> {
        if self.subscription {
            require_active_subscription(user, now)?;
        }
        if let Some(roles) = self.roles {
            require_role(user, roles)?;
        }
        Ok(())
    }
}
