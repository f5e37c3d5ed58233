use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for registered users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marketplace role chosen at registration. Drives pricing and which
/// listing operations a user may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    GovernmentWorker,
    Family,
    Landlord,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Student,
        Role::GovernmentWorker,
        Role::Family,
        Role::Landlord,
    ];

    /// Roles that browse and express interest rather than list.
    pub const RENTERS: &'static [Role] = &[Role::Student, Role::GovernmentWorker, Role::Family];

    pub const LANDLORDS: &'static [Role] = &[Role::Landlord];

    pub fn label(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::GovernmentWorker => "government_worker",
            Role::Family => "family",
            Role::Landlord => "landlord",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.label() == value.trim())
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Inactive,
    Active,
    Expired,
}

impl SubscriptionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
        }
    }
}

/// Stored account. The password only ever exists here as an argon2 PHC string.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub password_hash: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_expiry_date: Option<DateTime<Utc>>,
    pub first_time_payment: bool,
    pub id_proof_document: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Stored status corrected for the clock: an "active" flag whose window
    /// has closed reads as expired.
    pub fn effective_subscription(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        match (self.subscription_status, self.subscription_expiry_date) {
            (SubscriptionStatus::Active, Some(expiry)) if expiry > now => {
                SubscriptionStatus::Active
            }
            (SubscriptionStatus::Active, _) => SubscriptionStatus::Expired,
            (status, _) => status,
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> UserView {
        UserView {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            subscription_status: self.effective_subscription(now),
            subscription_expiry_date: self.subscription_expiry_date,
            first_time_payment: self.first_time_payment,
            id_proof_document: self.id_proof_document.clone(),
            profile_image: self.profile_image.clone(),
            created_at: self.created_at,
        }
    }

    pub fn owner_contact(&self) -> OwnerContact {
        OwnerContact {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            profile_image: self.profile_image.clone(),
        }
    }

    pub fn applicant_contact(&self) -> ApplicantContact {
        ApplicantContact {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            id_proof_document: self.id_proof_document.clone(),
        }
    }
}

/// Public representation of an account; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub subscription_status: SubscriptionStatus,
    pub subscription_expiry_date: Option<DateTime<Utc>>,
    pub first_time_payment: bool,
    pub id_proof_document: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Owner fields resolved onto listings shown to renters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerContact {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub profile_image: Option<String>,
}

/// Renter fields resolved onto a landlord's interest lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantContact {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub id_proof_document: Option<String>,
}

/// Registration payload. Fields stay loose so every violation can be
/// reported at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token handed back after registration or login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserView,
}
