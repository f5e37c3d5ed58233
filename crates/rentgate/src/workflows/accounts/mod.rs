//! Accounts: registration with a marketplace role, password login, and the
//! signed bearer tokens the access gate verifies.

pub mod credentials;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use credentials::{hash_password, verify_password, CredentialError, IssuedToken, TokenIssuer};
pub use domain::{
    ApplicantContact, LoginRequest, OwnerContact, RegistrationRequest, Role, Session,
    SubscriptionStatus, User, UserId, UserView,
};
pub use repository::UserRepository;
pub use router::account_router;
pub use service::{AccountError, AccountService};
