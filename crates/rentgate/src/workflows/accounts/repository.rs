use crate::workflows::store::RepositoryError;

use super::domain::{User, UserId};

/// Credential store abstraction. Implementations must keep e-mail addresses
/// unique and report a duplicate insert as `RepositoryError::Conflict`.
pub trait UserRepository: Send + Sync {
    fn insert(&self, user: User) -> Result<User, RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    fn update(&self, user: User) -> Result<(), RepositoryError>;
}
