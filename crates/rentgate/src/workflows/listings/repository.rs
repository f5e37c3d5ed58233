use crate::workflows::accounts::UserId;
use crate::workflows::store::RepositoryError;

use super::domain::{InterestEntry, Property, PropertyId};
use super::filter::ListingQuery;

/// Storage abstraction for listings and their interest sets.
pub trait ListingRepository: Send + Sync {
    fn insert(&self, property: Property) -> Result<Property, RepositoryError>;
    fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError>;
    /// `None` both when the listing is missing and when `owner` does not own it.
    fn fetch_owned(
        &self,
        id: &PropertyId,
        owner: &UserId,
    ) -> Result<Option<Property>, RepositoryError>;
    fn update(&self, property: Property) -> Result<(), RepositoryError>;
    /// Removes the listing and its interest entries. `false` when nothing
    /// matched `(id, owner)`.
    fn delete_owned(&self, id: &PropertyId, owner: &UserId) -> Result<bool, RepositoryError>;
    fn search(&self, query: &ListingQuery, limit: usize) -> Result<Vec<Property>, RepositoryError>;
    /// Newest created first.
    fn owned_by(&self, owner: &UserId) -> Result<Vec<Property>, RepositoryError>;
    /// Atomic check-and-insert: `Conflict` when the user is already in the
    /// set, `NotFound` when the listing is gone.
    fn record_interest(
        &self,
        id: &PropertyId,
        entry: InterestEntry,
    ) -> Result<(), RepositoryError>;
    /// In the order interest was recorded.
    fn interests(&self, id: &PropertyId) -> Result<Vec<InterestEntry>, RepositoryError>;
}
