use crate::workflows::accounts::UserId;
use crate::workflows::store::RepositoryError;

use super::domain::Payment;

/// Append-only payment record. An intent id may appear at most once; a second
/// append for the same intent is a `RepositoryError::Conflict`.
pub trait PaymentLedger: Send + Sync {
    fn append(&self, payment: Payment) -> Result<Payment, RepositoryError>;
    fn find_by_intent(&self, intent_id: &str) -> Result<Option<Payment>, RepositoryError>;
    /// Most recent first.
    fn history(&self, user: &UserId, limit: usize) -> Result<Vec<Payment>, RepositoryError>;
}
