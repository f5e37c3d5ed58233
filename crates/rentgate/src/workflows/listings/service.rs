use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::workflows::access::{AccessError, AccessGate};
use crate::workflows::accounts::{OwnerContact, User, UserId, UserRepository};
use crate::workflows::http::{error_response, field_errors_response, summarize, FieldError};
use crate::workflows::store::RepositoryError;

use super::domain::{
    InterestEntry, InterestView, ListingView, OwnedListingView, Property, PropertyId,
};
use super::filter::{BrowseParams, BROWSE_LIMIT};
use super::repository::ListingRepository;
use super::validation::{apply_update, validate_new, PropertySubmission};

/// Listing workflow: landlord CRUD, subscriber browse, renter interest.
/// Callers are expected to have passed the access gate already.
pub struct ListingService<U, L> {
    users: Arc<U>,
    listings: Arc<L>,
    gate: AccessGate<U>,
}

impl<U, L> ListingService<U, L>
where
    U: UserRepository + 'static,
    L: ListingRepository + 'static,
{
    pub fn new(users: Arc<U>, listings: Arc<L>, gate: AccessGate<U>) -> Self {
        Self {
            users,
            listings,
            gate,
        }
    }

    pub fn gate(&self) -> &AccessGate<U> {
        &self.gate
    }

    pub fn create(
        &self,
        owner: &User,
        submission: PropertySubmission,
        now: DateTime<Utc>,
    ) -> Result<ListingView, ListingError> {
        let details = validate_new(submission).map_err(ListingError::Invalid)?;
        let property = self.listings.insert(Property {
            id: PropertyId::generate(),
            owner: owner.id.clone(),
            details,
            created_at: now,
            updated_at: now,
        })?;

        info!(
            property_id = %property.id,
            owner_id = %owner.id,
            property_type = %property.details.property_type,
            "listing created"
        );
        Ok(property.view(Some(owner.owner_contact())))
    }

    pub fn get(&self, id: &PropertyId) -> Result<ListingView, ListingError> {
        let property = self.listings.fetch(id)?.ok_or(ListingError::NotFound)?;
        let owner = self.owner_contact(&property.owner)?;
        Ok(property.view(owner))
    }

    /// Missing and not-owned listings fail identically.
    pub fn update(
        &self,
        owner: &User,
        id: &PropertyId,
        submission: PropertySubmission,
        now: DateTime<Utc>,
    ) -> Result<ListingView, ListingError> {
        let mut property = self
            .listings
            .fetch_owned(id, &owner.id)?
            .ok_or(ListingError::NotFound)?;

        property.details =
            apply_update(&property.details, submission).map_err(ListingError::Invalid)?;
        property.updated_at = now;
        self.listings
            .update(property.clone())
            .map_err(not_found_as_listing_error)?;

        info!(property_id = %property.id, owner_id = %owner.id, "listing updated");
        Ok(property.view(Some(owner.owner_contact())))
    }

    pub fn delete(&self, owner: &User, id: &PropertyId) -> Result<(), ListingError> {
        if !self.listings.delete_owned(id, &owner.id)? {
            return Err(ListingError::NotFound);
        }
        info!(property_id = %id, owner_id = %owner.id, "listing deleted");
        Ok(())
    }

    pub fn browse(&self, params: BrowseParams) -> Result<Vec<ListingView>, ListingError> {
        let query = params.into_query().map_err(ListingError::Invalid)?;
        let properties = self.listings.search(&query, BROWSE_LIMIT)?;

        properties
            .into_iter()
            .map(|property| {
                let owner = self.owner_contact(&property.owner)?;
                Ok(property.view(owner))
            })
            .collect()
    }

    /// Record `renter` in the listing's interest set. Requires an identity
    /// document on file; a second request from the same renter is a duplicate.
    pub fn express_interest(
        &self,
        renter: &User,
        id: &PropertyId,
        now: DateTime<Utc>,
    ) -> Result<(), ListingError> {
        if self.listings.fetch(id)?.is_none() {
            return Err(ListingError::NotFound);
        }
        if renter.id_proof_document.is_none() {
            return Err(ListingError::MissingIdDocument);
        }

        let entry = InterestEntry {
            user: renter.id.clone(),
            applied_at: now,
        };
        self.listings
            .record_interest(id, entry)
            .map_err(|err| match err {
                RepositoryError::Conflict => ListingError::AlreadyInterested,
                other => not_found_as_listing_error(other),
            })?;

        info!(property_id = %id, user_id = %renter.id, "interest recorded");
        Ok(())
    }

    pub fn owned_listings(&self, owner: &User) -> Result<Vec<OwnedListingView>, ListingError> {
        self.listings
            .owned_by(&owner.id)?
            .into_iter()
            .map(|property| {
                let interested = self.resolve_interests(&property.id)?;
                Ok(property.owned_view(interested))
            })
            .collect()
    }

    fn resolve_interests(&self, id: &PropertyId) -> Result<Vec<InterestView>, ListingError> {
        let mut views = Vec::new();
        for entry in self.listings.interests(id)? {
            match self.users.fetch(&entry.user)? {
                Some(applicant) => views.push(InterestView {
                    user: applicant.applicant_contact(),
                    applied_at: entry.applied_at,
                }),
                None => warn!(property_id = %id, user_id = %entry.user, "interested user missing"),
            }
        }
        Ok(views)
    }

    fn owner_contact(&self, owner: &UserId) -> Result<Option<OwnerContact>, ListingError> {
        let contact = self.users.fetch(owner)?.map(|user| user.owner_contact());
        if contact.is_none() {
            warn!(owner_id = %owner, "listing owner missing");
        }
        Ok(contact)
    }
}

fn not_found_as_listing_error(err: RepositoryError) -> ListingError {
    match err {
        RepositoryError::NotFound => ListingError::NotFound,
        other => ListingError::Repository(other),
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("invalid listing: {}", summarize(.0))]
    Invalid(Vec<FieldError>),
    #[error("Property not found")]
    NotFound,
    #[error("You have already expressed interest in this property")]
    AlreadyInterested,
    #[error("Please upload your ID proof document before expressing interest")]
    MissingIdDocument,
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        match self {
            ListingError::Invalid(errors) => field_errors_response(errors),
            ListingError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "not_found", self.to_string())
            }
            ListingError::AlreadyInterested => {
                error_response(StatusCode::BAD_REQUEST, "duplicate", self.to_string())
            }
            ListingError::MissingIdDocument => {
                error_response(StatusCode::BAD_REQUEST, "validation", self.to_string())
            }
            ListingError::Access(err) => err.into_response(),
            ListingError::Repository(_) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                self.to_string(),
            ),
        }
    }
}
