use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::workflows::access::AccessGate;
use crate::workflows::accounts::{TokenIssuer, UserId, UserRepository};
use crate::workflows::listings::{
    InterestEntry, ListingQuery, ListingRepository, ListingService, Property, PropertyId,
    PropertySubmission,
};
use crate::workflows::store::RepositoryError;

#[derive(Default)]
struct ListingState {
    properties: HashMap<PropertyId, Property>,
    interests: HashMap<PropertyId, Vec<InterestEntry>>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryListings {
    state: Arc<Mutex<ListingState>>,
}

impl MemoryListings {
    pub(super) fn interest_count(&self, id: &PropertyId) -> usize {
        self.state
            .lock()
            .expect("listings mutex poisoned")
            .interests
            .get(id)
            .map_or(0, Vec::len)
    }
}

impl ListingRepository for MemoryListings {
    fn insert(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = self.state.lock().expect("listings mutex poisoned");
        if guard.properties.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.properties.insert(property.id.clone(), property.clone());
        Ok(property)
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let guard = self.state.lock().expect("listings mutex poisoned");
        Ok(guard.properties.get(id).cloned())
    }

    fn fetch_owned(
        &self,
        id: &PropertyId,
        owner: &UserId,
    ) -> Result<Option<Property>, RepositoryError> {
        Ok(self.fetch(id)?.filter(|property| property.is_owned_by(owner)))
    }

    fn update(&self, property: Property) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("listings mutex poisoned");
        match guard.properties.get_mut(&property.id) {
            Some(existing) => {
                *existing = property;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_owned(&self, id: &PropertyId, owner: &UserId) -> Result<bool, RepositoryError> {
        let mut guard = self.state.lock().expect("listings mutex poisoned");
        let owned = guard
            .properties
            .get(id)
            .is_some_and(|property| property.is_owned_by(owner));
        if owned {
            guard.properties.remove(id);
            guard.interests.remove(id);
        }
        Ok(owned)
    }

    fn search(&self, query: &ListingQuery, limit: usize) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.state.lock().expect("listings mutex poisoned");
        Ok(query.select(guard.properties.values().cloned(), limit))
    }

    fn owned_by(&self, owner: &UserId) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.state.lock().expect("listings mutex poisoned");
        let mut owned: Vec<Property> = guard
            .properties
            .values()
            .filter(|property| property.is_owned_by(owner))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    fn record_interest(
        &self,
        id: &PropertyId,
        entry: InterestEntry,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("listings mutex poisoned");
        if !guard.properties.contains_key(id) {
            return Err(RepositoryError::NotFound);
        }
        let entries = guard.interests.entry(id.clone()).or_default();
        if entries.iter().any(|existing| existing.user == entry.user) {
            return Err(RepositoryError::Conflict);
        }
        entries.push(entry);
        Ok(())
    }

    fn interests(&self, id: &PropertyId) -> Result<Vec<InterestEntry>, RepositoryError> {
        let guard = self.state.lock().expect("listings mutex poisoned");
        Ok(guard.interests.get(id).cloned().unwrap_or_default())
    }
}

pub(super) fn build_service<U>(
    users: Arc<U>,
    issuer: Arc<TokenIssuer>,
) -> (ListingService<U, MemoryListings>, MemoryListings)
where
    U: UserRepository + 'static,
{
    let listings = MemoryListings::default();
    let gate = AccessGate::new(users.clone(), issuer);
    let service = ListingService::new(users, Arc::new(listings.clone()), gate);
    (service, listings)
}

pub(super) fn listing_json(title: &str, rent: f64, longitude: f64, latitude: f64) -> Value {
    json!({
        "title": title,
        "description": "Bright rooms close to transit",
        "houseNumber": "14",
        "address": { "street": "Ring Road", "city": "Accra", "region": "Greater Accra" },
        "location": { "coordinates": [longitude, latitude] },
        "rentPrice": rent,
        "propertyType": "apartment",
        "bedrooms": 2,
        "bathrooms": 1
    })
}

pub(super) fn listing_submission(title: &str, rent: f64) -> PropertySubmission {
    serde_json::from_value(listing_json(title, rent, -0.187, 5.6037)).expect("submission parses")
}
