//! Rental listings: landlord-owned CRUD, filtered and geo browse for
//! subscribers, and the renter interest set.

pub mod domain;
pub mod filter;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    Address, Availability, GeoPoint, InterestEntry, InterestView, ListingDetails, ListingView,
    OwnedListingView, Property, PropertyId, PropertyType,
};
pub use filter::{haversine_meters, BrowseParams, GeoRadius, ListingQuery, BROWSE_LIMIT};
pub use repository::ListingRepository;
pub use router::listing_router;
pub use service::{ListingError, ListingService};
pub use validation::PropertySubmission;
