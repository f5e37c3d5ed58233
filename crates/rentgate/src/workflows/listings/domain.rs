use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflows::accounts::{ApplicantContact, OwnerContact, UserId};

/// Identifier wrapper for rental listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

impl PropertyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    House,
    Room,
    Studio,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::Apartment,
        PropertyType::House,
        PropertyType::Room,
        PropertyType::Studio,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Room => "room",
            PropertyType::Studio => "studio",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PropertyType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PropertyType::ALL
            .into_iter()
            .find(|kind| kind.label() == value.trim())
            .ok_or(())
    }
}

/// Only `Available` listings show up in browse results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    Rented,
    Maintenance,
}

impl Availability {
    pub const ALL: [Availability; 3] = [
        Availability::Available,
        Availability::Rented,
        Availability::Maintenance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Rented => "rented",
            Availability::Maintenance => "maintenance",
        }
    }
}

impl FromStr for Availability {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Availability::ALL
            .into_iter()
            .find(|availability| availability.label() == value.trim())
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Point on the globe, stored in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// Wire form of a point: `{"type": "Point", "coordinates": [lng, lat]}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: [f64; 2],
}

impl From<GeoPoint> for Location {
    fn from(point: GeoPoint) -> Self {
        Self {
            kind: "Point",
            coordinates: [point.longitude, point.latitude],
        }
    }
}

/// Everything a landlord may edit on a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetails {
    pub title: String,
    pub description: String,
    pub house_number: String,
    pub address: Address,
    #[serde(serialize_with = "serialize_point")]
    pub location: GeoPoint,
    pub rent_price: f64,
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub amenities: Vec<String>,
    pub property_type: PropertyType,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub availability: Availability,
}

fn serialize_point<S>(point: &GeoPoint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    Location::from(*point).serialize(serializer)
}

/// Stored listing. Interest entries live beside it in the listing store,
/// keyed by `(PropertyId, UserId)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: PropertyId,
    pub owner: UserId,
    pub details: ListingDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }

    /// `owner` is `None` when the owning account can no longer be resolved.
    pub fn view(&self, owner: Option<OwnerContact>) -> ListingView {
        ListingView {
            id: self.id.clone(),
            owner,
            details: self.details.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn owned_view(&self, interested_users: Vec<InterestView>) -> OwnedListingView {
        OwnedListingView {
            id: self.id.clone(),
            owner: self.owner.clone(),
            details: self.details.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            interested_users,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestEntry {
    pub user: UserId,
    pub applied_at: DateTime<Utc>,
}

/// Listing as shown to any subscriber, with the owner's contact resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingView {
    pub id: PropertyId,
    pub owner: Option<OwnerContact>,
    #[serde(flatten)]
    pub details: ListingDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing as shown to its landlord, with applicants resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedListingView {
    pub id: PropertyId,
    pub owner: UserId,
    #[serde(flatten)]
    pub details: ListingDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub interested_users: Vec<InterestView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestView {
    pub user: ApplicantContact,
    pub applied_at: DateTime<Utc>,
}
