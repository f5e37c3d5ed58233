use std::str::FromStr;

use serde::Deserialize;

use crate::workflows::http::FieldError;

use super::domain::{Availability, GeoPoint, ListingDetails, Property, PropertyType};

/// Sphere radius used for great-circle distances, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;
pub const DEFAULT_RADIUS_KM: f64 = 10.0;
pub const BROWSE_LIMIT: usize = 50;

/// Query-string form of a browse request. Values stay raw text until
/// `into_query` so malformed ones are reported per field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseParams {
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lng: Option<String>,
    /// Kilometers.
    #[serde(default)]
    pub radius: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub min_price: Option<String>,
    #[serde(default)]
    pub max_price: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<String>,
}

impl BrowseParams {
    /// Geo filtering only applies when both `lat` and `lng` are given.
    /// Blank values count as absent.
    pub fn into_query(self) -> Result<ListingQuery, Vec<FieldError>> {
        let mut errors = Vec::new();

        let property_type = parse_param::<PropertyType>(
            &mut errors,
            "propertyType",
            self.property_type,
            "Unknown property type",
        );
        let min_price = parse_number(
            &mut errors,
            "minPrice",
            self.min_price,
            "Price bounds must be numbers",
        );
        let max_price = parse_number(
            &mut errors,
            "maxPrice",
            self.max_price,
            "Price bounds must be numbers",
        );
        let bedrooms = parse_param::<u32>(
            &mut errors,
            "bedrooms",
            self.bedrooms,
            "Bedrooms must be a whole number",
        );
        let lat = parse_number(&mut errors, "lat", self.lat, "Latitude must be a number");
        let lng = parse_number(&mut errors, "lng", self.lng, "Longitude must be a number");
        let radius = parse_number(
            &mut errors,
            "radius",
            self.radius,
            "Radius must be a positive number",
        );

        let near = match (lat, lng) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    errors.push(FieldError::new("lat", "Latitude must be between -90 and 90"));
                }
                if !(-180.0..=180.0).contains(&lng) {
                    errors.push(FieldError::new(
                        "lng",
                        "Longitude must be between -180 and 180",
                    ));
                }
                let radius_km = radius.unwrap_or(DEFAULT_RADIUS_KM);
                if radius_km <= 0.0 {
                    errors.push(FieldError::new("radius", "Radius must be a positive number"));
                }
                Some(GeoRadius::from_km(GeoPoint::new(lng, lat), radius_km))
            }
            _ => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ListingQuery {
            property_type,
            min_price,
            max_price,
            bedrooms,
            near,
        })
    }
}

fn parse_param<T: FromStr>(
    errors: &mut Vec<FieldError>,
    field: &str,
    raw: Option<String>,
    message: &str,
) -> Option<T> {
    let raw = raw?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

fn parse_number(
    errors: &mut Vec<FieldError>,
    field: &str,
    raw: Option<String>,
    message: &str,
) -> Option<f64> {
    let value = parse_param::<f64>(errors, field, raw, message)?;
    if value.is_finite() {
        Some(value)
    } else {
        errors.push(FieldError::new(field, message));
        None
    }
}

/// Circle on the globe used for "near me" searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRadius {
    pub center: GeoPoint,
    pub radius_meters: f64,
}

impl GeoRadius {
    pub fn from_km(center: GeoPoint, radius_km: f64) -> Self {
        Self {
            center,
            radius_meters: radius_km * 1000.0,
        }
    }

    pub fn distance_to(&self, point: GeoPoint) -> f64 {
        haversine_meters(self.center, point)
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        self.distance_to(point) <= self.radius_meters
    }
}

/// Great-circle distance between two points, in meters.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat_a, lat_b) = (a.latitude.to_radians(), b.latitude.to_radians());
    let d_lat = lat_b - lat_a;
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Validated browse filters, AND-composed. Only available listings match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub property_type: Option<PropertyType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<u32>,
    pub near: Option<GeoRadius>,
}

impl ListingQuery {
    pub fn matches(&self, details: &ListingDetails) -> bool {
        details.availability == Availability::Available
            && self
                .property_type
                .map_or(true, |kind| details.property_type == kind)
            && self.min_price.map_or(true, |min| details.rent_price >= min)
            && self.max_price.map_or(true, |max| details.rent_price <= max)
            && self.bedrooms.map_or(true, |beds| details.bedrooms == beds)
            && self
                .near
                .map_or(true, |near| near.contains(details.location))
    }

    /// Filter and order candidates: nearest first for geo queries, newest
    /// first otherwise. At most `limit` results.
    pub fn select<I>(&self, candidates: I, limit: usize) -> Vec<Property>
    where
        I: IntoIterator<Item = Property>,
    {
        let mut selected: Vec<Property> = candidates
            .into_iter()
            .filter(|property| self.matches(&property.details))
            .collect();

        match self.near {
            Some(near) => selected.sort_by(|a, b| {
                near.distance_to(a.details.location)
                    .total_cmp(&near.distance_to(b.details.location))
            }),
            None => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        selected.truncate(limit);
        selected
    }
}
