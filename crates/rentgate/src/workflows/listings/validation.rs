use serde::Deserialize;
use serde_json::{Map, Value};

use crate::workflows::http::FieldError;

use super::domain::{Address, GeoPoint, ListingDetails};

/// Listing payload for both create and update. Values are kept as raw JSON
/// so type mismatches surface as field errors: text fields take strings,
/// numbers or booleans; numeric fields take numbers or numeric strings. On
/// update, absent or null fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySubmission {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub house_number: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub rent_price: Option<Value>,
    #[serde(default)]
    pub photos: Option<Value>,
    #[serde(default)]
    pub videos: Option<Value>,
    #[serde(default)]
    pub amenities: Option<Value>,
    #[serde(default)]
    pub property_type: Option<Value>,
    #[serde(default)]
    pub bedrooms: Option<Value>,
    #[serde(default)]
    pub bathrooms: Option<Value>,
    #[serde(default)]
    pub availability: Option<Value>,
}

impl PropertySubmission {
    /// Accept any JSON object; anything else is reported against `body`.
    pub fn from_json(body: Value) -> Result<Self, Vec<FieldError>> {
        if !body.is_object() {
            return Err(vec![FieldError::new(
                "body",
                "Listing details must be a JSON object",
            )]);
        }
        serde_json::from_value(body)
            .map_err(|err| vec![FieldError::new("body", err.to_string())])
    }
}

/// Validate a new listing, reporting every violation at once.
pub fn validate_new(submission: PropertySubmission) -> Result<ListingDetails, Vec<FieldError>> {
    resolve(None, submission)
}

/// Apply a partial edit on top of `current`; provided values are validated
/// the same way as on create.
pub fn apply_update(
    current: &ListingDetails,
    submission: PropertySubmission,
) -> Result<ListingDetails, Vec<FieldError>> {
    resolve(Some(current), submission)
}

fn resolve(
    base: Option<&ListingDetails>,
    submission: PropertySubmission,
) -> Result<ListingDetails, Vec<FieldError>> {
    let mut check = Checker::default();
    let mut address = check.object("address", submission.address, "Address must be an object");
    let base_address = base.map(|details| &details.address);

    let title = check.text(
        "title",
        submission.title,
        base.map(|details| details.title.clone()),
        "Title is required",
    );
    let description = check.text(
        "description",
        submission.description,
        base.map(|details| details.description.clone()),
        "Description is required",
    );
    let house_number = check.text(
        "houseNumber",
        submission.house_number,
        base.map(|details| details.house_number.clone()),
        "House number is required",
    );
    let street = check.text(
        "address.street",
        address.remove("street"),
        base_address.map(|address| address.street.clone()),
        "Street address is required",
    );
    let city = check.text(
        "address.city",
        address.remove("city"),
        base_address.map(|address| address.city.clone()),
        "City is required",
    );
    let region = check.text(
        "address.region",
        address.remove("region"),
        base_address.map(|address| address.region.clone()),
        "Region is required",
    );
    let postal_code = check.optional_text(
        "address.postalCode",
        address.remove("postalCode"),
        base_address.and_then(|address| address.postal_code.clone()),
    );
    let country = check.optional_text(
        "address.country",
        address.remove("country"),
        base_address.and_then(|address| address.country.clone()),
    );

    let rent_price = check.number(
        "rentPrice",
        submission.rent_price,
        base.map(|details| details.rent_price),
        "Rent price must be a number",
        |value| value >= 0.0,
    );
    let property_type = check.parsed(
        "propertyType",
        submission.property_type,
        base.map(|details| details.property_type),
        "Valid property type is required",
    );
    let bedrooms = check
        .number(
            "bedrooms",
            submission.bedrooms,
            base.map(|details| f64::from(details.bedrooms)),
            "Number of bedrooms must be a number",
            |value| value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX),
        )
        .map(|value| value as u32);
    let bathrooms = check.number(
        "bathrooms",
        submission.bathrooms,
        base.map(|details| details.bathrooms),
        "Number of bathrooms must be a number",
        |value| value >= 0.0,
    );
    let location = check.location(submission.location, base.map(|details| details.location));
    let availability = check.parsed(
        "availability",
        submission.availability,
        Some(base.map(|details| details.availability).unwrap_or_default()),
        "Availability must be one of available, rented, maintenance",
    );

    let photos = check.list("photos", submission.photos, base.map(|details| &details.photos));
    let videos = check.list("videos", submission.videos, base.map(|details| &details.videos));
    let amenities = check.list(
        "amenities",
        submission.amenities,
        base.map(|details| &details.amenities),
    );

    let (
        Some(title),
        Some(description),
        Some(house_number),
        Some(street),
        Some(city),
        Some(region),
        Some(rent_price),
        Some(property_type),
        Some(bedrooms),
        Some(bathrooms),
        Some(location),
        Some(availability),
        Some(photos),
        Some(videos),
        Some(amenities),
    ) = (
        title,
        description,
        house_number,
        street,
        city,
        region,
        rent_price,
        property_type,
        bedrooms,
        bathrooms,
        location,
        availability,
        photos,
        videos,
        amenities,
    )
    else {
        return Err(check.errors);
    };

    if !check.errors.is_empty() {
        return Err(check.errors);
    }

    Ok(ListingDetails {
        title,
        description,
        house_number,
        address: Address {
            street,
            city,
            region,
            postal_code,
            country,
        },
        location,
        rent_price,
        photos,
        videos,
        amenities,
        property_type,
        bedrooms,
        bathrooms,
        availability,
    })
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail<T>(&mut self, field: &str, message: &str) -> Option<T> {
        self.errors.push(FieldError::new(field, message));
        None
    }

    /// Nested object whose members are checked individually. A non-object is
    /// reported and treated as empty.
    fn object(
        &mut self,
        field: &str,
        provided: Option<Value>,
        message: &str,
    ) -> Map<String, Value> {
        match provided {
            None => Map::new(),
            Some(Value::Object(members)) => members,
            Some(_) => {
                self.errors.push(FieldError::new(field, message));
                Map::new()
            }
        }
    }

    fn text(
        &mut self,
        field: &str,
        provided: Option<Value>,
        current: Option<String>,
        message: &str,
    ) -> Option<String> {
        match present(provided) {
            Some(value) => match as_text(&value) {
                Some(text) if !text.is_empty() => Some(text),
                _ => self.fail(field, message),
            },
            None => current.or_else(|| self.fail(field, message)),
        }
    }

    fn optional_text(
        &mut self,
        field: &str,
        provided: Option<Value>,
        current: Option<String>,
    ) -> Option<String> {
        match present(provided) {
            Some(value) => match as_text(&value) {
                Some(text) => Some(text).filter(|text| !text.is_empty()),
                None => self.fail(field, "Must be text"),
            },
            None => current,
        }
    }

    fn number(
        &mut self,
        field: &str,
        provided: Option<Value>,
        current: Option<f64>,
        message: &str,
        accept: impl Fn(f64) -> bool,
    ) -> Option<f64> {
        match present(provided) {
            Some(value) => match as_number(&value).filter(|number| accept(*number)) {
                Some(number) => Some(number),
                None => self.fail(field, message),
            },
            None => current.or_else(|| self.fail(field, message)),
        }
    }

    fn parsed<T: std::str::FromStr + Copy>(
        &mut self,
        field: &str,
        provided: Option<Value>,
        current: Option<T>,
        message: &str,
    ) -> Option<T> {
        match present(provided) {
            Some(value) => match as_text(&value).and_then(|raw| raw.parse::<T>().ok()) {
                Some(parsed) => Some(parsed),
                None => self.fail(field, message),
            },
            None => current.or_else(|| self.fail(field, message)),
        }
    }

    /// Lists of text; blank entries are dropped.
    fn list(
        &mut self,
        field: &str,
        provided: Option<Value>,
        current: Option<&Vec<String>>,
    ) -> Option<Vec<String>> {
        let message = format!("{field} must be a list of text values");
        let Some(value) = present(provided) else {
            return Some(current.cloned().unwrap_or_default());
        };
        let Value::Array(items) = value else {
            return self.fail(field, &message);
        };
        match items.iter().map(as_text).collect::<Option<Vec<String>>>() {
            Some(items) => Some(items.into_iter().filter(|item| !item.is_empty()).collect()),
            None => self.fail(field, &message),
        }
    }

    fn location(&mut self, provided: Option<Value>, current: Option<GeoPoint>) -> Option<GeoPoint> {
        const FIELD: &str = "location.coordinates";
        let Some(input) = present(provided) else {
            return current.or_else(|| self.fail(FIELD, "Location coordinates are required"));
        };

        let numbers: Option<Vec<f64>> = match input.get("coordinates") {
            Some(Value::Array(values)) => values.iter().map(as_number).collect(),
            _ => None,
        };
        match numbers.as_deref() {
            Some(&[longitude, latitude]) => {
                if (-180.0..=180.0).contains(&longitude) && (-90.0..=90.0).contains(&latitude) {
                    Some(GeoPoint::new(longitude, latitude))
                } else {
                    self.fail(FIELD, "Coordinates must be [longitude, latitude] in range")
                }
            }
            _ => self.fail(FIELD, "Location coordinates are required"),
        }
    }
}

/// Explicit nulls count as absent.
fn present(provided: Option<Value>) -> Option<Value> {
    provided.filter(|value| !value.is_null())
}

/// Scalars coerced to trimmed text; arrays and objects are not text.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numbers or numeric strings; non-finite values are rejected.
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}
