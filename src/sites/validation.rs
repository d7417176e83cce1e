//! Site draft validation.
//!
//! `validate` is a pure function from the text a user typed to either a
//! [`NewSite`] or the full set of field errors, so it can be exercised without
//! any rendering.

use crate::db::NewSite;

use serde::Serialize;
use std::fmt;
use std::ops::RangeInclusive;

pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// Form fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SiteField {
    Name,
    Latitude,
    Longitude,
    Altitude,
}

impl SiteField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteField::Name => "name",
            SiteField::Latitude => "latitude",
            SiteField::Longitude => "longitude",
            SiteField::Altitude => "altitude",
        }
    }
}

impl fmt::Display for SiteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validation failure scoped to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: SiteField,
    pub message: String,
}

/// Every field error found in one validation pass, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Message to show next to `field`, if it failed.
    pub fn get(&self, field: SiteField) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    fn push(&mut self, field: SiteField, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }
}

/// Unvalidated site fields exactly as entered.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteDraft {
    pub name: String,
    pub description: String,
    pub latitude: String,
    pub longitude: String,
    pub altitude: String,
    pub is_active: bool,
}

impl Default for SiteDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            latitude: "0".to_string(),
            longitude: "0".to_string(),
            altitude: "0".to_string(),
            is_active: true,
        }
    }
}

/// Validate a draft, collecting one message per failing field.
pub fn validate(draft: &SiteDraft) -> Result<NewSite, FieldErrors> {
    let mut errors = FieldErrors::default();

    if draft.name.is_empty() {
        errors.push(SiteField::Name, "Site name is required");
    }

    let latitude = coordinate(&draft.latitude, SiteField::Latitude, &LATITUDE_RANGE, &mut errors);
    let longitude = coordinate(&draft.longitude, SiteField::Longitude, &LONGITUDE_RANGE, &mut errors);

    let altitude = match draft.altitude.trim() {
        "" => None,
        raw => match parse_number(raw) {
            Some(v) => Some(v),
            None => {
                errors.push(SiteField::Altitude, "Altitude must be a number");
                None
            }
        },
    };

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) if errors.is_empty() => {
            Ok(NewSite {
                name: draft.name.clone(),
                description: (!draft.description.is_empty()).then(|| draft.description.clone()),
                latitude,
                longitude,
                altitude,
                is_active: draft.is_active,
            })
        }
        _ => Err(errors),
    }
}

fn coordinate(
    raw: &str,
    field: SiteField,
    range: &RangeInclusive<f64>,
    errors: &mut FieldErrors,
) -> Option<f64> {
    let label = match field {
        SiteField::Latitude => "Latitude",
        _ => "Longitude",
    };

    let Some(value) = parse_number(raw) else {
        errors.push(field, format!("{} must be a number", label));
        return None;
    };

    if !range.contains(&value) {
        errors.push(
            field,
            format!("{} must be between {} and {}", label, range.start(), range.end()),
        );
        return None;
    }

    Some(value)
}

/// Parse a finite number; "NaN" and "inf" are rejected.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
