//! Great-circle geometry on a spherical earth.
//!
//! A [`Coordinate`] can only be built from an in-domain latitude/longitude,
//! so [`distance_km`] never sees invalid input and cannot fail.

pub mod bounding_box;

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub use bounding_box::BoundingBox;

/// Mean earth radius used by every distance computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude/longitude pair in degrees. Immutable.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct RawCoordinate {
    lat: f64,
    lng: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = ServiceError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lng)
    }
}

impl Coordinate {
    /// Validate and build a coordinate. `lat` must be in `[-90, 90]`,
    /// `lng` in `[-180, 180]`, both finite.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ServiceError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ServiceError::InvalidCoordinate(format!("lat {lat} outside [-90, 90]")));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ServiceError::InvalidCoordinate(format!("lng {lng} outside [-180, 180]")));
        }
        Ok(Self { lat, lng })
    }

    pub const fn lat(&self) -> f64 { self.lat }

    pub const fn lng(&self) -> f64 { self.lng }
}

/// Haversine distance in kilometres. Symmetric, zero for identical points.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // rounding can push h a hair past 1 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_KM * c
}
