//! Rectangular lat/lng prefilter around a radius query.
//!
//! The box is a superset of the query circle: every point within the radius
//! lies inside it, corners admit points that are farther. Callers trim with
//! an exact distance check.

use serde::Serialize;

use super::{Coordinate, EARTH_RADIUS_KM};

/// Below this `cos(lat)` the longitude span is treated as unbounded.
const MIN_COS_LAT: f64 = 1e-9;

/// Padding in degrees on every edge so rounding never drops a boundary point.
const EDGE_PAD_DEG: f64 = 1e-9;

/// Axis-aligned box in degrees. When `lng_min > lng_max` the box crosses the
/// antimeridian and covers `[lng_min, 180] ∪ [-180, lng_max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl BoundingBox {
    /// Smallest box (up to padding) containing the spherical circle of
    /// `radius_km` around `center`.
    ///
    /// Latitude extends by the angular radius. Longitude extends by
    /// `asin(sin(d) / cos(lat))`; when the circle reaches a pole, or
    /// `cos(lat)` is below [`MIN_COS_LAT`], every longitude is included.
    pub fn around(center: Coordinate, radius_km: f64) -> Self {
        let angular = radius_km / EARTH_RADIUS_KM;
        let angular_deg = angular.to_degrees();

        let lat_min = center.lat() - angular_deg - EDGE_PAD_DEG;
        let lat_max = center.lat() + angular_deg + EDGE_PAD_DEG;
        if lat_min <= -90.0 || lat_max >= 90.0 || angular >= std::f64::consts::FRAC_PI_2 {
            return Self::all_longitudes(lat_min.max(-90.0), lat_max.min(90.0));
        }

        let cos_lat = center.lat().to_radians().cos();
        if cos_lat < MIN_COS_LAT {
            return Self::all_longitudes(lat_min, lat_max);
        }
        let ratio = angular.sin() / cos_lat;
        if ratio >= 1.0 {
            return Self::all_longitudes(lat_min, lat_max);
        }
        let lng_delta = ratio.asin().to_degrees() + EDGE_PAD_DEG;

        let mut lng_min = center.lng() - lng_delta;
        let mut lng_max = center.lng() + lng_delta;
        if lng_min < -180.0 {
            lng_min += 360.0;
        }
        if lng_max > 180.0 {
            lng_max -= 360.0;
        }
        Self { lat_min, lat_max, lng_min, lng_max }
    }

    fn all_longitudes(lat_min: f64, lat_max: f64) -> Self {
        Self { lat_min, lat_max, lng_min: -180.0, lng_max: 180.0 }
    }

    pub fn wraps_antimeridian(&self) -> bool { self.lng_min > self.lng_max }

    pub fn contains(&self, point: Coordinate) -> bool {
        let lat_ok = point.lat() >= self.lat_min && point.lat() <= self.lat_max;
        let lng_ok = if self.wraps_antimeridian() {
            point.lng() >= self.lng_min || point.lng() <= self.lng_max
        } else {
            point.lng() >= self.lng_min && point.lng() <= self.lng_max
        };
        lat_ok && lng_ok
    }
}
