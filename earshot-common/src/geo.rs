//! Geographic coordinates and great-circle distance
//!
//! `GeoPoint` is the immutable value type used for both user locations and
//! point-of-interest anchors. Coordinate validation happens once at
//! construction; distance math afterwards has no failure modes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG value)
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a validated point.
    ///
    /// Rejects non-finite coordinates and values outside the valid
    /// latitude [-90, 90] / longitude [-180, 180] ranges.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(Error::InvalidLocation(format!(
                "non-finite coordinates: ({latitude}, {longitude})"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidLocation(format!(
                "latitude out of range: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidLocation(format!(
                "longitude out of range: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance to `other` in meters (haversine formula).
    ///
    /// Non-negative, symmetric, and zero for identical points. The
    /// intermediate term is clamped so antipodal rounding can't push
    /// `sqrt` out of domain.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = ((d_lat / 2.0).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_identical_points() {
        let p = GeoPoint::new(37.5665, 126.9780).unwrap();
        assert_eq!(p.distance_m(&p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(37.5665, 126.9780).unwrap();
        let b = GeoPoint::new(37.5670, 126.9790).unwrap();
        let ab = a.distance_m(&b);
        let ba = b.distance_m(&a);
        assert!((ab - ba).abs() < 1e-9);
        assert!(ab > 0.0);
    }

    #[test]
    fn test_known_distance() {
        // One degree of latitude is ~111.2 km
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(1.0, 0.0).unwrap();
        let d = a.distance_m(&b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_short_distance_meters() {
        // ~10m apart at the equator (1e-4 degrees ≈ 11.1m)
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0001, 0.0).unwrap();
        let d = a.distance_m(&b);
        assert!(d > 10.0 && d < 12.0, "got {d}");
    }

    #[test]
    fn test_rejects_nan_coordinates() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).is_err());
        assert!(GeoPoint::new(f64::INFINITY, 0.0).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        assert!(GeoPoint::new(90.5, 0.0).is_err());
        assert!(GeoPoint::new(-91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 180.5).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
    }
}
