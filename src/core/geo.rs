use serde::{Deserialize, Serialize};

use crate::core::constants::{
    BRG_EAST, BRG_NORTH, BRG_SOUTH, BRG_WEST, EARTH_RADIUS, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON,
};
use crate::{MapError, Result};

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    /// Calculates the distance to another LatLng using the Haversine formula
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        distance(self.lat, self.lng, other.lat, other.lng)
    }

    /// Clamps latitude to the range supported by the slippy map
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(MIN_LAT, MAX_LAT)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// A geographic bounding box.
///
/// The box is always normalized so that `minlat <= maxlat` and
/// `minlon <= maxlon`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub minlat: f64,
    pub minlon: f64,
    pub maxlat: f64,
    pub maxlon: f64,
}

impl BBox {
    /// Creates a validated bounding box from two corners in any order.
    pub fn new(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> Result<Self> {
        for lat in [lat0, lat1] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(MapError::InvalidCoordinates(format!(
                    "latitude must be in range -90.0..90.0, got {}",
                    lat
                )));
            }
        }
        for lon in [lon0, lon1] {
            if !(MIN_LON..=MAX_LON).contains(&lon) {
                return Err(MapError::InvalidCoordinates(format!(
                    "longitude must be in range -180.0..180.0, got {}",
                    lon
                )));
            }
        }

        Ok(Self {
            minlat: lat0.min(lat1),
            minlon: lon0.min(lon1),
            maxlat: lat0.max(lat1),
            maxlon: lon0.max(lon1),
        })
    }

    /// Creates a bounding box from a center point and a radius in meters.
    pub fn from_radius(lat: f64, lon: f64, radius: f64) -> Result<Self> {
        let corners = [
            destination_point(lat, lon, BRG_NORTH, radius),
            destination_point(lat, lon, BRG_EAST, radius),
            destination_point(lat, lon, BRG_SOUTH, radius),
            destination_point(lat, lon, BRG_WEST, radius),
        ];

        let minlat = corners.iter().map(|c| c.0).fold(f64::INFINITY, f64::min);
        let maxlat = corners.iter().map(|c| c.0).fold(f64::NEG_INFINITY, f64::max);
        let minlon = corners.iter().map(|c| c.1).fold(f64::INFINITY, f64::min);
        let maxlon = corners.iter().map(|c| c.1).fold(f64::NEG_INFINITY, f64::max);

        Self::new(minlat, minlon, maxlat, maxlon)
    }

    /// Extends the box so that it adheres to the given aspect ratio
    /// (width / height). The initial box stays in the center.
    ///
    ///  4:3  =>  1.33  width > height
    ///  2:3  =>  0.66  width < height
    pub fn with_aspect(&self, aspect: f64) -> Result<Self> {
        if aspect == 1.0 {
            return Ok(*self);
        }

        let width = distance(self.minlat, self.minlon, self.minlat, self.maxlon);
        let height = distance(self.minlat, self.minlon, self.maxlat, self.minlon);
        if width == 0.0 || height == 0.0 {
            return Ok(*self);
        }

        let current = width / height;
        if aspect < current {
            // extend height (latitude)
            let target_height = width / aspect;
            let extend = (target_height - height) / 2.0;
            let (minlat, _) = destination_point(self.minlat, self.minlon, BRG_SOUTH, extend);
            let (maxlat, _) = destination_point(self.maxlat, self.minlon, BRG_NORTH, extend);
            Self::new(minlat, self.minlon, maxlat, self.maxlon)
        } else {
            // extend width (longitude)
            let target_width = height * aspect;
            let extend = (target_width - width) / 2.0;
            let (_, minlon) = destination_point(self.minlat, self.minlon, BRG_WEST, extend);
            let (_, maxlon) = destination_point(self.minlat, self.maxlon, BRG_EAST, extend);
            Self::new(self.minlat, minlon, self.maxlat, maxlon)
        }
    }

    /// Returns a copy with latitudes clamped to the slippy map limits.
    pub fn constrained(&self) -> Self {
        Self {
            minlat: LatLng::clamp_lat(self.minlat),
            minlon: self.minlon,
            maxlat: LatLng::clamp_lat(self.maxlat),
            maxlon: self.maxlon,
        }
    }

    /// Tells whether both latitudes are inside the slippy map limits.
    pub fn is_mercator_safe(&self) -> bool {
        self.minlat >= MIN_LAT && self.maxlat <= MAX_LAT
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.minlat
            && point.lat <= self.maxlat
            && point.lng >= self.minlon
            && point.lng <= self.maxlon
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.minlat + self.maxlat) / 2.0,
            (self.minlon + self.maxlon) / 2.0,
        )
    }

    /// Width and height in meters, measured along the south and west edges.
    pub fn dimensions(&self) -> (f64, f64) {
        let width = distance(self.minlat, self.minlon, self.minlat, self.maxlon);
        let height = distance(self.minlat, self.minlon, self.maxlat, self.minlon);
        (width, height)
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self {
            minlat: -90.0,
            minlon: MIN_LON,
            maxlat: 90.0,
            maxlon: MAX_LON,
        }
    }
}

/// Distance as-the-crow-flies between two points in meters.
pub fn distance(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let lat0 = lat0.to_radians();
    let lat1 = lat1.to_radians();
    let d_lat = lat1 - lat0;
    let d_lon = (lon1 - lon0).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat0.cos() * lat1.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    c * EARTH_RADIUS
}

/// Destination point from a start location, a bearing in degrees and a
/// distance in meters. Returns `(lat, lon)`.
///
/// See <http://www.movable-type.co.uk/scripts/latlong.html>
pub fn destination_point(lat: f64, lon: f64, bearing: f64, distance: f64) -> (f64, f64) {
    let d = distance / EARTH_RADIUS;
    let brng = bearing.to_radians();
    let lat = lat.to_radians();
    let lon = lon.to_radians();

    let a = lat.sin() * d.cos() + lat.cos() * d.sin() * brng.cos();
    let lat_p = a.asin();

    let x = d.cos() - lat.sin() * a;
    let y = brng.sin() * d.sin() * lat.cos();
    let lon_p = lon + y.atan2(x);

    (lat_p.to_degrees(), lon_p.to_degrees())
}

/// Converts a decimal coordinate into degrees, minutes and seconds.
pub fn dms(decimal: f64) -> (i32, i32, f64) {
    let d = decimal.floor();
    let m = ((decimal - d) * 60.0).floor();
    let s = (decimal - d - m / 60.0) * 3600.0;

    (d as i32, m as i32, s)
}

/// Converts degrees, minutes and seconds into a decimal coordinate.
pub fn decimal(d: f64, m: f64, s: f64) -> f64 {
    d + (m + s / 60.0) / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_distance() {
        let nyc = LatLng::new(40.7128, -74.0060);
        let la = LatLng::new(34.0522, -118.2437);
        let distance = nyc.distance_to(&la);

        // Distance should be approximately 3936 km
        assert!((distance - 3_936_000.0).abs() < 15_000.0);
    }

    #[test]
    fn test_destination_point_roundtrip() {
        let (lat, lon) = destination_point(47.0, 11.0, BRG_EAST, 5000.0);
        let d = distance(47.0, 11.0, lat, lon);
        assert!((d - 5000.0).abs() < 1.0);
        assert!(lon > 11.0);

        let (lat, lon) = destination_point(47.0, 11.0, BRG_SOUTH, 1000.0);
        assert!(lat < 47.0);
        assert!((lon - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_dms() {
        assert_eq!(dms(0.0), (0, 0, 0.0));
        assert_eq!(dms(10.0), (10, 0, 0.0));
        assert_eq!(dms(10.5), (10, 30, 0.0));
        assert_eq!(dms(10.75), (10, 45, 0.0));
    }

    #[test]
    fn test_dms_decimal_roundtrip() {
        let v = 12.22335;
        let (d, m, s) = dms(v);
        assert!((decimal(d as f64, m as f64, s) - v).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_validation() {
        assert!(BBox::new(-90.1, 30.0, 20.0, 40.0).is_err());
        assert!(BBox::new(-10.0, 30.0, 90.1, 40.0).is_err());
        assert!(BBox::new(-10.0, -180.1, 20.0, 40.0).is_err());
        assert!(BBox::new(10.0, 30.0, 20.0, 180.1).is_err());
        assert!(BBox::new(f64::NAN, 30.0, 20.0, 40.0).is_err());
        assert!(BBox::new(-90.0, -180.0, 90.0, 180.0).is_ok());
    }

    #[test]
    fn test_bbox_orders_corners() {
        let bbox = BBox::new(47.437, 11.133, 47.374, 10.953).unwrap();
        assert_eq!(bbox.minlat, 47.374);
        assert_eq!(bbox.maxlat, 47.437);
        assert_eq!(bbox.minlon, 10.953);
        assert_eq!(bbox.maxlon, 11.133);
    }

    #[test]
    fn test_bbox_from_radius_contains_center() {
        let bbox = BBox::from_radius(47.1, 6.5, 4000.0).unwrap();
        assert!(bbox.contains(&LatLng::new(47.1, 6.5)));
        let (w, h) = bbox.dimensions();
        assert!((h - 8000.0).abs() < 10.0);
        assert!((w - 8000.0).abs() < 50.0);
    }

    #[test]
    fn test_bbox_with_aspect() {
        let bbox = BBox::from_radius(47.1, 6.5, 4000.0).unwrap();

        let wide = bbox.with_aspect(16.0 / 9.0).unwrap();
        let (w, h) = wide.dimensions();
        assert!((w / h - 16.0 / 9.0).abs() < 0.01);
        assert!(wide.minlon < bbox.minlon && wide.maxlon > bbox.maxlon);

        let tall = bbox.with_aspect(2.0 / 3.0).unwrap();
        let (w, h) = tall.dimensions();
        assert!((w / h - 2.0 / 3.0).abs() < 0.01);
        assert!(tall.minlat < bbox.minlat && tall.maxlat > bbox.maxlat);

        assert_eq!(bbox.with_aspect(1.0).unwrap(), bbox);
    }

    #[test]
    fn test_bbox_constrained() {
        let bbox = BBox::new(-89.0, 30.0, 89.0, 40.0).unwrap();
        assert!(!bbox.is_mercator_safe());
        let c = bbox.constrained();
        assert!(c.is_mercator_safe());
        assert_eq!(c.minlon, 30.0);
    }
}
