//! Geographic points and great-circle maths for the shop directory.
//!
//! Storage order is `[lng, lat]` (GeoJSON), while callers think in `(lat, lng)`.
//! Constructors take named arguments so the two orders cannot be confused.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for displayed distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Equatorial radius used to turn a search radius into an angular radius,
/// matching the `$centerSphere` convention shop queries were defined with.
pub const SEARCH_EARTH_RADIUS_KM: f64 = 6378.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const UNSET: GeoPoint = GeoPoint { lng: 0.0, lat: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lng, lat }
    }

    /// A freshly provisioned shop sits on (0,0) until its vendor sets a location.
    pub fn is_unset(&self) -> bool {
        self.lng == 0.0 && self.lat == 0.0
    }

    /// `None` for the sentinel, so no consumer ever measures from the Gulf of Guinea.
    pub fn known(self) -> Option<GeoPoint> {
        (!self.is_unset()).then_some(self)
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn coordinates(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Central angle between two points, in radians (haversine form).
pub fn central_angle(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    EARTH_RADIUS_KM * central_angle(a, b)
}

/// Whether `point` lies within the spherical cap of `radius_km` around `center`.
pub fn within_radius(center: GeoPoint, radius_km: f64, point: GeoPoint) -> bool {
    if point.is_unset() || radius_km < 0.0 {
        return false;
    }
    central_angle(center, point) <= radius_km / SEARCH_EARTH_RADIUS_KM
}

/// Latitude band (degrees) that can contain matches; used to narrow the SQL scan.
pub fn latitude_band(center: GeoPoint, radius_km: f64) -> (f64, f64) {
    let delta = (radius_km / SEARCH_EARTH_RADIUS_KM).to_degrees();
    ((center.lat - delta).max(-90.0), (center.lat + delta).min(90.0))
}

/// Wire shape of a stored location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl From<GeoPoint> for GeoJsonPoint {
    fn from(point: GeoPoint) -> Self {
        GeoJsonPoint {
            kind: "Point".to_string(),
            coordinates: point.coordinates(),
        }
    }
}
