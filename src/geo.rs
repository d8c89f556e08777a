use serde_json::{Value, json};

/// Radius used by MongoDB's spherical geometry for `2dsphere` queries.
pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

/// Upper bound on distance for the nearest-hospital lookup (10 km).
pub const NEAREST_MAX_DISTANCE_M: f64 = 10_000.0;
pub const NEAREST_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Returns `None` when either coordinate is non-finite or out of range.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }

    /// Reads a GeoJSON `Point` (`coordinates` are `[longitude, latitude]`).
    pub fn from_geojson(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        if obj.get("type").and_then(Value::as_str) != Some("Point") {
            return None;
        }
        let coords = obj.get("coordinates")?.as_array()?;
        if coords.len() != 2 {
            return None;
        }
        Self::new(coords[1].as_f64()?, coords[0].as_f64()?)
    }

    pub fn to_geojson(self) -> Value {
        json!({ "type": "Point", "coordinates": [self.lon, self.lat] })
    }

    /// Great-circle (haversine) distance in meters.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }
}

/// Accepts a JSON number or a string with a leading decimal number
/// (`"12.97abc"` reads as `12.97`).
pub fn parse_coordinate(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok().filter(|f| f.is_finite())
}
