//! Great-circle distance and nearest on-duty pharmacy lookup.

use serde::{Deserialize, Serialize};

use crate::pharmacies::PharmacyRecord;
use crate::CoreError;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validate a query point.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedQuery`] for non-finite or out-of-range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::MalformedQuery(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::MalformedQuery(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Haversine distance in kilometers.
#[must_use]
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Round a distance to meter precision (3 decimals of a kilometer).
#[must_use]
pub fn round_km(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestMatch {
    pub pharmacy: PharmacyRecord,
    pub distance_km: f64,
}

/// Find the on-duty record closest to `point`.
///
/// Only records with `is_open`, both coordinates and a finite distance are
/// candidates. The scan
/// keeps the first record with a strictly smaller distance, so equal
/// distances resolve to the earliest record in iteration order.
pub fn find_nearest<'a, I>(point: Coordinates, records: I) -> Option<NearestMatch>
where
    I: IntoIterator<Item = &'a PharmacyRecord>,
{
    let mut best: Option<(&PharmacyRecord, f64)> = None;

    for record in records {
        if !record.is_open {
            continue;
        }
        let Some(coords) = record.coordinates() else {
            continue;
        };
        let distance = haversine_km(point, coords);
        if !distance.is_finite() {
            continue;
        }
        match best {
            Some((_, min)) if distance >= min => {}
            _ => best = Some((record, distance)),
        }
    }

    best.map(|(record, distance)| NearestMatch {
        pharmacy: record.clone(),
        distance_km: round_km(distance),
    })
}
