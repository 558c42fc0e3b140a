//! Pharmacy record types, from raw extraction output to persisted rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinates;

/// Address stored when extraction produced none.
pub const DEFAULT_ADDRESS: &str = "Tangier, Morocco";

/// Phone stored when no phone-shaped text was found.
pub const PHONE_SENTINEL: &str = "N/A";

/// A candidate entry straight out of an extraction strategy.
///
/// Fields hold the text as found on the page; nothing is normalized yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub name: String,
    pub address: String,
    pub raw_phone_text: String,
    pub raw_day_text: String,
}

/// A draft after phone/day normalization and location assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPharmacy {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub coordinates: Option<Coordinates>,
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: u8,
}

/// Input record for a bulk replace. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPharmacy {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub day_of_week: u8,
    pub is_open: bool,
    pub updated_at: DateTime<Utc>,
}

/// A persisted pharmacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyRecord {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub day_of_week: u8,
    pub is_open: bool,
    pub updated_at: DateTime<Utc>,
}

impl PharmacyRecord {
    #[must_use]
    pub fn from_new(id: Uuid, new: NewPharmacy) -> Self {
        Self {
            id,
            name: new.name,
            address: new.address,
            phone: new.phone,
            latitude: new.latitude,
            longitude: new.longitude,
            day_of_week: new.day_of_week,
            is_open: new.is_open,
            updated_at: new.updated_at,
        }
    }

    /// Both coordinates, when the record has been located.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &PharmacyPatch) {
        if let Some(is_open) = patch.is_open {
            self.is_open = is_open;
        }
        self.updated_at = patch.updated_at;
    }
}

/// Partial update for a single record. Every write stamps `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct PharmacyPatch {
    pub is_open: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(latitude: Option<f64>, longitude: Option<f64>) -> PharmacyRecord {
        PharmacyRecord {
            id: Uuid::new_v4(),
            name: "Pharmacie Centrale".to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            phone: PHONE_SENTINEL.to_string(),
            latitude,
            longitude,
            day_of_week: 2,
            is_open: false,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn coordinates_require_both_axes() {
        assert!(record(Some(35.7), None).coordinates().is_none());
        assert!(record(None, Some(-5.8)).coordinates().is_none());
        let coords = record(Some(35.7), Some(-5.8)).coordinates().unwrap();
        assert!((coords.latitude - 35.7).abs() < f64::EPSILON);
    }

    #[test]
    fn apply_patch_only_touches_duty_fields() {
        let mut rec = record(Some(35.7), Some(-5.8));
        let before = rec.clone();
        let stamp = before.updated_at + chrono::Duration::minutes(5);
        rec.apply(&PharmacyPatch {
            is_open: Some(true),
            updated_at: stamp,
        });
        assert!(rec.is_open);
        assert_eq!(rec.updated_at, stamp);
        assert_eq!(rec.name, before.name);
        assert_eq!(rec.day_of_week, before.day_of_week);
    }

    #[test]
    fn record_serializes_with_snake_case_fields() {
        let json = serde_json::to_value(record(None, None)).unwrap();
        assert!(json.get("day_of_week").is_some());
        assert!(json.get("is_open").is_some());
        assert!(json["latitude"].is_null());
    }
}
