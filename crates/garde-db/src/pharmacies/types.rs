//! Row types for the `pharmacies` table.

use chrono::{DateTime, Utc};
use garde_core::PharmacyRecord;
use uuid::Uuid;

use crate::StoreError;

/// A row from the `pharmacies` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PharmacyRow {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub day_of_week: i16,
    pub is_open: bool,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PharmacyRow> for PharmacyRecord {
    type Error = StoreError;

    fn try_from(row: PharmacyRow) -> Result<Self, Self::Error> {
        let day_of_week = u8::try_from(row.day_of_week)
            .ok()
            .filter(|d| *d <= 6)
            .ok_or_else(|| {
                StoreError::InvalidRow(format!(
                    "pharmacy {} has day_of_week {}",
                    row.id, row.day_of_week
                ))
            })?;

        Ok(PharmacyRecord {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            latitude: row.latitude,
            longitude: row.longitude,
            day_of_week,
            is_open: row.is_open,
            updated_at: row.updated_at,
        })
    }
}

pub(super) fn into_records(rows: Vec<PharmacyRow>) -> Result<Vec<PharmacyRecord>, StoreError> {
    rows.into_iter().map(PharmacyRecord::try_from).collect()
}
