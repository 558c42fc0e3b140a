//! Write operations for the `pharmacies` table.

use garde_core::{NewPharmacy, PharmacyPatch};
use sqlx::PgPool;
use uuid::Uuid;

use crate::StoreError;

/// Replace every row with `records` inside one transaction.
///
/// Ids are generated here; `position` records the slice order so reads come
/// back in the order the records were given. The insert is a single
/// `INSERT … SELECT * FROM UNNEST(…)` regardless of batch size.
///
/// # Errors
///
/// Returns [`StoreError::Sqlx`] if any statement fails; the transaction is
/// rolled back and the previous rows stay visible.
pub async fn replace_pharmacies(pool: &PgPool, records: &[NewPharmacy]) -> Result<u64, StoreError> {
    let mut ids: Vec<Uuid> = Vec::with_capacity(records.len());
    let mut positions: Vec<i32> = Vec::with_capacity(records.len());
    let mut names: Vec<String> = Vec::with_capacity(records.len());
    let mut addresses: Vec<String> = Vec::with_capacity(records.len());
    let mut phones: Vec<String> = Vec::with_capacity(records.len());
    let mut latitudes: Vec<Option<f64>> = Vec::with_capacity(records.len());
    let mut longitudes: Vec<Option<f64>> = Vec::with_capacity(records.len());
    let mut days: Vec<i16> = Vec::with_capacity(records.len());
    let mut open_flags: Vec<bool> = Vec::with_capacity(records.len());
    let mut stamps = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let position = i32::try_from(index)
            .map_err(|_| StoreError::InvalidRow(format!("position {index} overflows")))?;
        ids.push(Uuid::new_v4());
        positions.push(position);
        names.push(record.name.clone());
        addresses.push(record.address.clone());
        phones.push(record.phone.clone());
        latitudes.push(record.latitude);
        longitudes.push(record.longitude);
        days.push(i16::from(record.day_of_week));
        open_flags.push(record.is_open);
        stamps.push(record.updated_at);
    }

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM pharmacies")
        .execute(&mut *tx)
        .await?;

    let inserted = if records.is_empty() {
        0
    } else {
        sqlx::query(
            "INSERT INTO pharmacies \
                 (id, position, name, address, phone, latitude, longitude, \
                  day_of_week, is_open, updated_at) \
             SELECT * FROM UNNEST(\
                  $1::uuid[], $2::int4[], $3::text[], $4::text[], $5::text[], \
                  $6::float8[], $7::float8[], $8::int2[], $9::bool[], $10::timestamptz[])",
        )
        .bind(&ids)
        .bind(&positions)
        .bind(&names)
        .bind(&addresses)
        .bind(&phones)
        .bind(&latitudes)
        .bind(&longitudes)
        .bind(&days)
        .bind(&open_flags)
        .bind(&stamps)
        .execute(&mut *tx)
        .await?
        .rows_affected()
    };

    tx.commit().await?;
    Ok(inserted)
}

/// Apply `patch` to a single row. `is_open` is left as-is when the patch
/// carries `None`.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] when no row has `id`, or
/// [`StoreError::Sqlx`] if the update fails.
pub async fn update_pharmacy(
    pool: &PgPool,
    id: Uuid,
    patch: &PharmacyPatch,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        "UPDATE pharmacies \
         SET is_open = COALESCE($2, is_open), updated_at = $3 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(patch.is_open)
    .bind(patch.updated_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}
