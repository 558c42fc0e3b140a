//! Read operations for the `pharmacies` table.

use sqlx::PgPool;
use uuid::Uuid;

use super::types::PharmacyRow;

/// All pharmacies in source-page order.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_pharmacies(pool: &PgPool) -> Result<Vec<PharmacyRow>, sqlx::Error> {
    sqlx::query_as::<_, PharmacyRow>(
        "SELECT id, name, address, phone, latitude, longitude, \
                day_of_week, is_open, updated_at \
         FROM pharmacies \
         ORDER BY position",
    )
    .fetch_all(pool)
    .await
}

/// Pharmacies whose `is_open` equals `is_open`, in source-page order.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_pharmacies_by_open(
    pool: &PgPool,
    is_open: bool,
) -> Result<Vec<PharmacyRow>, sqlx::Error> {
    sqlx::query_as::<_, PharmacyRow>(
        "SELECT id, name, address, phone, latitude, longitude, \
                day_of_week, is_open, updated_at \
         FROM pharmacies \
         WHERE is_open = $1 \
         ORDER BY position",
    )
    .bind(is_open)
    .fetch_all(pool)
    .await
}

/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_pharmacy(pool: &PgPool, id: Uuid) -> Result<Option<PharmacyRow>, sqlx::Error> {
    sqlx::query_as::<_, PharmacyRow>(
        "SELECT id, name, address, phone, latitude, longitude, \
                day_of_week, is_open, updated_at \
         FROM pharmacies \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
