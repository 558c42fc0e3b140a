use async_trait::async_trait;
use garde_core::{NewPharmacy, PharmacyPatch, PharmacyRecord};
use uuid::Uuid;

use crate::StoreError;

/// Storage for pharmacy records.
///
/// Reads return records in the order they were written by the last
/// [`replace_all`](PharmacyStore::replace_all), which is the order the source
/// page lists them in.
#[async_trait]
pub trait PharmacyStore: Send + Sync {
    /// Atomically swap the whole collection for `records`.
    ///
    /// Readers observe either the previous set or the new one, never a mix.
    /// Returns the number of records written.
    async fn replace_all(&self, records: Vec<NewPharmacy>) -> Result<usize, StoreError>;

    async fn get_all(&self) -> Result<Vec<PharmacyRecord>, StoreError>;

    async fn get_by_flag(&self, is_open: bool) -> Result<Vec<PharmacyRecord>, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<PharmacyRecord>, StoreError>;

    /// Apply `patch` to one record.
    ///
    /// Returns [`StoreError::NotFound`] when no record has `id`.
    async fn update_fields(&self, id: Uuid, patch: PharmacyPatch) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
