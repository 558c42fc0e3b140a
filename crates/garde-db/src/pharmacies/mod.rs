//! Postgres-backed [`PharmacyStore`].

mod read;
mod types;
mod write;

use async_trait::async_trait;
use garde_core::{NewPharmacy, PharmacyPatch, PharmacyRecord};
use sqlx::PgPool;
use uuid::Uuid;

pub use read::{get_pharmacy, list_pharmacies, list_pharmacies_by_open};
pub use types::PharmacyRow;
pub use write::{replace_pharmacies, update_pharmacy};

use crate::{PharmacyStore, StoreError};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PharmacyStore for PgStore {
    async fn replace_all(&self, records: Vec<NewPharmacy>) -> Result<usize, StoreError> {
        let inserted = replace_pharmacies(&self.pool, &records).await?;
        tracing::debug!(inserted, "replaced pharmacies table");
        Ok(records.len())
    }

    async fn get_all(&self) -> Result<Vec<PharmacyRecord>, StoreError> {
        types::into_records(list_pharmacies(&self.pool).await?)
    }

    async fn get_by_flag(&self, is_open: bool) -> Result<Vec<PharmacyRecord>, StoreError> {
        types::into_records(list_pharmacies_by_open(&self.pool, is_open).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<PharmacyRecord>, StoreError> {
        get_pharmacy(&self.pool, id)
            .await?
            .map(PharmacyRecord::try_from)
            .transpose()
    }

    async fn update_fields(&self, id: Uuid, patch: PharmacyPatch) -> Result<(), StoreError> {
        update_pharmacy(&self.pool, id, &patch).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::ping(&self.pool).await?;
        Ok(())
    }
}
