//! In-process store used by tests and by deployments without `DATABASE_URL`.

use async_trait::async_trait;
use garde_core::{NewPharmacy, PharmacyPatch, PharmacyRecord};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{PharmacyStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<PharmacyRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PharmacyStore for MemoryStore {
    async fn replace_all(&self, records: Vec<NewPharmacy>) -> Result<usize, StoreError> {
        let next: Vec<PharmacyRecord> = records
            .into_iter()
            .map(|new| PharmacyRecord::from_new(Uuid::new_v4(), new))
            .collect();
        let count = next.len();

        let mut guard = self.records.write().await;
        *guard = next;
        Ok(count)
    }

    async fn get_all(&self) -> Result<Vec<PharmacyRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn get_by_flag(&self, is_open: bool) -> Result<Vec<PharmacyRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.is_open == is_open)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<PharmacyRecord>, StoreError> {
        Ok(self.records.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn update_fields(&self, id: Uuid, patch: PharmacyPatch) -> Result<(), StoreError> {
        let mut guard = self.records.write().await;
        let record = guard
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        record.apply(&patch);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use garde_core::stamp_now;

    use super::*;

    fn new_pharmacy(name: &str, day_of_week: u8, is_open: bool) -> NewPharmacy {
        NewPharmacy {
            name: name.to_string(),
            address: "Boulevard Pasteur".to_string(),
            phone: "0539 941 234".to_string(),
            latitude: Some(35.7767),
            longitude: Some(-5.8039),
            day_of_week,
            is_open,
            updated_at: stamp_now(),
        }
    }

    #[tokio::test]
    async fn replace_then_read_back_preserves_fields_and_order() {
        let store = MemoryStore::new();
        let input = vec![
            new_pharmacy("Pharmacie Pasteur", 3, true),
            new_pharmacy("Pharmacie Ibn Batouta", 4, false),
        ];

        let written = store.replace_all(input.clone()).await.unwrap();
        assert_eq!(written, 2);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        for (record, new) in all.iter().zip(&input) {
            assert_eq!(record.name, new.name);
            assert_eq!(record.address, new.address);
            assert_eq!(record.phone, new.phone);
            assert_eq!(record.latitude, new.latitude);
            assert_eq!(record.day_of_week, new.day_of_week);
            assert_eq!(record.is_open, new.is_open);
        }
        assert_ne!(all[0].id, all[1].id);
    }

    #[tokio::test]
    async fn get_by_id_returns_exactly_what_was_written() {
        let store = MemoryStore::new();
        let input = vec![
            new_pharmacy("Pharmacie Pasteur", 3, true),
            new_pharmacy("Pharmacie Ibn Batouta", 4, false),
        ];
        store.replace_all(input.clone()).await.unwrap();

        let all = store.get_all().await.unwrap();
        for (listed, new) in all.iter().zip(input) {
            let fetched = store.get_by_id(listed.id).await.unwrap().unwrap();
            assert_eq!(fetched, PharmacyRecord::from_new(listed.id, new));
        }
    }

    #[tokio::test]
    async fn replace_discards_previous_set() {
        let store = MemoryStore::new();
        store
            .replace_all(vec![new_pharmacy("Pharmacie Ancienne", 1, true)])
            .await
            .unwrap();
        store
            .replace_all(vec![new_pharmacy("Pharmacie Nouvelle", 2, false)])
            .await
            .unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Pharmacie Nouvelle");
    }

    #[tokio::test]
    async fn get_by_flag_filters_on_is_open() {
        let store = MemoryStore::new();
        store
            .replace_all(vec![
                new_pharmacy("Pharmacie A", 3, true),
                new_pharmacy("Pharmacie B", 4, false),
                new_pharmacy("Pharmacie C", 3, true),
            ])
            .await
            .unwrap();

        let open = store.get_by_flag(true).await.unwrap();
        let names: Vec<_> = open.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pharmacie A", "Pharmacie C"]);
        assert_eq!(store.get_by_flag(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_by_id_and_update_fields() {
        let store = MemoryStore::new();
        store
            .replace_all(vec![new_pharmacy("Pharmacie Rif", 5, false)])
            .await
            .unwrap();
        let id = store.get_all().await.unwrap()[0].id;

        let stamp = stamp_now();
        store
            .update_fields(
                id,
                PharmacyPatch {
                    is_open: Some(true),
                    updated_at: stamp,
                },
            )
            .await
            .unwrap();

        let record = store.get_by_id(id).await.unwrap().unwrap();
        assert!(record.is_open);
        assert_eq!(record.updated_at, stamp);
        assert!(store.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let err = store
            .update_fields(
                id,
                PharmacyPatch {
                    is_open: Some(true),
                    updated_at: stamp_now(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn replace_with_empty_set_clears_store() {
        let store = MemoryStore::new();
        store
            .replace_all(vec![new_pharmacy("Pharmacie A", 3, true)])
            .await
            .unwrap();
        assert_eq!(store.replace_all(Vec::new()).await.unwrap(), 0);
        assert!(store.get_all().await.unwrap().is_empty());
    }
}
