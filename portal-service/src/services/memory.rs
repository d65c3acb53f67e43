use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId};
use service_core::error::AppError;
use tokio::sync::RwLock;

use crate::services::repository::{Record, Repository};

/// In-process record store for local runs and tests.
pub struct MemoryRepository<T: Record> {
    records: RwLock<Vec<T>>,
}

impl<T: Record> MemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Record> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> Repository<T> for MemoryRepository<T> {
    async fn list(&self) -> Result<Vec<T>, AppError> {
        let mut records = self.records.read().await.clone();
        records.sort_by_key(|r| (r.created_utc(), r.id()));
        Ok(records)
    }

    async fn list_where(&self, field: &'static str, value: &ObjectId) -> Result<Vec<T>, AppError> {
        let mut matching = Vec::new();
        for record in self.list().await? {
            let document = bson::to_document(&record).map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Failed to encode {}: {}", T::KIND, e))
            })?;
            if document.get_object_id(field).ok() == Some(*value) {
                matching.push(record);
            }
        }
        Ok(matching)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<T>, AppError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id() == *id).cloned())
    }

    async fn insert(&self, record: &T) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id() == record.id()) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "{} {} already exists",
                T::KIND,
                record.id()
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn replace(&self, record: &T, expected_version: i64) -> Result<bool, AppError> {
        let mut records = self.records.write().await;
        match records
            .iter_mut()
            .find(|r| r.id() == record.id() && r.version() == expected_version)
        {
            Some(slot) => {
                *slot = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &ObjectId) -> Result<u64, AppError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id() != *id);
        Ok((before - records.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
