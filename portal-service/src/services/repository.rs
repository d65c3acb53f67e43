//! Storage abstraction shared by the event and invoice stores.
//!
//! Backends only provide single-record primitives. Read-modify-write updates
//! are built on top with a compare-and-swap on the record's `version`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

/// Attempts made by [`modify`] before reporting a conflict.
pub const MAX_WRITE_ATTEMPTS: usize = 5;

/// A document stored in its own collection with a store-assigned identity.
pub trait Record: Clone + Unpin + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Singular noun used in logs and error messages.
    const KIND: &'static str;

    fn id(&self) -> ObjectId;
    fn version(&self) -> i64;
    fn created_utc(&self) -> DateTime<Utc>;
    /// Advance the write counter and touch the modification timestamp.
    fn mark_written(&mut self);
}

#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    /// Every record, oldest first.
    async fn list(&self) -> Result<Vec<T>, AppError>;
    /// Records whose `field` holds the id `value`, oldest first.
    async fn list_where(&self, field: &'static str, value: &ObjectId) -> Result<Vec<T>, AppError>;
    async fn get(&self, id: &ObjectId) -> Result<Option<T>, AppError>;
    async fn insert(&self, record: &T) -> Result<(), AppError>;
    /// Replace the stored record only if its version still equals
    /// `expected_version`. Returns whether the write happened.
    async fn replace(&self, record: &T, expected_version: i64) -> Result<bool, AppError>;
    /// Returns the number of removed records (0 or 1).
    async fn delete(&self, id: &ObjectId) -> Result<u64, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertAck<T> {
    pub acknowledged: bool,
    pub inserted_id: String,
    pub document: T,
}

impl<T> InsertAck<T> {
    pub fn new(inserted_id: ObjectId, document: T) -> Self {
        Self {
            acknowledged: true,
            inserted_id: inserted_id.to_hex(),
            document,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> InsertAck<U> {
        InsertAck {
            acknowledged: self.acknowledged,
            inserted_id: self.inserted_id,
            document: f(self.document),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateAck {
    pub fn not_found() -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
        }
    }

    pub fn modified() -> Self {
        Self {
            acknowledged: true,
            matched_count: 1,
            modified_count: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteAck {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Load, mutate and conditionally write back one record, retrying when a
/// concurrent writer got there first.
///
/// Returns the record before and after the change, or `None` if it does not
/// exist (or disappeared between attempts). An error from `apply` aborts the
/// update without writing.
pub async fn modify<T, F>(
    repo: &dyn Repository<T>,
    id: &ObjectId,
    mut apply: F,
) -> Result<Option<(T, T)>, AppError>
where
    T: Record,
    F: FnMut(&mut T) -> Result<(), AppError> + Send,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let Some(current) = repo.get(id).await? else {
            return Ok(None);
        };

        let mut next = current.clone();
        apply(&mut next)?;
        next.mark_written();

        if repo.replace(&next, current.version()).await? {
            return Ok(Some((current, next)));
        }

        tracing::debug!(kind = T::KIND, id = %id, attempt, "Version moved during update, retrying");
    }

    tracing::warn!(kind = T::KIND, id = %id, "Giving up after repeated write conflicts");
    Err(AppError::Conflict(anyhow::anyhow!(
        "{} {} is being modified concurrently, try again",
        T::KIND,
        id
    )))
}
