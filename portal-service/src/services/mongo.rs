use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::{FindOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use crate::models::{Event, Invoice};
use crate::services::repository::{Record, Repository};

const EVENTS: &str = "events";
const INVOICES: &str = "invoices";

fn db_error(context: &str, e: mongodb::error::Error) -> AppError {
    tracing::error!("{}: {}", context, e);
    AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
}

#[derive(Clone)]
pub struct PortalDb {
    client: MongoClient,
    db: Database,
}

impl PortalDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri)
            .await
            .map_err(|e| db_error("Failed to connect to MongoDB", e))?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for portal-service");

        let created_index = || {
            IndexModel::builder()
                .keys(doc! { "created_utc": 1 })
                .options(
                    IndexOptions::builder()
                        .name("created_utc_idx".to_string())
                        .build(),
                )
                .build()
        };

        self.events()
            .create_index(created_index(), None)
            .await
            .map_err(|e| db_error("Failed to create events created_utc index", e))?;

        self.invoices()
            .create_index(created_index(), None)
            .await
            .map_err(|e| db_error("Failed to create invoices created_utc index", e))?;

        let event_id_index = IndexModel::builder()
            .keys(doc! { "event_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("event_id_idx".to_string())
                    .build(),
            )
            .build();

        self.invoices()
            .create_index(event_id_index, None)
            .await
            .map_err(|e| db_error("Failed to create event_id index", e))?;

        // Invoice numbers are free text and may repeat.
        let number_index = IndexModel::builder()
            .keys(doc! { "invoice_number": 1 })
            .options(
                IndexOptions::builder()
                    .name("invoice_number_idx".to_string())
                    .unique(false)
                    .build(),
            )
            .build();

        self.invoices()
            .create_index(number_index, None)
            .await
            .map_err(|e| db_error("Failed to create invoice_number index", e))?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| db_error("MongoDB health check failed", e))?;
        Ok(())
    }

    pub fn events(&self) -> Collection<Event> {
        self.db.collection(EVENTS)
    }

    pub fn invoices(&self) -> Collection<Invoice> {
        self.db.collection(INVOICES)
    }

    pub fn event_repository(&self) -> MongoRepository<Event> {
        MongoRepository::new(self.clone(), self.events())
    }

    pub fn invoice_repository(&self) -> MongoRepository<Invoice> {
        MongoRepository::new(self.clone(), self.invoices())
    }
}

/// One collection of records in MongoDB.
pub struct MongoRepository<T: Record> {
    db: PortalDb,
    collection: Collection<T>,
}

impl<T: Record> MongoRepository<T> {
    pub fn new(db: PortalDb, collection: Collection<T>) -> Self {
        Self { db, collection }
    }

    async fn find_sorted(&self, filter: Document) -> Result<Vec<T>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_utc": 1, "_id": 1 })
            .build();

        let cursor = self
            .collection
            .find(filter, options)
            .await
            .map_err(|e| db_error(&format!("Failed to list {} records", T::KIND), e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| db_error(&format!("Failed to collect {} records", T::KIND), e))
    }
}

#[async_trait]
impl<T: Record> Repository<T> for MongoRepository<T> {
    async fn list(&self) -> Result<Vec<T>, AppError> {
        self.find_sorted(doc! {}).await
    }

    async fn list_where(&self, field: &'static str, value: &ObjectId) -> Result<Vec<T>, AppError> {
        let mut filter = Document::new();
        filter.insert(field, *value);
        self.find_sorted(filter).await
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<T>, AppError> {
        self.collection
            .find_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| db_error(&format!("Failed to find {}", T::KIND), e))
    }

    async fn insert(&self, record: &T) -> Result<(), AppError> {
        self.collection
            .insert_one(record, None)
            .await
            .map_err(|e| db_error(&format!("Failed to insert {}", T::KIND), e))?;
        Ok(())
    }

    async fn replace(&self, record: &T, expected_version: i64) -> Result<bool, AppError> {
        let result = self
            .collection
            .replace_one(
                doc! { "_id": record.id(), "version": expected_version },
                record,
                None,
            )
            .await
            .map_err(|e| db_error(&format!("Failed to replace {}", T::KIND), e))?;
        Ok(result.matched_count == 1)
    }

    async fn delete(&self, id: &ObjectId) -> Result<u64, AppError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id }, None)
            .await
            .map_err(|e| db_error(&format!("Failed to delete {}", T::KIND), e))?;
        Ok(result.deleted_count)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.db.health_check().await
    }
}
