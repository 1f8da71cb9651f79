use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::ErrorKind;
use mongodb::options::{
    CreateCollectionOptions, FindOptions, TimeseriesGranularity, TimeseriesOptions,
};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::api::StoreError;
use crate::config::Config;
use crate::query::LogFilter;
use crate::record::LogRecord;

const EXPIRE_AFTER: Duration = Duration::from_secs(60 * 60 * 24 * 30);

// Server error code for "collection already exists".
const NAMESPACE_EXISTS: i32 = 48;

#[async_trait]
pub trait LogStore {
    async fn count(&self, filter: &LogFilter) -> Result<u64, StoreError>;
    async fn fetch_page(
        &self,
        filter: &LogFilter,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<LogRecord>, StoreError>;
    async fn insert_batch(&self, records: Vec<LogRecord>) -> Result<usize, StoreError>;
}

pub struct MongoStore {
    // Held so the pool lives as long as the store; dropped with it.
    _client: Client,
    db: Database,
    coll_name: String,
    time_field: String,
    meta_field: String,
    collection: Collection<LogRecord>,
}

impl MongoStore {
    /// Builds a client and verifies it with a ping. The store is scoped to
    /// one operation or request; dropping it releases the connection pool
    /// on every exit path.
    pub async fn connect(config: &Config) -> Result<MongoStore, StoreError> {
        let client = Client::with_uri_str(&config.mongodb_uri)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        // The ping command is cheap and does not require auth.
        client
            .database("admin")
            .run_command(doc! {"ping": 1}, None)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
        tracing::debug!("MongoDB connection verified");

        let db = client.database(&config.db_name);
        let collection = db.collection::<LogRecord>(&config.coll_name);

        Ok(MongoStore {
            _client: client,
            db,
            coll_name: config.coll_name.clone(),
            time_field: config.time_field.clone(),
            meta_field: config.meta_field.clone(),
            collection,
        })
    }

    /// Creates the time-bucketed collection with the 30-day expiry.
    /// Idempotent: a NamespaceExists answer from the server is success.
    pub async fn ensure_timeseries_collection(&self) -> Result<(), StoreError> {
        let timeseries = TimeseriesOptions::builder()
            .time_field(self.time_field.clone())
            .meta_field(Some(self.meta_field.clone()))
            .granularity(Some(TimeseriesGranularity::Seconds))
            .build();
        let options = CreateCollectionOptions::builder()
            .timeseries(timeseries)
            .expire_after_seconds(EXPIRE_AFTER)
            .build();

        match self.db.create_collection(&self.coll_name, options).await {
            Ok(()) => {
                tracing::info!(collection = %self.coll_name, "time-series collection created");
                Ok(())
            }
            Err(err) => {
                if let ErrorKind::Command(ref cmd) = *err.kind {
                    if cmd.code == NAMESPACE_EXISTS {
                        tracing::info!(
                            collection = %self.coll_name,
                            "collection already exists, leaving it as is"
                        );
                        return Ok(());
                    }
                }
                Err(StoreError::BootstrapFailed(err.to_string()))
            }
        }
    }

    /// Indexes backing the search form's filter dimensions. Failures are
    /// reported, not fatal: the store still answers, just slower.
    pub async fn ensure_meta_indexes(&self) {
        for keys in [
            doc! {"meta.app": 1},
            doc! {"meta.host": 1},
            doc! {"meta.env": 1},
            doc! {"level": 1},
        ] {
            let index = IndexModel::builder().keys(keys.clone()).build();
            match self.collection.create_index(index, None).await {
                Ok(created) => {
                    tracing::debug!(index = %created.index_name, "index ensured")
                }
                Err(err) => {
                    tracing::warn!(keys = ?keys, error = %err, "failed to create index")
                }
            }
        }
    }
}

#[async_trait]
impl LogStore for MongoStore {
    async fn count(&self, filter: &LogFilter) -> Result<u64, StoreError> {
        self.collection
            .count_documents(filter.to_document(), None)
            .await
            .map_err(|e| StoreError::CountFailed(e.to_string()))
    }

    async fn fetch_page(
        &self,
        filter: &LogFilter,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<LogRecord>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! {"timestamp": -1})
            .skip(skip)
            .limit(limit)
            .build();

        let cursor = self
            .collection
            .find(filter.to_document(), options)
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    async fn insert_batch(&self, records: Vec<LogRecord>) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let result = self
            .collection
            .insert_many(records, None)
            .await
            .map_err(|e| StoreError::InsertFailed(e.to_string()))?;

        Ok(result.inserted_ids.len())
    }
}

/// In-process store with the same query semantics as `MongoStore`, plus
/// switches to simulate each failure class. Used by the integration tests
/// the same way the services in this style use a memory sink.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<LogRecord>>>,
    fail_count: bool,
    fail_fetch: bool,
    fail_insert: bool,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with_records(records: Vec<LogRecord>) -> MemoryStore {
        MemoryStore {
            records: Arc::new(Mutex::new(records)),
            ..Default::default()
        }
    }

    pub fn failing_count(mut self) -> MemoryStore {
        self.fail_count = true;
        self
    }

    pub fn failing_fetch(mut self) -> MemoryStore {
        self.fail_fetch = true;
        self
    }

    pub fn failing_insert(mut self) -> MemoryStore {
        self.fail_insert = true;
        self
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn count(&self, filter: &LogFilter) -> Result<u64, StoreError> {
        if self.fail_count {
            return Err(StoreError::CountFailed("simulated count failure".into()));
        }
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn fetch_page(
        &self,
        filter: &LogFilter,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<LogRecord>, StoreError> {
        if self.fail_fetch {
            return Err(StoreError::QueryFailed("simulated fetch failure".into()));
        }
        let records = self.records.lock().unwrap();
        let mut matched: Vec<LogRecord> = records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matched
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn insert_batch(&self, records: Vec<LogRecord>) -> Result<usize, StoreError> {
        if self.fail_insert {
            return Err(StoreError::InsertFailed("simulated insert failure".into()));
        }
        let inserted = records.len();
        self.records.lock().unwrap().extend(records);
        Ok(inserted)
    }
}
