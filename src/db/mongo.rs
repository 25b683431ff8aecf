//! MongoDB client and collection wrapper
//!
//! The connection is owned by a [`MongoPool`] handle that is injected into
//! whoever needs it. The first caller connects; concurrent first callers wait
//! on the same initialization barrier instead of racing to connect twice.

use bson::{doc, Bson, Document};
use futures::{Stream, TryStreamExt};
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::types::{ColloquyError, Result};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Lazily connected MongoDB handle with idempotent acquire
pub struct MongoPool {
    uri: String,
    db_name: String,
    client: OnceCell<MongoClient>,
}

impl MongoPool {
    pub fn new(uri: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            db_name: db_name.into(),
            client: OnceCell::new(),
        }
    }

    /// Get the connected client, connecting on first use
    ///
    /// A failed connection attempt leaves the cell empty so the next request
    /// tries again.
    pub async fn acquire(&self) -> Result<&MongoClient> {
        self.client
            .get_or_try_init(|| MongoClient::new(&self.uri, &self.db_name))
            .await
    }

    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri).await.map_err(|e| {
            ColloquyError::StoreUnavailable(format!("Failed to connect to MongoDB: {}", e))
        })?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ColloquyError::StoreUnavailable(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    /// Create a new collection and apply indexes
    pub async fn new(client: &Client, db_name: &str, collection_name: &str) -> Result<Self> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner.create_indexes(indices).await.map_err(|e| {
            ColloquyError::StoreUnavailable(format!("Failed to create indexes: {}", e))
        })?;

        Ok(())
    }

    /// Find one live document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.inner
            .find_one(live(filter))
            .await
            .map_err(|e| ColloquyError::StoreUnavailable(format!("Find failed: {}", e)))
    }

    /// Find live documents by filter, in natural order, up to `limit`
    pub async fn find_many(&self, filter: Document, limit: Option<i64>) -> Result<Vec<T>> {
        let mut find = self.inner.find(live(filter));
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let cursor = find
            .await
            .map_err(|e| ColloquyError::StoreUnavailable(format!("Find failed: {}", e)))?;

        drain(cursor, "Find").await
    }

    /// Count live documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64> {
        self.inner
            .count_documents(live(filter))
            .await
            .map_err(|e| ColloquyError::StoreUnavailable(format!("Count failed: {}", e)))
    }

    /// Sum an expression over live documents matching a filter
    ///
    /// An empty match produces no group document; that is a sum of zero.
    pub async fn sum(&self, filter: Document, expression: impl Into<Bson>) -> Result<u64> {
        let pipeline = vec![
            doc! { "$match": live(filter) },
            doc! { "$group": { "_id": Bson::Null, "total": { "$sum": expression.into() } } },
        ];

        let mut cursor = self
            .inner
            .aggregate(pipeline)
            .await
            .map_err(|e| ColloquyError::StoreUnavailable(format!("Aggregate failed: {}", e)))?;

        let group = match cursor
            .try_next()
            .await
            .map_err(|e| ColloquyError::StoreUnavailable(format!("Aggregate failed: {}", e)))?
        {
            Some(group) => group,
            None => return Ok(0),
        };

        Ok(group.get("total").map(bson_to_count).unwrap_or(0))
    }

    /// Run an aggregation pipeline, returning raw documents
    pub async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>> {
        let cursor = self
            .inner
            .aggregate(pipeline)
            .await
            .map_err(|e| ColloquyError::StoreUnavailable(format!("Aggregate failed: {}", e)))?;

        drain(cursor, "Aggregate").await
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| ColloquyError::StoreUnavailable(format!("Update failed: {}", e)))
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}

/// Read a cursor to the end
///
/// The first failed document fails the whole read; partial results are never
/// returned.
async fn drain<S, T, E>(cursor: S, operation: &str) -> Result<Vec<T>>
where
    S: Stream<Item = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    cursor.try_collect().await.map_err(|e| {
        error!("{} cursor failed: {}", operation, e);
        ColloquyError::StoreUnavailable(format!("{} failed: {}", operation, e))
    })
}

/// Exclude soft-deleted documents
fn live(mut filter: Document) -> Document {
    filter.insert("metadata.is_deleted", doc! { "$ne": true });
    filter
}

/// Read a numeric aggregation result as a non-negative count
pub(crate) fn bson_to_count(value: &Bson) -> u64 {
    match value {
        Bson::Int32(n) => (*n).max(0) as u64,
        Bson::Int64(n) => (*n).max(0) as u64,
        Bson::Double(n) if *n > 0.0 => *n as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_filter_excludes_deleted() {
        let filter = live(doc! { "author": "a" });
        assert_eq!(filter.get_str("author").unwrap(), "a");
        assert!(filter.get_document("metadata.is_deleted").is_ok());
    }

    #[test]
    fn test_bson_to_count() {
        assert_eq!(bson_to_count(&Bson::Int32(7)), 7);
        assert_eq!(bson_to_count(&Bson::Int64(12)), 12);
        assert_eq!(bson_to_count(&Bson::Double(3.0)), 3);
        assert_eq!(bson_to_count(&Bson::Int32(-1)), 0);
        assert_eq!(bson_to_count(&Bson::Null), 0);
    }

    #[tokio::test]
    async fn test_drain_fails_on_cursor_error() {
        let cursor = futures::stream::iter(vec![Ok(1), Err("connection reset"), Ok(3)]);
        let err = drain(cursor, "Find").await.unwrap_err();
        assert!(matches!(err, ColloquyError::StoreUnavailable(msg) if msg.contains("connection reset")));

        let cursor = futures::stream::iter(vec![Ok::<_, String>(1), Ok(2)]);
        assert_eq!(drain(cursor, "Find").await.unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_pool_starts_disconnected() {
        let pool = MongoPool::new("mongodb://localhost:27017", "colloquy");
        assert!(!pool.is_connected());
        assert_eq!(pool.db_name(), "colloquy");
    }
}
