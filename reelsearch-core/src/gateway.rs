//! Data store gateway.
//!
//! `Gateway` wraps a [`VectorStore`] and adds the contract the rest of the
//! application relies on:
//! - every mutating call is preceded by an existence or count check, so
//!   the bootstrap can be re-run without duplicating schema or data
//! - records go in and come out as typed [`Record`]s
//! - search results are capped at the limit and ordered by descending score

use std::cmp::Ordering;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::schema::{CollectionDescriptor, Record};
use crate::store::{StoreObject, VectorStore};

/// Default number of objects per insert batch.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// A record with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord<R> {
    pub record: R,
    /// Store distance (lower = more similar).
    pub distance: f32,
    /// Relevance score, `1 - distance` (higher = more similar).
    pub score: f32,
}

/// What `import_if_empty` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records already in the collection before the call.
    pub existing: u64,
    pub inserted: usize,
}

impl ImportReport {
    /// True if the import was skipped because the collection had data.
    #[inline]
    pub fn skipped(&self) -> bool {
        self.existing > 0
    }
}

/// Connection handle over a vector store.
#[derive(Debug)]
pub struct Gateway<S> {
    store: S,
    batch_size: usize,
}

impl<S: VectorStore> Gateway<S> {
    /// Wraps a connected store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the insert batch size. Chainable. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates the collection unless one with the same name exists.
    ///
    /// Returns true if the collection was created. An existing collection
    /// is left untouched, whatever its schema.
    ///
    /// # Errors
    ///
    /// [`Error::Schema`] if the store rejects the creation.
    pub async fn ensure_collection(&self, descriptor: &CollectionDescriptor) -> Result<bool> {
        if self.store.collection_exists(&descriptor.name).await? {
            info!(collection = %descriptor.name, "collection exists, skipping creation");
            return Ok(false);
        }

        info!(
            collection = %descriptor.name,
            fields = ?descriptor.field_names(),
            vectorizer = %descriptor.vectorizer,
            "creating collection"
        );
        self.store.create_collection(descriptor).await?;
        Ok(true)
    }

    /// Inserts `records` if the collection holds no records.
    ///
    /// Repeated calls with the same dataset never duplicate data, provided
    /// nothing else writes to the collection concurrently.
    ///
    /// # Errors
    ///
    /// [`Error::Import`] if the store rejects any record. Batches already
    /// accepted stay in the collection.
    pub async fn import_if_empty<R: Record>(
        &self,
        collection: &str,
        records: &[R],
    ) -> Result<ImportReport> {
        let existing = self.store.count(collection).await?;
        if existing > 0 {
            info!(collection, existing, "collection already populated, skipping import");
            return Ok(ImportReport {
                existing,
                ..ImportReport::default()
            });
        }

        info!(
            collection,
            records = records.len(),
            batch_size = self.batch_size,
            "importing records"
        );
        let mut report = ImportReport::default();
        let mut failed = 0;
        for (n, chunk) in records.chunks(self.batch_size).enumerate() {
            let objects = chunk
                .iter()
                .map(to_object)
                .collect::<Result<Vec<_>>>()?;
            let outcome = self.store.insert_batch(collection, objects).await?;
            debug!(batch = n, inserted = outcome.inserted, failed = outcome.failed, "batch sent");
            report.inserted += outcome.inserted;
            failed += outcome.failed;
        }

        if failed > 0 {
            warn!(collection, failed, inserted = report.inserted, "records were rejected");
            return Err(Error::Import(format!(
                "{} of {} records rejected by {}",
                failed,
                records.len(),
                collection
            )));
        }
        info!(collection, inserted = report.inserted, "import complete");
        Ok(report)
    }

    /// Near-text search returning at most `limit` records, best first.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the store is unreachable
    /// - [`Error::NotFound`] if the collection does not exist
    pub async fn search<R: Record>(
        &self,
        collection: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredRecord<R>>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let descriptor = R::descriptor();
        let fields = descriptor.field_names();
        let hits = self
            .store
            .near_text(collection, query, &fields, limit)
            .await?;

        let mut results = hits
            .into_iter()
            .map(|hit| {
                let record: R = serde_json::from_value(Value::Object(hit.properties))
                    .map_err(|e| Error::Decode(format!("{} record: {}", collection, e)))?;
                Ok(ScoredRecord {
                    record,
                    distance: hit.distance,
                    score: 1.0 - hit.distance,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(limit);
        debug!(collection, query, results = results.len(), "search complete");
        Ok(results)
    }

    /// Number of records in the collection.
    pub async fn count(&self, collection: &str) -> Result<u64> {
        self.store.count(collection).await
    }

    /// Releases the store connection.
    pub async fn close(&self) {
        self.store.close().await;
    }
}

fn to_object<R: Record>(record: &R) -> Result<StoreObject> {
    match serde_json::to_value(record) {
        Ok(Value::Object(properties)) => Ok(StoreObject {
            id: record.object_id(),
            properties,
        }),
        Ok(_) => Err(Error::Import("record did not serialize to an object".into())),
        Err(e) => Err(Error::Import(format!("serialize record: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movie::{movie_descriptor, Movie, MOVIE_COLLECTION};
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn movie(id: i64, title: &str, overview: &str) -> Movie {
        Movie {
            title: title.to_string(),
            overview: overview.to_string(),
            vote_average: 7.0,
            genre_ids: vec![878],
            release_date: Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            tmdb_id: id,
        }
    }

    fn dataset() -> Vec<Movie> {
        vec![
            movie(1, "Star Voyage", "A space adventure across the galaxy"),
            movie(2, "Paris Nights", "A romantic comedy in Paris"),
            movie(3, "The Verdict", "A tense courtroom drama"),
        ]
    }

    #[tokio::test]
    async fn test_ensure_collection_idempotent() {
        let gw = Gateway::new(MemoryStore::new());
        assert!(gw.ensure_collection(&movie_descriptor()).await.unwrap());
        assert!(!gw.ensure_collection(&movie_descriptor()).await.unwrap());
        assert!(gw.store().collection_exists(MOVIE_COLLECTION).await.unwrap());
    }

    #[tokio::test]
    async fn test_import_if_empty_once() {
        let gw = Gateway::new(MemoryStore::new()).with_batch_size(2);
        gw.ensure_collection(&movie_descriptor()).await.unwrap();

        let first = gw.import_if_empty(MOVIE_COLLECTION, &dataset()).await.unwrap();
        assert_eq!(first.inserted, 3);
        assert!(!first.skipped());

        let second = gw.import_if_empty(MOVIE_COLLECTION, &dataset()).await.unwrap();
        assert!(second.skipped());
        assert_eq!(second.existing, 3);
        assert_eq!(second.inserted, 0);
        assert_eq!(gw.count(MOVIE_COLLECTION).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_import_missing_collection() {
        let gw = Gateway::new(MemoryStore::new());
        let err = gw.import_if_empty(MOVIE_COLLECTION, &dataset()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_ordered_and_limited() {
        let gw = Gateway::new(MemoryStore::new());
        gw.ensure_collection(&movie_descriptor()).await.unwrap();
        gw.import_if_empty(MOVIE_COLLECTION, &dataset()).await.unwrap();

        let results: Vec<ScoredRecord<Movie>> =
            gw.search(MOVIE_COLLECTION, "space adventure", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.title, "Star Voyage");
        assert!(results[0].score >= results[1].score);
        assert!((results[0].score - (1.0 - results[0].distance)).abs() < 1e-6);

        let none: Vec<ScoredRecord<Movie>> =
            gw.search(MOVIE_COLLECTION, "space", 0).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_search_errors() {
        let gw = Gateway::new(MemoryStore::new());
        let err = gw
            .search::<Movie>(MOVIE_COLLECTION, "anything", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let gw = Gateway::new(MemoryStore::unreachable());
        let err = gw
            .search::<Movie>(MOVIE_COLLECTION, "anything", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }
}
