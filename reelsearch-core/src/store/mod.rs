//! Vector store backends.
//!
//! - [`WeaviateStore`]: REST/GraphQL client for an external Weaviate instance
//! - [`MemoryStore`]: in-process store with brute-force cosine ranking
//!
//! Embedding and ranking belong to the backend. Callers hand over records as
//! flat property maps and get back property maps with a distance.

pub mod memory;
pub mod weaviate;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::Result;
use crate::schema::CollectionDescriptor;

pub use memory::MemoryStore;
pub use weaviate::{WeaviateOptions, WeaviateStore};

/// An object to insert: deterministic id plus properties.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreObject {
    pub id: Uuid,
    pub properties: Map<String, Value>,
}

/// A near-text match returned by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub id: Option<Uuid>,
    pub properties: Map<String, Value>,
    /// Cosine distance from the query (lower = more similar).
    pub distance: f32,
}

/// Outcome of a batch insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub inserted: usize,
    pub failed: usize,
}

/// Operations the gateway needs from a vector database.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns true if a collection with this name exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Creates a collection. Fails with `Schema` if it already exists.
    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<()>;

    /// Number of objects in the collection.
    async fn count(&self, name: &str) -> Result<u64>;

    /// Inserts one batch of objects.
    async fn insert_batch(&self, name: &str, objects: Vec<StoreObject>) -> Result<BatchOutcome>;

    /// Embeds `query` and returns up to `limit` nearest objects, projecting
    /// the listed `fields`.
    async fn near_text(
        &self,
        name: &str,
        query: &str,
        fields: &[&str],
        limit: usize,
    ) -> Result<Vec<StoreHit>>;

    /// Releases the connection.
    async fn close(&self) {}
}

#[async_trait]
impl<T: VectorStore + ?Sized> VectorStore for Arc<T> {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        (**self).collection_exists(name).await
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<()> {
        (**self).create_collection(descriptor).await
    }

    async fn count(&self, name: &str) -> Result<u64> {
        (**self).count(name).await
    }

    async fn insert_batch(&self, name: &str, objects: Vec<StoreObject>) -> Result<BatchOutcome> {
        (**self).insert_batch(name, objects).await
    }

    async fn near_text(
        &self,
        name: &str,
        query: &str,
        fields: &[&str],
        limit: usize,
    ) -> Result<Vec<StoreHit>> {
        (**self).near_text(name, query, fields, limit).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
