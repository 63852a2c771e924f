//! In-process vector store.
//!
//! Text properties are embedded with a hashing bag-of-words embedder and
//! near-text queries are answered by a brute-force cosine scan. Intended
//! for tests and offline runs; rankings are lexical, not semantic.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{BatchOutcome, StoreHit, StoreObject, VectorStore};
use crate::error::{Error, Result};
use crate::schema::CollectionDescriptor;

/// Default number of hash buckets.
pub const DEFAULT_DIMENSION: usize = 256;

/// Deterministic bag-of-words embedder.
///
/// Lower-cased alphanumeric tokens are hashed into `dimension` buckets and
/// the resulting counts are L2-normalised.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Creates an embedder. A zero dimension is bumped to one.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embeds `text`. Text with no tokens yields the zero vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            let bucket = crc32fast::hash(token.as_bytes()) as usize % self.dimension;
            vector[bucket] += 1.0;
        }

        let norm = dot_product(&vector, &vector).sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

/// Computes cosine distance between two vectors.
///
/// Formula: 1 - (a · b) / (||a|| * ||b||)
/// Range: [0, 2] where 0 = identical direction, 2 = opposite direction
#[inline]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();

    let denominator = norm_a * norm_b;
    if denominator == 0.0 {
        return 1.0; // Undefined, treat as unrelated
    }

    1.0 - (dot / denominator)
}

/// Computes dot product (inner product) between two vectors.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[derive(Debug, Clone)]
struct Entry {
    id: Uuid,
    properties: Map<String, Value>,
    vector: Vec<f32>,
}

#[derive(Debug)]
struct MemCollection {
    descriptor: CollectionDescriptor,
    entries: Vec<Entry>,
    positions: HashMap<Uuid, usize>,
}

impl MemCollection {
    fn new(descriptor: CollectionDescriptor) -> Self {
        Self {
            descriptor,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn text_of(&self, properties: &Map<String, Value>) -> String {
        self.descriptor
            .text_fields()
            .into_iter()
            .filter_map(|field| properties.get(field).and_then(|v| v.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // Same id overwrites in place, like an upsert.
    fn put(&mut self, object: StoreObject, embedder: &HashingEmbedder) {
        let vector = embedder.embed(&self.text_of(&object.properties));
        let entry = Entry {
            id: object.id,
            properties: object.properties,
            vector,
        };
        match self.positions.get(&entry.id) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.positions.insert(entry.id, self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

/// Thread-safe in-memory [`VectorStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    embedder: HashingEmbedder,
    collections: RwLock<HashMap<String, MemCollection>>,
    unreachable: bool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with a custom embedder.
    pub fn with_embedder(embedder: HashingEmbedder) -> Self {
        Self {
            embedder,
            ..Self::default()
        }
    }

    /// A store whose every call fails with [`Error::Connection`].
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable {
            return Err(Error::Connection("memory store marked unreachable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.check_reachable()?;
        Ok(self.collections.read().contains_key(name))
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<()> {
        self.check_reachable()?;
        let mut collections = self.collections.write();
        if collections.contains_key(&descriptor.name) {
            return Err(Error::Schema(format!(
                "collection {} already exists",
                descriptor.name
            )));
        }
        collections.insert(descriptor.name.clone(), MemCollection::new(descriptor.clone()));
        Ok(())
    }

    async fn count(&self, name: &str) -> Result<u64> {
        self.check_reachable()?;
        self.collections
            .read()
            .get(name)
            .map(|c| c.entries.len() as u64)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    async fn insert_batch(&self, name: &str, objects: Vec<StoreObject>) -> Result<BatchOutcome> {
        self.check_reachable()?;
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let inserted = objects.len();
        for object in objects {
            collection.put(object, &self.embedder);
        }
        Ok(BatchOutcome {
            inserted,
            failed: 0,
        })
    }

    async fn near_text(
        &self,
        name: &str,
        query: &str,
        fields: &[&str],
        limit: usize,
    ) -> Result<Vec<StoreHit>> {
        self.check_reachable()?;
        let collections = self.collections.read();
        let collection = collections
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        let query = self.embedder.embed(query);
        let mut scored: Vec<(usize, f32)> = collection
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, cosine_distance(&query, &entry.vector)))
            .collect();

        // Stable sort keeps insertion order among ties.
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(pos, distance)| {
                let entry = &collection.entries[pos];
                let properties = fields
                    .iter()
                    .filter_map(|f| entry.properties.get(*f).map(|v| (f.to_string(), v.clone())))
                    .collect();
                StoreHit {
                    id: Some(entry.id),
                    properties,
                    distance,
                }
            })
            .collect())
    }
}
