//! Startup sequence.
//!
//! Runs once, before any query traffic:
//! 1. connect to the store
//! 2. ensure the collection exists
//! 3. load the dataset and import it if the collection is empty
//! 4. hand the connected gateway to the UI
//!
//! Any failure aborts the sequence; there is no retry and no partially
//! ready state.

use std::fmt;
use std::future::Future;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::gateway::{Gateway, ImportReport, DEFAULT_BATCH_SIZE};
use crate::movie::movie_descriptor;
use crate::schema::{CollectionDescriptor, Record};
use crate::store::{VectorStore, WeaviateStore};

/// Application lifecycle phase. `Initializing -> Ready` is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Ready,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initializing => f.write_str("initializing"),
            Phase::Ready => f.write_str("ready"),
        }
    }
}

/// A bootstrapped application: the live gateway plus what startup did.
#[derive(Debug)]
pub struct Ready<S> {
    pub gateway: Gateway<S>,
    pub collection: String,
    /// True if this run created the collection.
    pub created: bool,
    pub import: ImportReport,
}

impl<S> Ready<S> {
    #[inline]
    pub fn phase(&self) -> Phase {
        Phase::Ready
    }
}

/// Ensure-schema then ensure-data, against an already connected store.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    descriptor: CollectionDescriptor,
    batch_size: usize,
}

impl Bootstrap {
    /// Bootstraps the given collection.
    pub fn new(descriptor: CollectionDescriptor) -> Self {
        Self {
            descriptor,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Sets the insert batch size. Chainable.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Runs steps 2-4. `load` is awaited after the collection is ensured.
    pub async fn run<S, R, F, Fut>(self, store: S, load: F) -> Result<Ready<S>>
    where
        S: VectorStore,
        R: Record,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<R>>>,
    {
        let gateway = Gateway::new(store).with_batch_size(self.batch_size);
        let created = gateway.ensure_collection(&self.descriptor).await?;
        let records = load().await?;
        let import = gateway
            .import_if_empty(&self.descriptor.name, &records)
            .await?;

        info!(phase = %Phase::Ready, collection = %self.descriptor.name, "bootstrap complete");
        Ok(Ready {
            gateway,
            collection: self.descriptor.name,
            created,
            import,
        })
    }
}

/// Full startup against Weaviate using `config`.
pub async fn bootstrap(config: &Config) -> Result<Ready<WeaviateStore>> {
    info!(phase = %Phase::Initializing, "starting bootstrap");
    let store = WeaviateStore::connect(&config.weaviate).await?;
    Bootstrap::new(movie_descriptor())
        .with_batch_size(config.batch_size)
        .run(store, || config.dataset.load())
        .await
}
