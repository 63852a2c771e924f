//! # reelsearch core
//!
//! Semantic movie search over a collection in an external vector database.
//! Embedding, indexing and ranking are the database's job; this crate
//! connects to it, keeps the collection's schema and data in place, and
//! turns search-box queries into display cards.
//!
//! ## Components
//!
//! - [`Gateway`] - idempotent ensure-collection / import-if-empty, plus
//!   ordered, limited near-text search over a [`VectorStore`]
//! - [`WeaviateStore`] - the production store, a Weaviate REST/GraphQL client
//! - [`MemoryStore`] - in-process store for tests and offline runs
//! - [`Bootstrap`] / [`bootstrap()`] - the one-shot startup sequence
//! - [`MovieSearch`] - the search-box handler
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use reelsearch_core::{bootstrap, Config, MovieSearch};
//!
//! # async fn run() -> reelsearch_core::Result<()> {
//! let config = Config::from_env()?;
//! let ready = bootstrap(&config).await?;
//! let search = MovieSearch::new(Arc::new(ready.gateway), ready.collection, config.search_limit);
//!
//! println!("{}", search.handle("dystopian future").await.to_text());
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod dataset;
pub mod error;
pub mod gateway;
pub mod movie;
pub mod schema;
pub mod search;
pub mod store;

// Re-exports for convenient access
pub use bootstrap::{bootstrap, Bootstrap, Phase, Ready};
pub use config::Config;
pub use dataset::{parse_movies, DatasetSource};
pub use error::{Error, Result};
pub use gateway::{Gateway, ImportReport, ScoredRecord};
pub use movie::{movie_descriptor, Movie, RawMovie, MOVIE_COLLECTION};
pub use schema::{CollectionDescriptor, DataType, Property, Record};
pub use search::{MovieCard, MovieSearch, SearchOutcome};
pub use store::{BatchOutcome, MemoryStore, StoreHit, StoreObject, VectorStore, WeaviateOptions, WeaviateStore};
