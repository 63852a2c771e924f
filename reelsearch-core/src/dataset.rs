//! Loading the static movie dataset.
//!
//! The dataset is a JSON document, either an array of row objects or a
//! column-oriented object (`{"title": {"0": ..}, ..}`), read from a local
//! file or fetched over http(s).

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::info;

use crate::error::{Error, Result};
use crate::movie::{Movie, RawMovie};

/// Default dataset: TMDB movies released 1990-2024.
pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/weaviate-tutorials/edu-datasets/main/movies_data_1990_2024.json";

/// Where the dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Url(String),
    Path(PathBuf),
}

impl DatasetSource {
    /// Interprets `http://` and `https://` locations as URLs, anything else
    /// as a file path.
    pub fn parse(location: &str) -> Self {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            DatasetSource::Url(location.to_string())
        } else {
            DatasetSource::Path(PathBuf::from(location))
        }
    }

    /// Reads and validates every row of the dataset.
    pub async fn load(&self) -> Result<Vec<Movie>> {
        info!(source = %self, "loading movie dataset");
        let bytes = match self {
            DatasetSource::Url(url) => {
                let response = reqwest::get(url)
                    .await
                    .map_err(|e| Error::Import(format!("fetch {} failed: {}", url, e)))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Import(format!("fetch {} returned {}", url, status)));
                }
                response
                    .bytes()
                    .await
                    .map_err(|e| Error::Import(format!("read {} failed: {}", url, e)))?
                    .to_vec()
            }
            DatasetSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| Error::Import(format!("read {} failed: {}", path.display(), e)))?,
        };

        let movies = parse_movies(&bytes)?;
        info!(rows = movies.len(), "dataset loaded");
        Ok(movies)
    }
}

impl Default for DatasetSource {
    fn default() -> Self {
        DatasetSource::Url(DEFAULT_DATASET_URL.to_string())
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Url(url) => f.write_str(url),
            DatasetSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parses a dataset document into validated movies, in dataset order.
pub fn parse_movies(bytes: &[u8]) -> Result<Vec<Movie>> {
    let doc: Value = serde_json::from_slice(bytes)
        .map_err(|e| Error::Import(format!("dataset is not valid JSON: {}", e)))?;

    let rows = match doc {
        Value::Array(rows) => rows,
        Value::Object(columns) => transpose_columns(columns)?,
        _ => {
            return Err(Error::Import(
                "dataset must be an array of rows or an object of columns".into(),
            ))
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(row, value)| {
            let raw: RawMovie = serde_json::from_value(value)
                .map_err(|e| Error::Import(format!("row {}: {}", row, e)))?;
            raw.into_movie(row)
        })
        .collect()
}

// Column-oriented documents key each cell by the row index.
fn transpose_columns(columns: Map<String, Value>) -> Result<Vec<Value>> {
    let mut rows: BTreeMap<usize, Map<String, Value>> = BTreeMap::new();

    for (column, cells) in columns {
        let Value::Object(cells) = cells else {
            return Err(Error::Import(format!("column {} is not an object", column)));
        };
        for (index, cell) in cells {
            let index: usize = index
                .parse()
                .map_err(|_| Error::Import(format!("column {}: bad row index {:?}", column, index)))?;
            rows.entry(index).or_default().insert(column.clone(), cell);
        }
    }

    Ok(rows.into_values().map(Value::Object).collect())
}
