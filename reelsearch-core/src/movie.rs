//! Movie records and dataset row validation.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::schema::{CollectionDescriptor, DataType, Record};

/// Name of the movie collection.
pub const MOVIE_COLLECTION: &str = "Movie";

/// Returns the schema of the movie collection.
pub fn movie_descriptor() -> CollectionDescriptor {
    CollectionDescriptor::new(MOVIE_COLLECTION)
        .with_property("title", DataType::Text)
        .with_property("overview", DataType::Text)
        .with_property("vote_average", DataType::Number)
        .with_property("genre_ids", DataType::IntArray)
        .with_property("release_date", DataType::Date)
        .with_property("tmdb_id", DataType::Int)
        .with_vectorizer("text2vec-openai")
        .with_generative("generative-openai")
}

/// A movie as stored in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    pub release_date: DateTime<Utc>,
    pub tmdb_id: i64,
}

impl Movie {
    /// Release year.
    #[inline]
    pub fn year(&self) -> i32 {
        self.release_date.year()
    }
}

impl Record for Movie {
    fn descriptor() -> CollectionDescriptor {
        movie_descriptor()
    }

    fn object_id(&self) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, self.tmdb_id.to_string().as_bytes())
    }
}

/// Genre list as it appears in the dataset: either a JSON array or a
/// string holding one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawGenres {
    List(Vec<i64>),
    Encoded(String),
}

impl Default for RawGenres {
    fn default() -> Self {
        RawGenres::List(Vec::new())
    }
}

/// One row of the source dataset. Unknown columns are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMovie {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genre_ids: RawGenres,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl RawMovie {
    /// Validates the row and converts it into a [`Movie`].
    ///
    /// `row` is the zero-based dataset position, used in error messages.
    pub fn into_movie(self, row: usize) -> Result<Movie> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Import(format!("row {}: missing title", row)))?;

        let date_str = self
            .release_date
            .ok_or_else(|| Error::Import(format!("row {}: missing release_date", row)))?;
        let release_date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
            .map_err(|e| {
                Error::Import(format!("row {}: bad release_date {:?}: {}", row, date_str, e))
            })?
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| Error::Import(format!("row {}: bad release_date", row)))?;

        let genre_ids = match self.genre_ids {
            RawGenres::List(ids) => ids,
            RawGenres::Encoded(s) => serde_json::from_str(&s).map_err(|e| {
                Error::Import(format!("row {}: bad genre_ids {:?}: {}", row, s, e))
            })?,
        };

        Ok(Movie {
            title,
            overview: self.overview.unwrap_or_default(),
            vote_average: self.vote_average.unwrap_or_default(),
            genre_ids,
            release_date,
            tmdb_id: self.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawMovie {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_into_movie_encoded_genres() {
        let movie = raw(json!({
            "id": 862,
            "title": "Toy Story",
            "overview": "A cowboy doll...",
            "vote_average": 7.97,
            "genre_ids": "[16, 35, 10751]",
            "release_date": "1995-10-30",
            "popularity": 100.0
        }))
        .into_movie(0)
        .unwrap();

        assert_eq!(movie.title, "Toy Story");
        assert_eq!(movie.genre_ids, vec![16, 35, 10751]);
        assert_eq!(movie.year(), 1995);
        assert_eq!(movie.tmdb_id, 862);
    }

    #[test]
    fn test_into_movie_list_genres() {
        let movie = raw(json!({
            "id": 1,
            "title": "Heat",
            "genre_ids": [80, 18],
            "release_date": "1995-12-15"
        }))
        .into_movie(3)
        .unwrap();

        assert_eq!(movie.genre_ids, vec![80, 18]);
        assert_eq!(movie.overview, "");
    }

    #[test]
    fn test_into_movie_rejects_bad_rows() {
        let blank = raw(json!({"id": 1, "title": "  ", "release_date": "1999-01-01"}));
        assert!(matches!(blank.into_movie(0), Err(Error::Import(_))));

        let bad_date = raw(json!({"id": 1, "title": "X", "release_date": "01/02/1999"}));
        let err = bad_date.into_movie(7).unwrap_err();
        assert!(err.to_string().contains("row 7"));

        let bad_genres = raw(json!({
            "id": 1, "title": "X", "release_date": "1999-01-01", "genre_ids": "[1,"
        }));
        assert!(matches!(bad_genres.into_movie(0), Err(Error::Import(_))));
    }

    #[test]
    fn test_object_id_is_deterministic() {
        let a = raw(json!({"id": 42, "title": "A", "release_date": "2000-01-01"}))
            .into_movie(0)
            .unwrap();
        let b = raw(json!({"id": 42, "title": "B", "release_date": "2001-01-01"}))
            .into_movie(1)
            .unwrap();
        assert_eq!(a.object_id(), b.object_id());
        assert_eq!(
            a.object_id(),
            Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"42")
        );
    }

    #[test]
    fn test_movie_serialization() {
        let movie = raw(json!({"id": 5, "title": "Four Rooms", "release_date": "1995-12-09"}))
            .into_movie(0)
            .unwrap();
        let props = serde_json::to_value(&movie).unwrap();
        assert_eq!(props["release_date"], "1995-12-09T00:00:00Z");
        let back: Movie = serde_json::from_value(props).unwrap();
        assert_eq!(back, movie);
    }

    #[test]
    fn test_descriptor_matches_record_fields() {
        let movie = raw(json!({"id": 5, "title": "X", "release_date": "1995-12-09"}))
            .into_movie(0)
            .unwrap();
        let props = serde_json::to_value(&movie).unwrap();
        let keys: Vec<&str> = props.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        for field in movie_descriptor().field_names() {
            assert!(keys.contains(&field), "missing {}", field);
        }
    }
}
