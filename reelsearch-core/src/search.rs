//! Search box handler.
//!
//! Turns a query string into display cards. Store failures are reported as
//! a [`SearchOutcome::Failed`] value so the UI can show them in the
//! results area.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::gateway::{Gateway, ScoredRecord};
use crate::movie::Movie;
use crate::store::VectorStore;

/// Overviews longer than this many characters are cut.
pub const OVERVIEW_PREVIEW_CHARS: usize = 200;

/// One rendered search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    /// 1-based position in the result list.
    pub rank: usize,
    pub title: String,
    pub year: i32,
    pub rating: f64,
    pub overview: String,
    pub distance: f32,
    pub score: f32,
}

impl MovieCard {
    fn from_scored(rank: usize, scored: &ScoredRecord<Movie>) -> Self {
        Self {
            rank,
            title: scored.record.title.clone(),
            year: scored.record.year(),
            rating: scored.record.vote_average,
            overview: preview(&scored.record.overview, OVERVIEW_PREVIEW_CHARS),
            distance: scored.distance,
            score: scored.score,
        }
    }
}

/// Result of handling one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum SearchOutcome {
    Results(Vec<MovieCard>),
    NoMatches,
    EmptyQuery,
    Failed(String),
}

impl SearchOutcome {
    /// Cards to display, empty for every non-result outcome.
    pub fn cards(&self) -> &[MovieCard] {
        match self {
            SearchOutcome::Results(cards) => cards,
            _ => &[],
        }
    }

    /// Message shown instead of cards, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            SearchOutcome::Results(_) => None,
            SearchOutcome::NoMatches => Some("No movies found matching your query.".into()),
            SearchOutcome::EmptyQuery => Some("Please enter a search query.".into()),
            SearchOutcome::Failed(e) => Some(format!("Error searching movies: {}", e)),
        }
    }

    /// Plain-text rendering of the outcome.
    pub fn to_text(&self) -> String {
        let cards = match self {
            SearchOutcome::Results(cards) => cards,
            _ => return self.message().unwrap_or_default(),
        };

        let mut out = String::new();
        for card in cards {
            let _ = writeln!(out, "**{}. {}** ({})", card.rank, card.title, card.year);
            let _ = writeln!(out, "Rating: {}/10", card.rating);
            let _ = writeln!(out, "Overview: {}", card.overview);
            let _ = writeln!(out, "Similarity Score: {:.3}", card.distance);
            let _ = writeln!(out, "{}", "─".repeat(50));
            out.push('\n');
        }
        out
    }
}

/// Search handler bound to a shared gateway.
pub struct MovieSearch<S> {
    gateway: Arc<Gateway<S>>,
    collection: String,
    limit: usize,
}

impl<S> Clone for MovieSearch<S> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            collection: self.collection.clone(),
            limit: self.limit,
        }
    }
}

impl<S: VectorStore> MovieSearch<S> {
    /// Creates a handler returning at most `limit` cards per query.
    pub fn new(gateway: Arc<Gateway<S>>, collection: impl Into<String>, limit: usize) -> Self {
        Self {
            gateway,
            collection: collection.into(),
            limit,
        }
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Handles one query. Blank queries short-circuit without a store call.
    pub async fn handle(&self, query: &str) -> SearchOutcome {
        info!(query, limit = self.limit, "search request");
        if query.trim().is_empty() {
            return SearchOutcome::EmptyQuery;
        }

        match self
            .gateway
            .search::<Movie>(&self.collection, query, self.limit)
            .await
        {
            Ok(results) if results.is_empty() => SearchOutcome::NoMatches,
            Ok(results) => SearchOutcome::Results(
                results
                    .iter()
                    .enumerate()
                    .map(|(i, scored)| MovieCard::from_scored(i + 1, scored))
                    .collect(),
            ),
            Err(e) => {
                error!(query, error = %e, "search failed");
                SearchOutcome::Failed(e.to_string())
            }
        }
    }
}

// Cuts on a char boundary and marks the cut.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
