//! Search page and JSON routes.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use reelsearch_core::{MovieCard, MovieSearch, SearchOutcome, VectorStore};
use serde::{Deserialize, Serialize};

const TITLE: &str = "Movie Search Demo with Weaviate";
const PLACEHOLDER: &str =
    "Enter your search query (e.g., 'dystopian future', 'romantic comedy', 'action movies')";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    collection: String,
    limit: usize,
}

/// Builds the UI router around a search handler.
pub fn router<S: VectorStore + 'static>(search: MovieSearch<S>) -> Router {
    Router::new()
        .route("/", get(index::<S>))
        .route("/api/search", get(api_search::<S>))
        .route("/health", get(health::<S>))
        .with_state(search)
}

async fn index<S: VectorStore + 'static>(
    State(search): State<MovieSearch<S>>,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    // A bare page load shows the form only.
    let outcome = match &params.q {
        Some(q) => Some(search.handle(q).await),
        None => None,
    };
    Html(render_page(params.q.as_deref().unwrap_or_default(), outcome.as_ref()))
}

async fn api_search<S: VectorStore + 'static>(
    State(search): State<MovieSearch<S>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchOutcome> {
    Json(search.handle(params.q.as_deref().unwrap_or_default()).await)
}

async fn health<S: VectorStore + 'static>(
    State(search): State<MovieSearch<S>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready",
        collection: search.collection().to_string(),
        limit: search.limit(),
    })
}

fn render_page(query: &str, outcome: Option<&SearchOutcome>) -> String {
    let results = outcome.map(render_results).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 860px; margin: 0 auto; padding: 24px; background: #f7f7fb; color: #222; }}
        form {{ display: flex; gap: 8px; margin: 16px 0 24px; }}
        input[type=text] {{ flex: 1; padding: 10px; border: 1px solid #ccc; border-radius: 6px; font-size: 15px; }}
        button {{ padding: 10px 20px; border: 0; border-radius: 6px; background: #ff7c00; color: white; font-size: 15px; cursor: pointer; }}
        .card {{ background: white; padding: 16px; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); margin-bottom: 12px; }}
        .card h3 {{ margin: 0 0 6px; }}
        .meta {{ color: #666; font-size: 13px; margin-bottom: 8px; }}
        .message {{ padding: 16px; border-radius: 8px; background: #fff3cd; }}
        .error {{ background: #f8d7da; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <p>Search through a database of movies using semantic search powered by Weaviate.</p>
    <form method="get" action="/">
        <label for="q" hidden>Search Query</label>
        <input type="text" id="q" name="q" value="{query}" placeholder="{placeholder}" autofocus>
        <button type="submit">Search</button>
    </form>
    <section id="results">
{results}
    </section>
</body>
</html>
"#,
        title = TITLE,
        query = escape_html(query),
        placeholder = escape_html(PLACEHOLDER),
        results = results,
    )
}

fn render_results(outcome: &SearchOutcome) -> String {
    if let SearchOutcome::Results(cards) = outcome {
        return cards.iter().map(render_card).collect::<Vec<_>>().join("\n");
    }

    let class = match outcome {
        SearchOutcome::Failed(_) => "message error",
        _ => "message",
    };
    format!(
        r#"        <div class="{}">{}</div>"#,
        class,
        escape_html(&outcome.message().unwrap_or_default())
    )
}

fn render_card(card: &MovieCard) -> String {
    format!(
        r#"        <div class="card">
            <h3>{rank}. {title} ({year})</h3>
            <div class="meta">Rating: {rating}/10 &middot; Similarity Score: {distance:.3}</div>
            <p>{overview}</p>
        </div>"#,
        rank = card.rank,
        title = escape_html(&card.title),
        year = card.year,
        rating = card.rating,
        distance = card.distance,
        overview = escape_html(&card.overview),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
