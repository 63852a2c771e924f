//! Weaviate REST/GraphQL client.
//!
//! Schema and batch operations go through the REST API; counting and
//! near-text search go through GraphQL.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::{BatchOutcome, StoreHit, StoreObject, VectorStore};
use crate::error::{Error, Result};
use crate::schema::CollectionDescriptor;

/// Connection settings for a Weaviate instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeaviateOptions {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Forwarded to the vectorizer module as `X-OpenAI-Api-Key`.
    pub openai_api_key: String,
    /// Bearer token for instances with API-key auth enabled.
    pub api_key: Option<String>,
}

impl WeaviateOptions {
    /// Creates options for a plain-http local instance.
    pub fn new(host: impl Into<String>, port: u16, openai_api_key: impl Into<String>) -> Self {
        Self {
            scheme: "http".to_string(),
            host: host.into(),
            port,
            openai_api_key: openai_api_key.into(),
            api_key: None,
        }
    }

    /// Base URL, e.g. `http://localhost:8080`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BatchItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    result: Option<BatchItemResult>,
}

#[derive(Debug, Deserialize)]
struct BatchItemResult {
    #[serde(default)]
    errors: Option<BatchItemErrors>,
}

#[derive(Debug, Deserialize)]
struct BatchItemErrors {
    #[serde(default)]
    error: Vec<GraphQlError>,
}

/// A connected Weaviate client.
#[derive(Debug, Clone)]
pub struct WeaviateStore {
    client: Client,
    base_url: String,
}

impl WeaviateStore {
    /// Builds the HTTP client and checks that the instance is ready.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the instance cannot be reached or
    /// reports that it is not ready.
    pub async fn connect(options: &WeaviateOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-openai-api-key",
            HeaderValue::from_str(&options.openai_api_key)
                .map_err(|e| Error::Config(format!("OPENAI_APIKEY is not a valid header: {}", e)))?,
        );
        if let Some(key) = &options.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e| {
                    Error::Config(format!("WEAVIATE_API_KEY is not a valid header: {}", e))
                })?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Connection(format!("client build failed: {}", e)))?;

        let store = Self {
            client,
            base_url: options.base_url(),
        };

        info!(url = %store.base_url, "connecting to weaviate");
        let response = store
            .client
            .get(store.url("/v1/.well-known/ready"))
            .send()
            .await
            .map_err(|e| Error::Connection(format!("{}: {}", store.base_url, e)))?;
        if !response.status().is_success() {
            return Err(Error::Connection(format!(
                "{} is not ready (status {})",
                store.base_url,
                response.status()
            )));
        }
        info!(url = %store.base_url, "connected to weaviate");

        Ok(store)
    }

    /// Base URL of the instance.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn graphql(&self, query: String) -> Result<GraphQlResponse> {
        debug!(%query, "graphql request");
        let response = self
            .client
            .post(self.url("/v1/graphql"))
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let response = expect_success(response).await?;
        response
            .json::<GraphQlResponse>()
            .await
            .map_err(|e| Error::Decode(format!("graphql response: {}", e)))
    }
}

// Turns a non-2xx response into an error carrying the body text.
async fn expect_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(Error::Store {
        status: status.as_u16(),
        message,
    })
}

// Weaviate reports an unknown class as an unqueryable GraphQL field.
fn graphql_errors(name: &str, errors: &[GraphQlError]) -> Option<Error> {
    let first = errors.first()?;
    if errors.iter().any(|e| e.message.contains("Cannot query field")) {
        return Some(Error::NotFound(name.to_string()));
    }
    Some(Error::Store {
        status: 200,
        message: first.message.clone(),
    })
}

fn class_payload(descriptor: &CollectionDescriptor) -> Value {
    let properties: Vec<Value> = descriptor
        .properties
        .iter()
        .map(|p| json!({ "name": p.name, "dataType": [p.data_type.as_weaviate()] }))
        .collect();

    let mut module_config = Map::new();
    module_config.insert(descriptor.vectorizer.clone(), json!({}));
    if let Some(generative) = &descriptor.generative {
        module_config.insert(generative.clone(), json!({}));
    }

    json!({
        "class": descriptor.name,
        "vectorizer": descriptor.vectorizer,
        "moduleConfig": module_config,
        "properties": properties,
    })
}

fn near_text_query(name: &str, query: &str, fields: &[&str], limit: usize) -> Result<String> {
    let concept = serde_json::to_string(query)
        .map_err(|e| Error::Decode(format!("encode query: {}", e)))?;
    Ok(format!(
        "{{ Get {{ {name}(nearText: {{ concepts: [{concept}] }}, limit: {limit}) {{ {fields} _additional {{ id distance }} }} }} }}",
        name = name,
        concept = concept,
        limit = limit,
        fields = fields.join(" "),
    ))
}

fn parse_hit(value: Value) -> Result<StoreHit> {
    let Value::Object(mut properties) = value else {
        return Err(Error::Decode("near-text result is not an object".into()));
    };
    let additional = properties.remove("_additional").unwrap_or(Value::Null);
    let distance = additional
        .get("distance")
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::Decode("near-text result has no distance".into()))?
        as f32;
    let id = additional
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok());

    Ok(StoreHit {
        id,
        properties,
        distance,
    })
}

#[async_trait]
impl VectorStore for WeaviateStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .client
            .get(self.url(&format!("/v1/schema/{}", name)))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        expect_success(response).await?;
        Ok(true)
    }

    async fn create_collection(&self, descriptor: &CollectionDescriptor) -> Result<()> {
        let response = self
            .client
            .post(self.url("/v1/schema"))
            .json(&class_payload(descriptor))
            .send()
            .await?;

        match expect_success(response).await {
            Ok(_) => Ok(()),
            Err(Error::Store { status, message }) if (400..500).contains(&status) => {
                Err(Error::Schema(format!(
                    "create {} rejected ({}): {}",
                    descriptor.name, status, message
                )))
            }
            Err(e) => Err(e),
        }
    }

    async fn count(&self, name: &str) -> Result<u64> {
        let response = self
            .graphql(format!("{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}", name))
            .await?;
        if let Some(err) = graphql_errors(name, &response.errors) {
            return Err(err);
        }

        let data = response.data.unwrap_or(Value::Null);
        let rows = data
            .get("Aggregate")
            .and_then(|a| a.get(name))
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        Ok(rows
            .get(0)
            .and_then(|row| row.pointer("/meta/count"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    async fn insert_batch(&self, name: &str, objects: Vec<StoreObject>) -> Result<BatchOutcome> {
        let total = objects.len();
        let payload: Vec<Value> = objects
            .into_iter()
            .map(|o| json!({ "class": name, "id": o.id, "properties": o.properties }))
            .collect();

        let response = self
            .client
            .post(self.url("/v1/batch/objects"))
            .json(&json!({ "objects": payload }))
            .send()
            .await?;
        let items: Vec<BatchItem> = expect_success(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Decode(format!("batch response: {}", e)))?;

        let mut failed = 0;
        for item in &items {
            let errors = item
                .result
                .as_ref()
                .and_then(|r| r.errors.as_ref())
                .map(|e| e.error.as_slice())
                .unwrap_or_default();
            if let Some(first) = errors.first() {
                failed += 1;
                debug!(id = ?item.id, error = %first.message, "object rejected");
            }
        }

        Ok(BatchOutcome {
            inserted: total.saturating_sub(failed),
            failed,
        })
    }

    async fn near_text(
        &self,
        name: &str,
        query: &str,
        fields: &[&str],
        limit: usize,
    ) -> Result<Vec<StoreHit>> {
        let response = self
            .graphql(near_text_query(name, query, fields, limit)?)
            .await?;
        if let Some(err) = graphql_errors(name, &response.errors) {
            return Err(err);
        }

        let data = response.data.unwrap_or(Value::Null);
        let rows = match data.get("Get").and_then(|g| g.get(name)) {
            Some(Value::Array(rows)) => rows.clone(),
            Some(Value::Null) | None => return Err(Error::NotFound(name.to_string())),
            Some(_) => return Err(Error::Decode("near-text result is not a list".into())),
        };

        rows.into_iter().map(parse_hit).collect()
    }

    async fn close(&self) {
        info!(url = %self.base_url, "closing weaviate connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    #[test]
    fn test_base_url() {
        let mut opts = WeaviateOptions::new("localhost", 8080, "sk-test");
        assert_eq!(opts.base_url(), "http://localhost:8080");
        opts.scheme = "https".into();
        assert_eq!(opts.base_url(), "https://localhost:8080");
    }

    #[test]
    fn test_class_payload() {
        let d = CollectionDescriptor::new("Movie")
            .with_property("title", DataType::Text)
            .with_property("genre_ids", DataType::IntArray)
            .with_generative("generative-openai");
        let payload = class_payload(&d);

        assert_eq!(payload["class"], "Movie");
        assert_eq!(payload["vectorizer"], "text2vec-openai");
        assert_eq!(payload["properties"][1]["dataType"][0], "int[]");
        assert!(payload["moduleConfig"].get("generative-openai").is_some());
    }

    #[test]
    fn test_near_text_query_escapes() {
        let q = near_text_query("Movie", "say \"hi\"", &["title", "overview"], 5).unwrap();
        assert!(q.contains(r#"concepts: ["say \"hi\""]"#));
        assert!(q.contains("limit: 5"));
        assert!(q.contains("title overview _additional { id distance }"));
    }

    #[test]
    fn test_graphql_errors() {
        let missing = [GraphQlError {
            message: "Cannot query field \"Movie\" on type \"GetObjectsObj\".".into(),
        }];
        assert!(matches!(
            graphql_errors("Movie", &missing),
            Some(Error::NotFound(_))
        ));

        let other = [GraphQlError {
            message: "explorer: vectorizer failed".into(),
        }];
        assert!(matches!(
            graphql_errors("Movie", &other),
            Some(Error::Store { .. })
        ));
        assert!(graphql_errors("Movie", &[]).is_none());
    }

    #[test]
    fn test_parse_hit() {
        let hit = parse_hit(json!({
            "title": "Alien",
            "_additional": {"id": "00000000-0000-0000-0000-000000000001", "distance": 0.25}
        }))
        .unwrap();
        assert_eq!(hit.properties.get("title"), Some(&json!("Alien")));
        assert!(!hit.properties.contains_key("_additional"));
        assert!((hit.distance - 0.25).abs() < 1e-6);
        assert!(hit.id.is_some());

        assert!(matches!(
            parse_hit(json!({"title": "x"})),
            Err(Error::Decode(_))
        ));
    }
}
