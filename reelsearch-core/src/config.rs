//! Runtime configuration from environment variables.

use std::net::SocketAddr;

use crate::dataset::DatasetSource;
use crate::error::{Error, Result};
use crate::gateway::DEFAULT_BATCH_SIZE;
use crate::store::WeaviateOptions;

/// Default UI bind address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8008";

/// Default number of results per query.
pub const DEFAULT_LIMIT: usize = 10;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub weaviate: WeaviateOptions,
    pub dataset: DatasetSource,
    pub bind_addr: SocketAddr,
    pub search_limit: usize,
    pub batch_size: usize,
}

impl Config {
    /// Reads the process environment. The binary loads `.env` first.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| get(key).ok_or_else(|| Error::Config(format!("{} is not set", key)));

        let openai_api_key = require("OPENAI_APIKEY")?;
        let host = require("WEAVIATE_HOST")?;
        let port = parse::<u16>("WEAVIATE_PORT", &require("WEAVIATE_PORT")?)?;

        let scheme = get("WEAVIATE_SCHEME").unwrap_or_else(|| "http".to_string());
        if scheme != "http" && scheme != "https" {
            return Err(Error::Config(format!(
                "WEAVIATE_SCHEME must be http or https, got {:?}",
                scheme
            )));
        }

        let dataset = get("MOVIE_DATASET")
            .map(|s| DatasetSource::parse(&s))
            .unwrap_or_default();

        let bind_addr = parse::<SocketAddr>(
            "REELSEARCH_ADDR",
            &get("REELSEARCH_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
        )?;

        let search_limit = match get("REELSEARCH_LIMIT") {
            Some(v) => positive("REELSEARCH_LIMIT", &v)?,
            None => DEFAULT_LIMIT,
        };
        let batch_size = match get("REELSEARCH_BATCH_SIZE") {
            Some(v) => positive("REELSEARCH_BATCH_SIZE", &v)?,
            None => DEFAULT_BATCH_SIZE,
        };

        Ok(Self {
            weaviate: WeaviateOptions {
                scheme,
                host,
                port,
                openai_api_key,
                api_key: get("WEAVIATE_API_KEY"),
            },
            dataset,
            bind_addr,
            search_limit,
            batch_size,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::Config(format!("{}={:?}: {}", key, value, e)))
}

fn positive(key: &str, value: &str) -> Result<usize> {
    match parse::<usize>(key, value)? {
        0 => Err(Error::Config(format!("{} must be at least 1", key))),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("OPENAI_APIKEY", "sk-test"),
        ("WEAVIATE_HOST", "localhost"),
        ("WEAVIATE_PORT", "8080"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.weaviate.base_url(), "http://localhost:8080");
        assert_eq!(config.weaviate.openai_api_key, "sk-test");
        assert_eq!(config.weaviate.api_key, None);
        assert_eq!(config.bind_addr.port(), 8008);
        assert_eq!(config.search_limit, DEFAULT_LIMIT);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.dataset, DatasetSource::default());
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("WEAVIATE_SCHEME", "https"),
            ("WEAVIATE_API_KEY", "wv-key"),
            ("MOVIE_DATASET", "./movies.json"),
            ("REELSEARCH_ADDR", "127.0.0.1:9000"),
            ("REELSEARCH_LIMIT", "5"),
            ("REELSEARCH_BATCH_SIZE", "50"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.weaviate.base_url(), "https://localhost:8080");
        assert_eq!(config.weaviate.api_key.as_deref(), Some("wv-key"));
        assert_eq!(config.dataset, DatasetSource::Path(PathBuf::from("./movies.json")));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.search_limit, 5);
        assert_eq!(config.batch_size, 50);
    }

    #[test]
    fn test_missing_required() {
        for skip in 0..REQUIRED.len() {
            let vars: Vec<_> = REQUIRED
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, kv)| *kv)
                .collect();
            let err = Config::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, Error::Config(_)));
            assert!(err.to_string().contains(REQUIRED[skip].0));
        }
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("WEAVIATE_PORT", "eighty"),
            ("WEAVIATE_SCHEME", "ftp"),
            ("REELSEARCH_LIMIT", "0"),
            ("REELSEARCH_ADDR", "nowhere"),
        ];
        for (key, value) in cases {
            let mut vars: Vec<_> = REQUIRED.iter().filter(|(k, _)| *k != key).copied().collect();
            vars.push((key, value));
            assert!(
                matches!(Config::from_lookup(lookup(&vars)), Err(Error::Config(_))),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_blank_is_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[0] = ("OPENAI_APIKEY", "   ");
        assert!(matches!(
            Config::from_lookup(lookup(&vars)),
            Err(Error::Config(_))
        ));
    }
}
