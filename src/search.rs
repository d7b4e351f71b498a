use crate::config::SearchConfig;
use crate::http::build_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid response: {0}")]
    Deserialize(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShoppingResult {
    pub position: u32,
    pub title: String,
}

/// Response envelope from the search provider. `shopping_results` is
/// absent for queries that returned nothing or errored provider-side.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub shopping_results: Option<Vec<ShoppingResult>>,
}

/// Shopping-listing search capability, fakeable in tests.
#[async_trait]
pub trait ShoppingSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchData, SearchError>;
}

pub struct SerpClient {
    http: Client,
    config: SearchConfig,
}

impl SerpClient {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            http: build_client(),
            config,
        }
    }
}

#[async_trait]
impl ShoppingSearch for SerpClient {
    async fn search(&self, query: &str) -> Result<SearchData, SearchError> {
        let url = format!("{}/search.json", self.config.base_url.trim_end_matches('/'));
        let count = self.config.result_count.to_string();
        let response = self
            .http
            .get(url)
            .query(&[
                ("q", query),
                ("tbm", "shop"),
                // rank by review volume
                ("tbs", "p_ord:rv"),
                ("num", count.as_str()),
                ("hl", self.config.language.as_str()),
                ("gl", self.config.region.as_str()),
                ("location", self.config.location.as_str()),
                ("api_key", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|err| SearchError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Request(format!("HTTP {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|err| SearchError::Deserialize(err.to_string()))
    }
}

/// Reduce a search response to the ranked competitor summary:
/// `"{position} - {title}"` per result, joined with `", "`. Returns `None`
/// when the response carried no `shopping_results` key.
pub fn summarize(data: &SearchData) -> Option<String> {
    let results = data.shopping_results.as_ref()?;
    Some(
        results
            .iter()
            .map(|result| format!("{} - {}", result.position, result.title))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_joins_position_and_title() {
        let data: SearchData = serde_json::from_str(
            r#"{"shopping_results":[{"position":1,"title":"A"},{"position":2,"title":"B"}]}"#,
        )
        .unwrap();
        assert_eq!(summarize(&data).as_deref(), Some("1 - A, 2 - B"));
    }

    #[test]
    fn summarize_without_results_key_is_none() {
        let data: SearchData = serde_json::from_str(r#"{"search_metadata":{}}"#).unwrap();
        assert_eq!(summarize(&data), None);
    }

    #[test]
    fn summarize_empty_result_list_is_empty_string() {
        let data: SearchData = serde_json::from_str(r#"{"shopping_results":[]}"#).unwrap();
        assert_eq!(summarize(&data).as_deref(), Some(""));
    }
}
