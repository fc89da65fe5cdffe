//! Image lookup for new items
//!
//! Finds a representative picture for an item name using an image search
//! API. Lookups are best-effort: any failure yields an empty string and the
//! item is created without an image.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Default Custom Search endpoint
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Fetch timeout in seconds
const FETCH_TIMEOUT: u64 = 10;

/// Looks up an image URL for a free-text query
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Return at most one image URL, or an empty string when none is found
    async fn find_image(&self, query: &str) -> String;
}

/// Image search that never finds anything
///
/// Used when no API credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageSearch;

#[async_trait]
impl ImageSearch for NoImageSearch {
    async fn find_image(&self, _query: &str) -> String {
        String::new()
    }
}

/// Response body of the search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Option<Vec<ImageResult>>,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    link: String,
}

/// Client for the Google Custom Search JSON API in image mode
#[derive(Debug, Clone)]
pub struct GoogleImageSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
}

impl GoogleImageSearch {
    /// Create a client for the given API key and search-engine ID
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT))
            .user_agent("Mozilla/5.0 (compatible; Pantry/1.0)")
            .build()?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
        })
    }

    /// Use a different endpoint URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the search request; the query is percent-encoded here, once
    fn build_request(&self, query: &str) -> reqwest::Result<reqwest::Request> {
        self.client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("searchType", "image"),
                ("num", "1"),
            ])
            .build()
    }

    /// Inner lookup that can fail
    async fn find_image_inner(&self, query: &str) -> Result<Option<String>> {
        let request = self.build_request(query)?;
        let response = self.client.execute(request).await?;

        if !response.status().is_success() {
            debug!("Image search returned {}", response.status());
            return Ok(None);
        }

        let body = response.text().await?;
        Ok(parse_search_response(&body)?)
    }
}

#[async_trait]
impl ImageSearch for GoogleImageSearch {
    async fn find_image(&self, query: &str) -> String {
        let query = query.trim();
        if query.is_empty() {
            return String::new();
        }

        match self.find_image_inner(query).await {
            Ok(Some(link)) => link,
            Ok(None) => {
                debug!("No image found for {:?}", query);
                String::new()
            }
            Err(e) => {
                debug!("Image lookup for {:?} failed: {}", query, e);
                String::new()
            }
        }
    }
}

/// Extract the first result link from a search response body
///
/// Only `items[0]` counts; an empty link there means no image.
fn parse_search_response(body: &str) -> serde_json::Result<Option<String>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .items
        .unwrap_or_default()
        .into_iter()
        .next()
        .map(|result| result.link)
        .filter(|link| !link.is_empty()))
}
