use axum::async_trait;
use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EdamamConfig;

use super::dto::{FetchedRecipe, SearchResponse};
use super::query::{build_query, SearchCriteria};

/// Closed failure set for a recipe search. The display text is shown to the
/// user verbatim; every variant is recoverable by resubmitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Invalid URL")]
    InvalidRequest,
    #[error("Invalid response from server")]
    TransportFailure,
    #[error("No data received")]
    EmptyResponse,
    #[error("No recipes found")]
    NoMatches,
    #[error("Error parsing recipe data")]
    DecodeFailure,
}

/// Seam for the hosted recipe API so the pipeline can run against a fake.
#[async_trait]
pub trait RecipeApi: Send + Sync {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<FetchedRecipe>, SearchError>;
}

pub struct EdamamClient {
    http: reqwest::Client,
    config: EdamamConfig,
}

impl EdamamClient {
    pub fn new(config: EdamamConfig) -> anyhow::Result<Self> {
        // Transport defaults only; the pipeline has no retry or timeout layer.
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl RecipeApi for EdamamClient {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<FetchedRecipe>, SearchError> {
        let params = build_query(criteria, &self.config.app_id, &self.config.app_key);
        let url = Url::parse_with_params(&self.config.base_url, &params).map_err(|e| {
            warn!(error = %e, base_url = %self.config.base_url, "search url did not build");
            SearchError::InvalidRequest
        })?;

        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("Edamam-Account-User", &self.config.account_user)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "recipe search transport failure");
                SearchError::TransportFailure
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "recipe search body read failed");
            SearchError::TransportFailure
        })?;

        let recipes = classify_response(status, &body)?;
        debug!(hits = recipes.len(), "recipe search succeeded");
        Ok(recipes)
    }
}

/// Classify one fetched response into recipes or a `SearchError`.
/// Factored out of the transport so the precedence rules are testable:
/// non-2xx beats everything, then empty body, then schema, then hit count.
pub fn classify_response(status: StatusCode, body: &[u8]) -> Result<Vec<FetchedRecipe>, SearchError> {
    if !status.is_success() {
        return Err(SearchError::TransportFailure);
    }
    if body.is_empty() {
        return Err(SearchError::EmptyResponse);
    }
    let parsed: SearchResponse = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "recipe response did not match schema");
        SearchError::DecodeFailure
    })?;
    if parsed.hits.is_empty() {
        return Err(SearchError::NoMatches);
    }
    Ok(parsed.hits.into_iter().map(|hit| hit.recipe).collect())
}
