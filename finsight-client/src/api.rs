//! HTTP client for the analysis backend.

use std::time::Duration;

use finsight_core::{AnalysisRecord, StatusUpdate, Transaction};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{DeleteError, FetchError};
use crate::normalize::{normalize_analysis, normalize_status, normalize_transactions};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is everything before `/v1`, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Wrap an already configured `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn statement_url(&self, statement_id: &str, suffix: &str) -> String {
        format!("{}/v1/statements/{}{}", self.base_url, statement_id, suffix)
    }

    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!(%url, "GET");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::http(status));
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET /v1/statements/{id}/analysis`, normalized.
    pub async fn fetch_analysis(&self, statement_id: &str) -> Result<AnalysisRecord, FetchError> {
        let payload = self.get_json(&self.statement_url(statement_id, "/analysis")).await?;
        let record = normalize_analysis(statement_id, &payload);
        info!(
            statement_id,
            categories = record.category_breakdown.len(),
            insights = record.insights.len(),
            "analysis loaded"
        );
        Ok(record)
    }

    /// `GET /v1/statements/{id}/status`
    pub async fn fetch_status(&self, statement_id: &str) -> Result<StatusUpdate, FetchError> {
        let payload = self.get_json(&self.statement_url(statement_id, "/status")).await?;
        Ok(normalize_status(&payload))
    }

    /// `GET /v1/statements/{id}/transactions`: the itemized listing.
    pub async fn fetch_transactions(&self, statement_id: &str) -> Result<Vec<Transaction>, FetchError> {
        let payload = self.get_json(&self.statement_url(statement_id, "/transactions")).await?;
        Ok(normalize_transactions(&payload))
    }

    /// `DELETE /v1/statements/{id}`; any non-2xx is an error.
    pub async fn delete_statement(&self, statement_id: &str) -> Result<(), DeleteError> {
        let url = self.statement_url(statement_id, "");
        debug!(%url, "DELETE");
        let resp = self.http.delete(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DeleteError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }
        info!(statement_id, "statement deleted");
        Ok(())
    }
}
